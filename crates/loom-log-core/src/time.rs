// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Timestamp rendering for text sinks.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};

use crate::error::{LogError, Result};

/// RFC 3339-style local timestamp, e.g. `2013-10-22T14:19:11-0700`.
pub const TIME_FORMAT_RFC3339: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Text rendered when there is no timestamp or no time format.
pub const NO_TIME: &str = "-";

/// A validated strftime pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeFormat {
	pattern: String,
}

impl TimeFormat {
	pub fn parse(pattern: impl Into<String>) -> Result<Self> {
		let pattern = pattern.into();
		if let Some(Item::Error) = StrftimeItems::new(&pattern).find(|item| matches!(item, Item::Error)) {
			return Err(LogError::InvalidTimeFormat {
				pattern,
				reason: "unrecognised strftime specifier".to_string(),
			});
		}
		Ok(Self { pattern })
	}

	pub fn rfc3339() -> Self {
		Self {
			pattern: TIME_FORMAT_RFC3339.to_string(),
		}
	}

	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// Render seconds since the Unix epoch in local time.
	///
	/// Returns `None` for timestamps chrono cannot represent.
	pub fn format(&self, when: f64) -> Option<String> {
		if !when.is_finite() {
			return None;
		}
		let secs = when.floor();
		let nanos = ((when - secs) * 1e9) as u32;
		let utc = DateTime::<Utc>::from_timestamp(secs as i64, nanos.min(999_999_999))?;
		let local = utc.with_timezone(&Local);

		let mut out = String::new();
		write!(out, "{}", local.format(&self.pattern)).ok()?;
		Some(out)
	}
}

impl Default for TimeFormat {
	fn default() -> Self {
		Self::rfc3339()
	}
}

/// Current time as seconds since the Unix epoch.
pub fn now_timestamp() -> f64 {
	let now = Utc::now();
	now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) / 1e9
}

/// Render an optional timestamp with an optional format, defaulting to `-`.
pub fn format_time(when: Option<f64>, format: Option<&TimeFormat>) -> String {
	match (when, format) {
		(Some(when), Some(format)) => format.format(when).unwrap_or_else(|| NO_TIME.to_string()),
		_ => NO_TIME.to_string(),
	}
}
