// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Log levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// Severity of an event, totally ordered from `Debug` to `Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	Debug,
	Info,
	Warn,
	Error,
	Critical,
}

impl LogLevel {
	/// All levels, lowest priority first.
	pub const ALL: [LogLevel; 5] = [
		LogLevel::Debug,
		LogLevel::Info,
		LogLevel::Warn,
		LogLevel::Error,
		LogLevel::Critical,
	];

	/// Integer priority used for level comparisons.
	pub fn priority(&self) -> i32 {
		match self {
			LogLevel::Debug => 10,
			LogLevel::Info => 20,
			LogLevel::Warn => 30,
			LogLevel::Error => 40,
			LogLevel::Critical => 50,
		}
	}

	/// Look up the level with the given priority.
	pub fn from_priority(priority: i32) -> Result<Self, LogError> {
		Self::ALL
			.into_iter()
			.find(|level| level.priority() == priority)
			.ok_or(LogError::InvalidPriority(priority))
	}

	/// Get the string representation.
	pub fn as_str(&self) -> &'static str {
		match self {
			LogLevel::Debug => "debug",
			LogLevel::Info => "info",
			LogLevel::Warn => "warn",
			LogLevel::Error => "error",
			LogLevel::Critical => "critical",
		}
	}
}

impl fmt::Display for LogLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl FromStr for LogLevel {
	type Err = LogError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"debug" => Ok(Self::Debug),
			"info" => Ok(Self::Info),
			"warn" => Ok(Self::Warn),
			"error" => Ok(Self::Error),
			"critical" => Ok(Self::Critical),
			_ => Err(LogError::InvalidLogLevel(s.to_string())),
		}
	}
}
