// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the event model and formatting engine.

use thiserror::Error;

/// Configuration errors raised synchronously to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
	#[error("invalid log level: {0}")]
	InvalidLogLevel(String),

	#[error("invalid log level priority: {0}")]
	InvalidPriority(i32),

	#[error("invalid time format {pattern:?}: {reason}")]
	InvalidTimeFormat { pattern: String, reason: String },
}

/// Result type for event model operations.
pub type Result<T> = std::result::Result<T, LogError>;

/// Failure reported by a live value (an object or a thunk) while it is
/// being rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValueError(String);

impl ValueError {
	pub fn new(message: impl Into<String>) -> Self {
		Self(message.into())
	}

	pub fn message(&self) -> &str {
		&self.0
	}
}

/// Errors produced while rendering a template.
///
/// These never escape [`crate::format_event`]; they are folded into the
/// degraded diagnostic text instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
	#[error("log format must be text or bytes, not {0}")]
	NonTextFormat(&'static str),

	#[error("log format is not valid UTF-8: {0}")]
	InvalidUtf8(String),

	#[error("invalid template: {0}")]
	Template(String),

	#[error("positional field {0:?} is not supported; name every field")]
	Positional(String),

	#[error("missing field: {0}")]
	MissingField(String),

	#[error("{kind} value has no attribute {name:?}")]
	MissingAttribute { kind: &'static str, name: String },

	#[error("{kind} value cannot be indexed with [{key}]")]
	MissingIndex { kind: &'static str, key: String },

	#[error("field {0:?} is not callable")]
	NotCallable(String),

	#[error("calling {field:?} failed: {source}")]
	CallFailed { field: String, source: ValueError },

	#[error("unknown conversion specifier {0:?}")]
	UnknownConversion(char),

	#[error("invalid format spec {spec:?}: {reason}")]
	InvalidSpec { spec: String, reason: String },

	#[error("unknown format code {code:?} for {kind} value")]
	UnknownFormatCode { code: char, kind: &'static str },

	#[error("unrepresentable value: {0}")]
	Unrepresentable(#[from] ValueError),

	#[error("no flattened value for {0:?}")]
	MissingFlattened(String),

	#[error("formatting panicked: {0}")]
	Panicked(String),
}

impl FormatError {
	pub(crate) fn template(reason: impl Into<String>) -> Self {
		Self::Template(reason.into())
	}

	pub(crate) fn invalid_spec(spec: &str, reason: impl Into<String>) -> Self {
		Self::InvalidSpec {
			spec: spec.to_string(),
			reason: reason.into(),
		}
	}
}

/// Extract a readable message from a caught panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"non-string panic payload".to_string()
	}
}
