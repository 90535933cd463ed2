// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Error types for the observer pipeline.

use std::path::PathBuf;

use loom_log_core::LogError;
use thiserror::Error;

/// Failure of a single observer while handling an event.
///
/// These are isolated by the [`crate::Publisher`] and never reach the code
/// that emitted the event.
#[derive(Debug, Error)]
pub enum ObserverError {
	#[error("{0}")]
	Failed(String),

	#[error("panicked: {0}")]
	Panicked(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl ObserverError {
	pub fn failed(message: impl Into<String>) -> Self {
		Self::Failed(message.into())
	}
}

/// Result type for observer operations.
pub type Result<T> = std::result::Result<T, ObserverError>;

/// Errors raised while loading or validating logging configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },

	#[error(transparent)]
	Log(#[from] LogError),
}

impl ConfigError {
	pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			key: key.into(),
			message: message.into(),
		}
	}
}

/// Errors from the process-wide log context.
#[derive(Debug, Error)]
pub enum ContextError {
	#[error("a process-wide log context is already installed")]
	AlreadyInstalled,

	#[error(transparent)]
	Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_observer_error_messages() {
		assert_eq!(ObserverError::failed("disk full").to_string(), "disk full");
		assert_eq!(
			ObserverError::Panicked("boom".to_string()).to_string(),
			"panicked: boom"
		);
		let io = ObserverError::from(std::io::Error::new(std::io::ErrorKind::Other, "closed"));
		assert_eq!(io.to_string(), "I/O error: closed");
	}

	#[test]
	fn test_config_error_wraps_level_errors() {
		let err = ConfigError::from(LogError::InvalidLogLevel("loud".to_string()));
		assert_eq!(err.to_string(), "invalid log level: loud");
		assert_eq!(
			ConfigError::invalid_value("LOOM_LOG_OUTPUT", "expected text or json").to_string(),
			"invalid value for LOOM_LOG_OUTPUT: expected text or json"
		);
	}
}
