// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Layered logging configuration.
//!
//! Sources are merged in precedence order (defaults, then a TOML file, then
//! `LOOM_LOG_*` environment variables) into a [`LoggingConfigLayer`], which
//! is validated into a [`LoggingConfig`].

mod sources;

pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use loom_log_core::{LogLevel, TimeFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::DEFAULT_CAPACITY;
use crate::error::ConfigError;
use crate::filter::LevelGate;

/// Time format values that turn timestamps off.
const NO_TIME_FORMATS: [&str; 2] = ["", "none"];

/// Encoding of events written by the primary sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
	#[default]
	Text,
	Json,
}

impl FromStr for OutputFormat {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"text" => Ok(Self::Text),
			"json" => Ok(Self::Json),
			_ => Err(ConfigError::invalid_value(
				"logging.output",
				format!("expected 'text' or 'json', got '{s}'"),
			)),
		}
	}
}

/// Unvalidated logging settings from one source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfigLayer {
	pub level: Option<String>,
	pub namespaces: Option<BTreeMap<String, String>>,
	/// `0` means unbounded.
	pub buffer_capacity: Option<usize>,
	pub time_format: Option<String>,
	pub output: Option<String>,
}

impl LoggingConfigLayer {
	/// Overlay `other` on this layer.
	///
	/// Namespace maps are combined; an entry in `other` wins.
	pub fn merge(&mut self, other: Self) {
		if other.level.is_some() {
			self.level = other.level;
		}
		if let Some(namespaces) = other.namespaces {
			self.namespaces.get_or_insert_with(BTreeMap::new).extend(namespaces);
		}
		if other.buffer_capacity.is_some() {
			self.buffer_capacity = other.buffer_capacity;
		}
		if other.time_format.is_some() {
			self.time_format = other.time_format;
		}
		if other.output.is_some() {
			self.output = other.output;
		}
	}

	pub fn finalize(self) -> Result<LoggingConfig, ConfigError> {
		let level = match self.level {
			Some(name) => parse_level("logging.level", &name)?,
			None => LogLevel::Info,
		};

		let namespaces = self
			.namespaces
			.unwrap_or_default()
			.into_iter()
			.map(|(namespace, name)| {
				let level = parse_level(&format!("logging.namespaces.{namespace}"), &name)?;
				Ok((namespace, level))
			})
			.collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

		let buffer_capacity = match self.buffer_capacity {
			Some(0) => None,
			Some(capacity) => Some(capacity),
			None => Some(DEFAULT_CAPACITY),
		};

		let time_format = match self.time_format {
			Some(pattern) if NO_TIME_FORMATS.contains(&pattern.trim().to_ascii_lowercase().as_str()) => None,
			Some(pattern) => Some(TimeFormat::parse(pattern)?),
			None => Some(TimeFormat::rfc3339()),
		};

		let output = match self.output {
			Some(output) => output.parse()?,
			None => OutputFormat::default(),
		};

		Ok(LoggingConfig {
			level,
			namespaces,
			buffer_capacity,
			time_format,
			output,
		})
	}
}

fn parse_level(key: &str, name: &str) -> Result<LogLevel, ConfigError> {
	name
		.trim()
		.to_ascii_lowercase()
		.parse()
		.map_err(|_| ConfigError::invalid_value(key, format!("unknown log level '{name}'")))
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
	/// Level for namespaces without their own entry.
	pub level: LogLevel,
	pub namespaces: BTreeMap<String, LogLevel>,
	/// Startup buffer size; `None` keeps every event.
	pub buffer_capacity: Option<usize>,
	/// Timestamp format of text output; `None` renders `-`.
	pub time_format: Option<TimeFormat>,
	pub output: OutputFormat,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: LogLevel::Info,
			namespaces: BTreeMap::new(),
			buffer_capacity: Some(DEFAULT_CAPACITY),
			time_format: Some(TimeFormat::rfc3339()),
			output: OutputFormat::Text,
		}
	}
}

impl LoggingConfig {
	/// Install the default and per-namespace levels, replacing whatever the
	/// gate held before.
	pub fn apply_levels(&self, gate: &LevelGate) {
		gate.clear();
		gate.set(None, self.level);
		for (namespace, level) in &self.namespaces {
			gate.set(Some(namespace), *level);
		}
	}
}

/// Load configuration from defaults and the environment.
pub fn load_config() -> Result<LoggingConfig, ConfigError> {
	load_from_sources(vec![Box::new(DefaultsSource), Box::new(EnvSource)])
}

/// Load configuration from defaults, a TOML file and the environment.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<LoggingConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge the given sources by precedence and validate the result.
pub fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<LoggingConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = LoggingConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading logging configuration source");
		merged.merge(source.load()?);
	}

	merged.finalize()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = LoggingConfigLayer::default().finalize().unwrap();
		assert_eq!(config, LoggingConfig::default());
		assert_eq!(config.buffer_capacity, Some(65536));
		assert_eq!(config.time_format.as_ref().map(TimeFormat::pattern), Some("%Y-%m-%dT%H:%M:%S%z"));
	}

	#[test]
	fn test_layer_finalize_with_values() {
		let layer = LoggingConfigLayer {
			level: Some("WARN".to_string()),
			namespaces: Some(BTreeMap::from([("app.db".to_string(), "debug".to_string())])),
			buffer_capacity: Some(0),
			time_format: Some("none".to_string()),
			output: Some("json".to_string()),
		};
		let config = layer.finalize().unwrap();
		assert_eq!(config.level, LogLevel::Warn);
		assert_eq!(config.namespaces.get("app.db"), Some(&LogLevel::Debug));
		assert_eq!(config.buffer_capacity, None);
		assert_eq!(config.time_format, None);
		assert_eq!(config.output, OutputFormat::Json);
	}

	#[test]
	fn test_merge_overwrites_and_combines_namespaces() {
		let mut base = LoggingConfigLayer {
			level: Some("info".to_string()),
			namespaces: Some(BTreeMap::from([
				("a".to_string(), "debug".to_string()),
				("b".to_string(), "warn".to_string()),
			])),
			output: Some("text".to_string()),
			..Default::default()
		};
		base.merge(LoggingConfigLayer {
			level: Some("error".to_string()),
			namespaces: Some(BTreeMap::from([("b".to_string(), "critical".to_string())])),
			..Default::default()
		});

		assert_eq!(base.level.as_deref(), Some("error"));
		assert_eq!(base.output.as_deref(), Some("text"));
		let namespaces = base.namespaces.unwrap();
		assert_eq!(namespaces.get("a").map(String::as_str), Some("debug"));
		assert_eq!(namespaces.get("b").map(String::as_str), Some("critical"));
	}

	#[test]
	fn test_invalid_values_are_rejected() {
		let bad_level = LoggingConfigLayer {
			namespaces: Some(BTreeMap::from([("app".to_string(), "loud".to_string())])),
			..Default::default()
		};
		assert!(matches!(
			bad_level.finalize(),
			Err(ConfigError::InvalidValue { key, .. }) if key == "logging.namespaces.app"
		));

		let bad_time = LoggingConfigLayer {
			time_format: Some("%Q".to_string()),
			..Default::default()
		};
		assert!(matches!(bad_time.finalize(), Err(ConfigError::Log(_))));

		let bad_output = LoggingConfigLayer {
			output: Some("xml".to_string()),
			..Default::default()
		};
		assert!(bad_output.finalize().is_err());
	}

	#[test]
	fn test_apply_levels_replaces_gate_contents() {
		let gate = LevelGate::new();
		gate.set(Some("stale"), LogLevel::Critical);

		let config = LoggingConfig {
			level: LogLevel::Warn,
			namespaces: BTreeMap::from([("app.db".to_string(), LogLevel::Debug)]),
			..Default::default()
		};
		config.apply_levels(&gate);

		assert_eq!(gate.resolve(Some("stale")), LogLevel::Warn);
		assert_eq!(gate.resolve(Some("app.db.pool")), LogLevel::Debug);
		assert_eq!(gate.resolve(None), LogLevel::Warn);
	}
}
