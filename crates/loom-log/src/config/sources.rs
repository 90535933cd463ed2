// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, trace};

use super::LoggingConfigLayer;
use crate::error::ConfigError;

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<LoggingConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<LoggingConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(LoggingConfigLayer::default())
	}
}

/// Shape of a config file; only the `[logging]` table is read.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
	#[serde(default)]
	logging: Option<LoggingConfigLayer>,
}

/// TOML file configuration source. A missing file is skipped.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<LoggingConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(LoggingConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let file: ConfigFile = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!("parsed logging layer from TOML");
		Ok(file.logging.unwrap_or_default())
	}
}

/// Environment variable source.
///
/// Reads `LOOM_LOG_LEVEL`, `LOOM_LOG_NAMESPACES` (`a.b=debug,c=warn`),
/// `LOOM_LOG_BUFFER_CAPACITY`, `LOOM_LOG_TIME_FORMAT` and `LOOM_LOG_OUTPUT`.
/// Empty variables count as unset.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<LoggingConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_logging_from(|name| std::env::var(name).ok())
	}
}

fn load_logging_from(
	lookup: impl Fn(&str) -> Option<String>,
) -> Result<LoggingConfigLayer, ConfigError> {
	let var = |name: &str| lookup(name).filter(|s| !s.is_empty());

	let namespaces = var("LOOM_LOG_NAMESPACES")
		.map(|spec| parse_namespaces("LOOM_LOG_NAMESPACES", &spec))
		.transpose()?;

	let buffer_capacity = match var("LOOM_LOG_BUFFER_CAPACITY") {
		Some(v) => Some(v.trim().parse().map_err(|_| {
			ConfigError::invalid_value("LOOM_LOG_BUFFER_CAPACITY", format!("invalid capacity '{v}'"))
		})?),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: var("LOOM_LOG_LEVEL"),
		namespaces,
		buffer_capacity,
		time_format: var("LOOM_LOG_TIME_FORMAT"),
		output: var("LOOM_LOG_OUTPUT"),
	})
}

/// Parse `namespace=level` pairs separated by commas.
fn parse_namespaces(key: &str, spec: &str) -> Result<BTreeMap<String, String>, ConfigError> {
	spec
		.split(',')
		.map(str::trim)
		.filter(|entry| !entry.is_empty())
		.map(|entry| match entry.split_once('=') {
			Some((namespace, level)) if !namespace.trim().is_empty() => {
				Ok((namespace.trim().to_string(), level.trim().to_string()))
			}
			_ => Err(ConfigError::invalid_value(
				key,
				format!("expected namespace=level, got '{entry}'"),
			)),
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use std::io::Write;

	fn from_vars(vars: &[(&str, &str)]) -> Result<LoggingConfigLayer, ConfigError> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		load_logging_from(|name| vars.get(name).cloned())
	}

	#[test]
	fn test_precedence_order() {
		assert!(Precedence::Defaults < Precedence::ConfigFile);
		assert!(Precedence::ConfigFile < Precedence::Environment);
	}

	#[test]
	fn test_env_layer() {
		let layer = from_vars(&[
			("LOOM_LOG_LEVEL", "debug"),
			("LOOM_LOG_NAMESPACES", "app.db=warn, hyper = error,"),
			("LOOM_LOG_BUFFER_CAPACITY", "128"),
			("LOOM_LOG_OUTPUT", ""),
		])
		.unwrap();

		assert_eq!(layer.level.as_deref(), Some("debug"));
		assert_eq!(layer.buffer_capacity, Some(128));
		assert_eq!(layer.output, None);
		let namespaces = layer.namespaces.unwrap();
		assert_eq!(namespaces.len(), 2);
		assert_eq!(namespaces.get("hyper").map(String::as_str), Some("error"));
	}

	#[test]
	fn test_env_rejects_malformed_values() {
		assert!(from_vars(&[("LOOM_LOG_BUFFER_CAPACITY", "lots")]).is_err());
		assert!(from_vars(&[("LOOM_LOG_NAMESPACES", "app.db")]).is_err());
		assert!(from_vars(&[("LOOM_LOG_NAMESPACES", "=debug")]).is_err());
	}

	#[test]
	fn test_toml_source_reads_logging_table() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			"[server]\nport = 8080\n\n[logging]\nlevel = \"warn\"\noutput = \"json\"\n\n[logging.namespaces]\n\"app.db\" = \"debug\""
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(layer.level.as_deref(), Some("warn"));
		assert_eq!(layer.output.as_deref(), Some("json"));
		assert_eq!(
			layer.namespaces.unwrap().get("app.db").map(String::as_str),
			Some("debug")
		);
	}

	#[test]
	fn test_toml_source_missing_file_is_skipped() {
		let dir = tempfile::tempdir().unwrap();
		let layer = TomlSource::new(dir.path().join("absent.toml")).load().unwrap();
		assert_eq!(layer, LoggingConfigLayer::default());
	}

	#[test]
	fn test_toml_source_parse_error() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[logging\nlevel = ").unwrap();
		assert!(matches!(
			TomlSource::new(file.path()).load(),
			Err(ConfigError::TomlParse { .. })
		));
	}
}
