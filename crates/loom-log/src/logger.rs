// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The call-site façade for emitting events.

use std::sync::Arc;

use loom_log_core::{keys, now_timestamp, Event, LogLevel, Value};
use tracing::debug;

use crate::observer::Observer;

/// Extra fields attached to an emitted event.
#[derive(Debug, Clone, Default)]
pub struct Fields(Vec<(String, Value)>);

impl Fields {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.0.push((key.into(), value.into()));
		self
	}

	/// Attach a value computed only if a template calls it (`{key()}`).
	pub fn with_thunk<F, V>(self, key: impl Into<String>, f: F) -> Self
	where
		F: Fn() -> V + Send + Sync + 'static,
		V: Into<Value>,
	{
		self.with(key, Value::thunk(f))
	}
}

impl From<()> for Fields {
	fn from(_: ()) -> Self {
		Self::new()
	}
}

impl<K, V, const N: usize> From<[(K, V); N]> for Fields
where
	K: Into<String>,
	V: Into<Value>,
{
	fn from(pairs: [(K, V); N]) -> Self {
		Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

impl IntoIterator for Fields {
	type Item = (String, Value);
	type IntoIter = std::vec::IntoIter<(String, Value)>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

/// Emits events in a namespace to an observer.
///
/// Emission never fails: an error from the observer is logged through
/// `tracing` and dropped.
#[derive(Clone)]
pub struct Logger {
	namespace: String,
	observer: Arc<dyn Observer>,
	source: Option<Value>,
}

impl Logger {
	pub fn new(namespace: impl Into<String>, observer: Arc<dyn Observer>) -> Self {
		Self {
			namespace: namespace.into(),
			observer,
			source: None,
		}
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	pub fn observer(&self) -> &Arc<dyn Observer> {
		&self.observer
	}

	/// Attach a `log_source` value to every event from this logger.
	pub fn with_source(mut self, source: impl Into<Value>) -> Self {
		self.source = Some(source.into());
		self
	}

	/// Logger for a dotted sub-namespace sharing this logger's observer.
	pub fn child(&self, suffix: &str) -> Self {
		let namespace = if self.namespace.is_empty() {
			suffix.to_string()
		} else {
			format!("{}.{suffix}", self.namespace)
		};
		Self {
			namespace,
			observer: self.observer.clone(),
			source: self.source.clone(),
		}
	}

	/// Emit an event at `level` with the given message template.
	pub fn emit(&self, level: LogLevel, format: &str, fields: impl Into<Fields>) {
		self.emit_event(level, Some(format), fields.into());
	}

	/// Emit an event; without a format it carries no human-readable text.
	pub(crate) fn emit_event(&self, level: LogLevel, format: Option<&str>, fields: Fields) {
		let mut event: Event = fields.into_iter().collect();
		event.insert(keys::LEVEL, level);
		event.insert(keys::NAMESPACE, self.namespace.as_str());
		if let Some(source) = &self.source {
			event.insert(keys::SOURCE, source.clone());
		}
		match format {
			Some(format) => {
				event.insert(keys::FORMAT, format);
			}
			None => {
				event.remove(keys::FORMAT);
			}
		}
		event.insert(keys::TIME, now_timestamp());
		self.deliver(&mut event);
	}

	/// Emit an event carrying a failure under `log_failure`.
	pub fn failure(
		&self,
		format: &str,
		failure: impl Into<Value>,
		level: LogLevel,
		fields: impl Into<Fields>,
	) {
		self.emit(level, format, fields.into().with(keys::FAILURE, failure));
	}

	pub fn debug(&self, format: &str, fields: impl Into<Fields>) {
		self.emit(LogLevel::Debug, format, fields);
	}

	pub fn info(&self, format: &str, fields: impl Into<Fields>) {
		self.emit(LogLevel::Info, format, fields);
	}

	pub fn warn(&self, format: &str, fields: impl Into<Fields>) {
		self.emit(LogLevel::Warn, format, fields);
	}

	pub fn error(&self, format: &str, fields: impl Into<Fields>) {
		self.emit(LogLevel::Error, format, fields);
	}

	pub fn critical(&self, format: &str, fields: impl Into<Fields>) {
		self.emit(LogLevel::Critical, format, fields);
	}

	fn deliver(&self, event: &mut Event) {
		if let Err(err) = self.observer.observe(event) {
			debug!(namespace = %self.namespace, error = %err, "dropping event after observer error");
		}
	}
}

impl std::fmt::Debug for Logger {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Logger")
			.field("namespace", &self.namespace)
			.field("observer", &self.observer.name())
			.finish()
	}
}
