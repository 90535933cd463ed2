// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The event record passed through the observer pipeline.

use std::fmt;

use crate::error::ValueError;
use crate::level::LogLevel;
use crate::value::{Value, ValueMap};

/// Reserved event keys.
pub mod keys {
	/// Message template.
	pub const FORMAT: &str = "log_format";
	/// Seconds since the Unix epoch.
	pub const TIME: &str = "log_time";
	pub const LEVEL: &str = "log_level";
	/// Name kept when a persisted level could not be recognised.
	pub const LEVEL_NAME: &str = "log_level_name";
	/// Dotted namespace of the emitting logger.
	pub const NAMESPACE: &str = "log_namespace";
	/// Display-name override for the namespace/level tag.
	pub const SYSTEM: &str = "log_system";
	/// Pre-resolved template fields.
	pub const FLATTENED: &str = "log_flattened";
	pub const SOURCE: &str = "log_source";
	pub const FAILURE: &str = "log_failure";
}

/// Identity of an observer, derived from its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

impl ObserverId {
	pub fn of<T: ?Sized>(observer: &T) -> Self {
		Self(observer as *const T as *const () as usize)
	}
}

/// One step of a traced fan-out: `from` handed the event to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceHop {
	pub from: ObserverId,
	pub to: ObserverId,
}

/// An ordered mapping of named fields.
///
/// Keys keep their insertion order; inserting an existing key replaces the
/// value in place.
#[derive(Clone, Default, PartialEq)]
pub struct Event {
	fields: Vec<(String, Value)>,
	trace: Option<Vec<TraceHop>>,
}

impl Event {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style insert.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.insert(key, value);
		self
	}

	/// Insert a field, returning the previous value if the key existed.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
		let key = key.into();
		let value = value.into();
		match self.fields.iter_mut().find(|(k, _)| *k == key) {
			Some((_, slot)) => Some(std::mem::replace(slot, value)),
			None => {
				self.fields.push((key, value));
				None
			}
		}
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
		self.fields.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	pub fn remove(&mut self, key: &str) -> Option<Value> {
		let index = self.fields.iter().position(|(k, _)| k == key)?;
		Some(self.fields.remove(index).1)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.fields.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.fields.iter().map(|(k, _)| k.as_str())
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	/// The message template, if any.
	pub fn format(&self) -> Option<&Value> {
		self.get(keys::FORMAT).filter(|v| !v.is_null())
	}

	pub fn level(&self) -> Option<LogLevel> {
		self.get(keys::LEVEL).and_then(Value::as_level)
	}

	pub fn namespace(&self) -> Option<&str> {
		self.get(keys::NAMESPACE).and_then(Value::as_str)
	}

	pub fn time(&self) -> Option<f64> {
		self.get(keys::TIME).and_then(Value::as_f64)
	}

	pub fn system(&self) -> Option<&Value> {
		self.get(keys::SYSTEM).filter(|v| !v.is_null())
	}

	pub fn is_flattened(&self) -> bool {
		self.contains_key(keys::FLATTENED)
	}

	pub fn flattened(&self) -> Option<&ValueMap> {
		self.get(keys::FLATTENED).and_then(Value::as_map)
	}

	/// Request fan-out tracing for this event.
	pub fn start_trace(&mut self) {
		self.trace.get_or_insert_with(Vec::new);
	}

	/// Builder-style [`Event::start_trace`].
	pub fn traced(mut self) -> Self {
		self.start_trace();
		self
	}

	pub fn is_traced(&self) -> bool {
		self.trace.is_some()
	}

	/// The recorded fan-out path, if tracing was requested.
	pub fn trace(&self) -> Option<&[TraceHop]> {
		self.trace.as_deref()
	}

	/// Record a hop; a no-op unless tracing was requested.
	pub fn record_hop(&mut self, from: ObserverId, to: ObserverId) {
		if let Some(trace) = self.trace.as_mut() {
			trace.push(TraceHop { from, to });
		}
	}

	/// Debug representation of the whole event; fails if any value does.
	pub fn try_repr(&self) -> Result<String, ValueError> {
		let parts = self
			.fields
			.iter()
			.map(|(k, v)| Ok(format!("{k:?}: {}", v.to_repr()?)))
			.collect::<Result<Vec<_>, ValueError>>()?;
		Ok(format!("{{{}}}", parts.join(", ")))
	}
}

impl fmt::Debug for Event {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut map = f.debug_map();
		for (k, v) in &self.fields {
			map.entry(k, v);
		}
		map.finish()
	}
}

impl<K, V> FromIterator<(K, V)> for Event
where
	K: Into<String>,
	V: Into<Value>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut event = Event::new();
		for (k, v) in iter {
			event.insert(k, v);
		}
		event
	}
}

impl<K, V> Extend<(K, V)> for Event
where
	K: Into<String>,
	V: Into<Value>,
{
	fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
		for (k, v) in iter {
			self.insert(k, v);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_insert_preserves_order_and_replaces_in_place() {
		let mut event = Event::new().with("b", 1).with("a", 2);
		assert_eq!(event.insert("b", 3), Some(Value::Int(1)));
		let keys: Vec<_> = event.keys().collect();
		assert_eq!(keys, vec!["b", "a"]);
		assert_eq!(event.get("b"), Some(&Value::Int(3)));
	}

	#[test]
	fn test_reserved_accessors() {
		let event = Event::new()
			.with(keys::LEVEL, LogLevel::Warn)
			.with(keys::NAMESPACE, "a.b")
			.with(keys::TIME, 12)
			.with(keys::FORMAT, Value::Null);

		assert_eq!(event.level(), Some(LogLevel::Warn));
		assert_eq!(event.namespace(), Some("a.b"));
		assert_eq!(event.time(), Some(12.0));
		assert!(event.format().is_none());
		assert!(!event.is_flattened());
	}

	#[test]
	fn test_trace_is_opt_in() {
		let mut event = Event::new();
		let a = 1u8;
		let b = 2u8;
		event.record_hop(ObserverId::of(&a), ObserverId::of(&b));
		assert!(event.trace().is_none());

		event.start_trace();
		event.record_hop(ObserverId::of(&a), ObserverId::of(&b));
		assert_eq!(
			event.trace(),
			Some(
				&[TraceHop {
					from: ObserverId::of(&a),
					to: ObserverId::of(&b),
				}][..]
			)
		);
	}

	#[test]
	fn test_remove_and_collect() {
		let mut event: Event = [("x", 1), ("y", 2)].into_iter().collect();
		assert_eq!(event.remove("x"), Some(Value::Int(1)));
		assert_eq!(event.remove("x"), None);
		assert_eq!(event.len(), 1);
	}

	#[test]
	fn test_try_repr() {
		let event = Event::new().with("foo", 1).with("bar", "baz");
		assert_eq!(event.try_repr().unwrap(), "{\"foo\": 1, \"bar\": \"baz\"}");
	}
}
