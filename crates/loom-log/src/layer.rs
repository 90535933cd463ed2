// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Tracing layer that routes `tracing` events into an observer.

use std::fmt;
use std::sync::Arc;

use loom_log_core::{keys, now_timestamp, Event, LogLevel, Value};
use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::observer::Observer;

/// Field holding the tracing message.
pub const MESSAGE_FIELD: &str = "message";

/// Target prefix of this library's own diagnostics, which are never routed
/// back into the pipeline.
const OWN_TARGET: &str = "loom_log";

/// A tracing [`Layer`] that turns each tracing event into an [`Event`].
///
/// The target becomes the dotted namespace (`app::db` is `app.db`) and the
/// message is rendered through `{message}`. Other fields keep their types.
/// Compose it with other layers (like `fmt::layer()`) to keep console output.
#[derive(Clone)]
pub struct EventLayer {
	observer: Arc<dyn Observer>,
}

impl EventLayer {
	pub fn new(observer: Arc<dyn Observer>) -> Self {
		Self { observer }
	}

	pub fn observer(&self) -> &Arc<dyn Observer> {
		&self.observer
	}
}

/// Map a tracing level; `TRACE` has no counterpart and becomes `debug`.
pub fn level_from_tracing(level: &tracing::Level) -> LogLevel {
	match *level {
		tracing::Level::TRACE | tracing::Level::DEBUG => LogLevel::Debug,
		tracing::Level::INFO => LogLevel::Info,
		tracing::Level::WARN => LogLevel::Warn,
		tracing::Level::ERROR => LogLevel::Error,
	}
}

impl<S> Layer<S> for EventLayer
where
	S: Subscriber + for<'a> LookupSpan<'a>,
{
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
		let metadata = event.metadata();
		let target = metadata.target();
		if target.starts_with(OWN_TARGET) {
			return;
		}

		let mut visitor = FieldVisitor::default();
		event.record(&mut visitor);

		let mut log_event: Event = visitor.fields.into_iter().collect();
		log_event.insert(MESSAGE_FIELD, visitor.message.unwrap_or_default());
		log_event.insert(keys::LEVEL, level_from_tracing(metadata.level()));
		log_event.insert(keys::NAMESPACE, target.replace("::", "."));
		log_event.insert(keys::FORMAT, "{message}");
		log_event.insert(keys::TIME, now_timestamp());

		// Reporting here would recurse into this layer.
		let _ = self.observer.observe(&mut log_event);
	}
}

/// Visitor that extracts typed fields from a tracing event.
#[derive(Default)]
struct FieldVisitor {
	message: Option<String>,
	fields: Vec<(String, Value)>,
}

impl FieldVisitor {
	fn record(&mut self, field: &Field, value: Value) {
		self.fields.push((field.name().to_string(), value));
	}
}

impl Visit for FieldVisitor {
	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		let text = format!("{value:?}");
		if field.name() == MESSAGE_FIELD {
			self.message = Some(text);
		} else {
			self.record(field, Value::Str(text));
		}
	}

	fn record_str(&mut self, field: &Field, value: &str) {
		if field.name() == MESSAGE_FIELD {
			self.message = Some(value.to_string());
		} else {
			self.record(field, Value::from(value));
		}
	}

	fn record_i64(&mut self, field: &Field, value: i64) {
		self.record(field, Value::Int(value));
	}

	fn record_u64(&mut self, field: &Field, value: u64) {
		self.record(field, Value::from(value));
	}

	fn record_bool(&mut self, field: &Field, value: bool) {
		self.record(field, Value::Bool(value));
	}

	fn record_f64(&mut self, field: &Field, value: f64) {
		self.record(field, Value::Float(value));
	}

	fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
		self.record(field, Value::Str(value.to_string()));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::buffer::RingBuffer;
	use loom_log_core::format_event;
	use tracing_subscriber::layer::SubscriberExt;

	fn capture(f: impl FnOnce()) -> Vec<Event> {
		let buffer = RingBuffer::unbounded();
		let layer = EventLayer::new(Arc::new(buffer.clone()));
		let subscriber = tracing_subscriber::registry().with(layer);
		tracing::subscriber::with_default(subscriber, f);
		buffer.events()
	}

	#[test]
	fn test_layer_captures_events() {
		let events = capture(|| {
			tracing::info!(target: "app::http", status = 200u64, path = "/", "served {}", "ok");
		});

		assert_eq!(events.len(), 1);
		let event = &events[0];
		assert_eq!(event.level(), Some(LogLevel::Info));
		assert_eq!(event.namespace(), Some("app.http"));
		assert_eq!(event.get("status"), Some(&Value::Int(200)));
		assert_eq!(event.get("path"), Some(&Value::from("/")));
		assert!(event.time().is_some());
		assert_eq!(format_event(event), "served ok");
	}

	#[test]
	fn test_braces_in_messages_are_not_templates() {
		let events = capture(|| tracing::warn!(target: "app", "literal {{braces}}"));
		assert_eq!(format_event(&events[0]), "literal {braces}");
		assert_eq!(events[0].level(), Some(LogLevel::Warn));
	}

	#[test]
	fn test_own_diagnostics_are_ignored() {
		let events = capture(|| {
			tracing::debug!(target: "loom_log::publisher", "observer failed");
			tracing::trace!(target: "app", "kept");
		});
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].level(), Some(LogLevel::Debug));
	}

	#[test]
	fn test_level_mapping() {
		assert_eq!(level_from_tracing(&tracing::Level::TRACE), LogLevel::Debug);
		assert_eq!(level_from_tracing(&tracing::Level::ERROR), LogLevel::Error);
	}
}
