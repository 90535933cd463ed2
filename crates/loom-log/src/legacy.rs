// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Bridge to observers and call sites written against the old
//! `msg`/`err` logging style.

use std::sync::Arc;

use loom_log_core::{format_event, keys, Event, LogLevel, LogValue, ObserverId, Value, ValueError};

use crate::error::ObserverError;
use crate::logger::{Fields, Logger};
use crate::observer::Observer;

/// Format handed to old-style observers, which interpolate `log_legacy`.
pub const LEGACY_FORMAT: &str = "%(log_legacy)s";

/// Renders a snapshot of an event when displayed.
struct EventText(Event);

impl LogValue for EventText {
	fn display(&self) -> Result<String, ValueError> {
		Ok(format_event(&self.0))
	}
}

/// Adds the keys old-style observers expect, then forwards the event.
///
/// - `logLevel`: numeric level (debug 10 through critical 50).
/// - `message`: an empty list unless already present.
/// - `system`: copied from `log_system`.
/// - `format` and `log_legacy`: a printf-style template and a lazily
///   rendered copy of the event, when the event has a `log_format`.
/// - `failure`, `isError` and `why` for events carrying `log_failure`;
///   otherwise `isError` defaults to `0`.
pub struct LegacyObserverWrapper {
	observer: Arc<dyn Observer>,
}

impl LegacyObserverWrapper {
	pub fn new(observer: Arc<dyn Observer>) -> Self {
		Self { observer }
	}
}

impl Observer for LegacyObserverWrapper {
	fn observe(&self, event: &mut Event) -> Result<(), ObserverError> {
		if let Some(level) = event.level() {
			event.insert("logLevel", level.priority());
		}
		if !event.contains_key("message") {
			event.insert("message", Value::List(Vec::new()));
		}
		if let Some(system) = event.system().filter(|system| !system.is_null()).cloned() {
			event.insert("system", system);
		}
		let has_format = event.format().is_some_and(|format| !format.is_null());
		if has_format && !event.contains_key("format") {
			event.insert("format", LEGACY_FORMAT);
			let snapshot = event.clone();
			event.insert("log_legacy", Value::object(EventText(snapshot)));
		}
		if let Some(failure) = event.get(keys::FAILURE).cloned() {
			event.insert("failure", failure);
			event.insert("isError", 1);
			let why = format_event(event);
			event.insert("why", why);
		} else if !event.contains_key("isError") {
			event.insert("isError", 0);
		}

		event.record_hop(ObserverId::of(self), ObserverId::of(&*self.observer));
		self.observer.observe(event)
	}

	fn name(&self) -> String {
		format!("LegacyObserverWrapper({})", self.observer.name())
	}
}

/// Old-style `msg`/`err` calls on top of a [`Logger`].
#[derive(Debug, Clone)]
pub struct LegacyLogger {
	logger: Logger,
}

impl LegacyLogger {
	pub fn new(logger: Logger) -> Self {
		Self { logger }
	}

	pub fn logger(&self) -> &Logger {
		&self.logger
	}

	/// Emit an info event whose template is the parts joined by spaces.
	///
	/// With no parts the event carries fields only.
	pub fn msg(&self, parts: &[&str], fields: impl Into<Fields>) {
		let message = parts.join(" ");
		let format = (!parts.is_empty()).then_some(message.as_str());
		self.logger.emit_event(LogLevel::Info, format, fields.into());
	}

	/// Emit an error event carrying `failure`, `why` and `isError = 1`.
	pub fn err(&self, failure: impl Into<Value>, why: Option<&str>, fields: impl Into<Fields>) {
		let fields = fields
			.into()
			.with("failure", failure)
			.with("why", why)
			.with("isError", 1);
		self.logger.emit_event(LogLevel::Error, None, fields);
	}

	/// Emit an error event for something that is not a failure.
	///
	/// The template is the value's repr, with braces escaped so it renders
	/// verbatim.
	pub fn err_other(&self, stuff: impl Into<Value>, why: Option<&str>, fields: impl Into<Fields>) {
		let repr = stuff.into().safe_repr().replace('{', "{{").replace('}', "}}");
		let fields = fields.into().with("why", why).with("isError", 1);
		self.logger.emit_event(LogLevel::Error, Some(&repr), fields);
	}
}
