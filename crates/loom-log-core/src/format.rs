// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rendering and flattening of event message templates.
//!
//! [`format_event`] renders an event's `log_format` against its fields and
//! never fails: any error degrades into diagnostic text. [`flatten_event`]
//! pre-resolves every field a template refers to so the event can be
//! persisted and later rendered to the same text without its live values.

use std::borrow::Cow;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::{panic_message, FormatError};
use crate::event::{keys, Event};
use crate::format_spec;
use crate::template::{self, Accessor, FieldPath, FieldRef, Segment};
use crate::time::{format_time, TimeFormat};
use crate::value::Value;

/// Outcome of rendering an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendering {
	/// The template rendered cleanly.
	Rendered(String),
	/// Rendering failed; the text describes the event and the failure.
	Degraded(String),
}

impl Rendering {
	pub fn is_degraded(&self) -> bool {
		matches!(self, Rendering::Degraded(_))
	}

	pub fn into_text(self) -> String {
		match self {
			Rendering::Rendered(text) | Rendering::Degraded(text) => text,
		}
	}
}

/// Render an event's message. Never panics.
pub fn format_event(event: &Event) -> String {
	render_event(event).into_text()
}

/// Render an event's message, reporting whether rendering degraded.
pub fn render_event(event: &Event) -> Rendering {
	match catch_unwind(AssertUnwindSafe(|| try_format(event))) {
		Ok(Ok(text)) => Rendering::Rendered(text),
		Ok(Err(err)) => Rendering::Degraded(format_unformattable_event(event, &err)),
		Err(payload) => {
			let err = FormatError::Panicked(panic_message(payload.as_ref()));
			Rendering::Degraded(format_unformattable_event(event, &err))
		}
	}
}

/// Describe an event that could not be rendered.
///
/// Falls back to a per-field best-effort dump when the event itself cannot
/// be represented.
pub fn format_unformattable_event(event: &Event, error: &FormatError) -> String {
	let inner = match catch_unwind(AssertUnwindSafe(|| event.try_repr())) {
		Ok(Ok(repr)) => return format!("Unable to format event {repr}: {error}"),
		Ok(Err(err)) => err.to_string(),
		Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
	};

	let recoverable = event
		.iter()
		.map(|(key, value)| format!("{key:?} = {}", value.safe_repr()))
		.collect::<Vec<_>>()
		.join(", ");

	format!(
		"MESSAGE LOST: unformattable object logged: {error}\n\
		 Recoverable data: {recoverable}\n\
		 Exception during formatting:\n{inner}"
	)
}

/// Render an event as a classic log line: `"{time} [{system}] {text}\n"`.
///
/// Returns `None` when the event has no text. Continuation lines are
/// indented with a tab.
pub fn format_event_as_classic_log_text(event: &Event, time_format: Option<&TimeFormat>) -> Option<String> {
	let text = format_event(event);
	if text.is_empty() {
		return None;
	}
	let text = text.replace('\n', "\n\t");
	let time = format_time(event.time(), time_format);

	let system = match event.system() {
		Some(system) => catch_unwind(AssertUnwindSafe(|| system.to_text()))
			.ok()
			.and_then(Result::ok)
			.unwrap_or_else(|| "UNFORMATTABLE".to_string()),
		None => format!(
			"{}#{}",
			event.namespace().unwrap_or("-"),
			event.level().map_or("-", |level| level.as_str())
		),
	};

	Some(format!("{time} [{system}] {text}\n"))
}

/// Pre-resolve every field referenced by the event's template.
///
/// Resolved values are stored under `log_flattened`, keyed by
/// [`template::flat_key`]. Call-marked fields are invoked once per distinct
/// key, and an already flattened event keeps its earlier values. If any
/// field fails to resolve the event is left unmarked.
pub fn flatten_event(event: &mut Event) {
	let Some(Ok(template)) = event.format().map(|format| template_text(format).map(Cow::into_owned)) else {
		return;
	};
	let Ok(segments) = template::parse(&template) else {
		return;
	};

	let mut flattened = event.flattened().cloned().unwrap_or_default();
	for segment in segments {
		let Segment::Field(field) = segment else {
			continue;
		};
		let key = field.flat_key();
		if flattened.contains_key(&key) {
			continue;
		}
		match catch_unwind(AssertUnwindSafe(|| resolve_converted(event, &field))) {
			Ok(Ok(value)) => {
				flattened.insert(key, value);
			}
			_ => return,
		}
	}

	event.insert(keys::FLATTENED, Value::Map(flattened));
}

/// Resolve a field expression (as it would appear inside `{}`) against an
/// event.
///
/// Flattened values are consulted first, so the result is the same before
/// and after the event is persisted.
pub fn extract_field(expr: &str, event: &Event) -> Result<Value, FormatError> {
	let wrapped = format!("{{{expr}}}");
	let segments = template::parse(&wrapped)?;
	let [Segment::Field(field)] = segments.as_slice() else {
		return Err(FormatError::template(format!("{expr:?} is not a single field")));
	};

	if let Some(value) = event.flattened().and_then(|flat| flat.get(&field.flat_key())) {
		return Ok(value.clone());
	}
	resolve_converted(event, field)
}

fn try_format(event: &Event) -> Result<String, FormatError> {
	let Some(format) = event.format() else {
		return Ok(String::new());
	};
	let template = template_text(format)?;
	let segments = template::parse(&template)?;
	let flattened = event.flattened();

	let mut out = String::with_capacity(template.len());
	for segment in segments {
		match segment {
			Segment::Literal(text) => out.push_str(&text),
			Segment::Field(field) => {
				let text = match flattened {
					Some(flat) => {
						let key = field.flat_key();
						let value = flat.get(&key).ok_or(FormatError::MissingFlattened(key))?;
						format_spec::apply(value, field.spec)?
					}
					None => format_spec::apply(&resolve_converted(event, &field)?, field.spec)?,
				};
				out.push_str(&text);
			}
		}
	}
	Ok(out)
}

fn template_text(format: &Value) -> Result<Cow<'_, str>, FormatError> {
	match format {
		Value::Str(s) => Ok(Cow::Borrowed(s)),
		Value::Bytes(bytes) => std::str::from_utf8(bytes)
			.map(Cow::Borrowed)
			.map_err(|err| FormatError::InvalidUtf8(err.to_string())),
		other => Err(FormatError::NonTextFormat(other.kind())),
	}
}

/// Resolve, call, convert and normalize a single field.
///
/// Numbers stay numeric; everything else becomes its display text, which
/// is the form stored by [`flatten_event`].
fn resolve_converted(event: &Event, field: &FieldRef<'_>) -> Result<Value, FormatError> {
	let value = resolve(event, field.expr)?;
	let converted = match field.conversion {
		None => value,
		Some('s') => Value::Str(value.to_text()?),
		Some('r') => Value::Str(value.to_repr()?),
		Some(other) => return Err(FormatError::UnknownConversion(other)),
	};
	match converted {
		Value::Int(_) | Value::Float(_) | Value::Str(_) => Ok(converted),
		other => Ok(Value::Str(other.to_text()?)),
	}
}

fn resolve(event: &Event, expr: &str) -> Result<Value, FormatError> {
	let path = FieldPath::parse(expr)?;
	let mut value = event
		.get(path.name)
		.cloned()
		.ok_or_else(|| FormatError::MissingField(path.name.to_string()))?;

	if path.call {
		value = match value {
			Value::Thunk(thunk) => thunk.call().map_err(|source| FormatError::CallFailed {
				field: path.name.to_string(),
				source,
			})?,
			_ => return Err(FormatError::NotCallable(path.name.to_string())),
		};
	}

	for accessor in &path.accessors {
		value = access(&value, *accessor)?;
	}
	Ok(value)
}

fn access(value: &Value, accessor: Accessor<'_>) -> Result<Value, FormatError> {
	match accessor {
		Accessor::Attr(name) => match value {
			Value::Map(map) => map.get(name).cloned(),
			Value::Object(obj) => obj.attribute(name),
			_ => None,
		}
		.ok_or_else(|| FormatError::MissingAttribute {
			kind: value.kind(),
			name: name.to_string(),
		}),
		Accessor::Index(key) => match value {
			Value::Map(map) => map.get(key).cloned(),
			Value::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i).cloned()),
			Value::Object(obj) => obj.attribute(key),
			_ => None,
		}
		.ok_or_else(|| FormatError::MissingIndex {
			kind: value.kind(),
			key: key.to_string(),
		}),
	}
}
