// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Saving and loading events as JSON lines.
//!
//! Events are flattened before encoding, so a decoded event formats to the
//! same text as the original even though live objects and thunks are gone.

use std::io::{BufRead, Write};

use loom_log_core::{flatten_event, keys, Event, LogLevel, Value, ValueMap};
use serde::de::Error as _;
use serde_json::{json, Map, Number};
use tracing::warn;

use crate::file::FileObserver;

/// Marker identifying an encoded [`LogLevel`].
pub const LEVEL_CLASS_UUID: &str = "02E59486-F24D-46AD-8224-3ACDF2A5732A";

/// Marker identifying an encoded non-finite float.
pub const FLOAT_CLASS_UUID: &str = "6F9E0C1B-3D52-4B8A-9E47-0A6C2F51D8E3";

const CLASS_UUID_KEY: &str = "__class_uuid__";

/// Flatten the event in place and encode it as a single-line JSON object.
///
/// A byte template that is valid UTF-8 is written as text, so it reads back
/// as the same template.
pub fn event_as_json(event: &mut Event) -> String {
	flatten_event(event);
	let object: Map<String, serde_json::Value> = event
		.iter()
		.map(|(key, value)| {
			let encoded = match (key, value) {
				(keys::FORMAT, Value::Bytes(bytes)) => match std::str::from_utf8(bytes) {
					Ok(template) => serde_json::Value::String(template.to_string()),
					Err(_) => to_json(value),
				},
				_ => to_json(value),
			};
			(key.to_string(), encoded)
		})
		.collect();
	serde_json::Value::Object(object).to_string()
}

/// Decode an event written by [`event_as_json`].
///
/// An unrecognized level name leaves `log_level` null and keeps the name
/// under `log_level_name`.
pub fn event_from_json(text: &str) -> Result<Event, serde_json::Error> {
	let serde_json::Value::Object(object) = serde_json::from_str(text)? else {
		return Err(serde_json::Error::custom("event is not a JSON object"));
	};

	let mut event = Event::new();
	for (key, value) in object {
		if key != keys::LEVEL {
			event.insert(key, from_json(value));
			continue;
		}
		match level_name(&value) {
			Some(name) => match name.parse::<LogLevel>() {
				Ok(level) => {
					event.insert(key, level);
				}
				Err(_) => {
					event.insert(keys::LEVEL_NAME, name);
					event.insert(key, Value::Null);
				}
			},
			None => {
				event.insert(key, from_json(value));
			}
		}
	}
	Ok(event)
}

/// A [`FileObserver`] writing one JSON event per line.
pub fn json_file_observer(writer: Box<dyn Write + Send>) -> FileObserver {
	FileObserver::new(writer, |event| Some(format!("{}\n", event_as_json(event))))
}

/// Lazily decode events from JSON lines.
///
/// Blank lines are ignored. Lines that are not UTF-8 or fail to decode are
/// logged and skipped; a read error ends the stream.
pub fn events_from_json_lines(reader: impl BufRead) -> impl Iterator<Item = Event> {
	reader
		.split(b'\n')
		.map_while(|line| {
			line
				.map_err(|err| warn!(error = %err, "stopped reading event log"))
				.ok()
		})
		.enumerate()
		.filter_map(|(index, line)| {
			let line = match String::from_utf8(line) {
				Ok(line) => line,
				Err(err) => {
					warn!(line = index + 1, error = %err, "skipping event line that is not UTF-8");
					return None;
				}
			};
			if line.trim().is_empty() {
				return None;
			}
			match event_from_json(&line) {
				Ok(event) => Some(event),
				Err(err) => {
					warn!(line = index + 1, error = %err, "skipping undecodable event");
					None
				}
			}
		})
}

fn unpersistable() -> serde_json::Value {
	json!({ "unpersistable": true })
}

fn to_json(value: &Value) -> serde_json::Value {
	match value {
		Value::Null => serde_json::Value::Null,
		Value::Bool(b) => serde_json::Value::Bool(*b),
		Value::Int(i) => serde_json::Value::from(*i),
		Value::Float(f) => Number::from_f64(*f).map_or_else(
			|| json!({ "float": non_finite_name(*f), "__class_uuid__": FLOAT_CLASS_UUID }),
			serde_json::Value::Number,
		),
		Value::Str(s) => serde_json::Value::String(s.clone()),
		// Latin-1: one char per byte.
		Value::Bytes(bytes) => serde_json::Value::String(bytes.iter().map(|&b| b as char).collect()),
		Value::List(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
		Value::Map(map) => serde_json::Value::Object(
			map
				.iter()
				.map(|(key, value)| (key.clone(), to_json(value)))
				.collect(),
		),
		Value::Level(level) => json!({ "name": level.as_str(), "__class_uuid__": LEVEL_CLASS_UUID }),
		Value::Object(object) => object
			.persistable()
			.map_or_else(unpersistable, |plain| to_json(&plain)),
		Value::Thunk(_) => unpersistable(),
	}
}

fn from_json(value: serde_json::Value) -> Value {
	match value {
		serde_json::Value::Null => Value::Null,
		serde_json::Value::Bool(b) => Value::Bool(b),
		serde_json::Value::Number(n) => {
			if let Some(i) = n.as_i64() {
				Value::Int(i)
			} else if let Some(u) = n.as_u64() {
				Value::from(u)
			} else {
				n.as_f64().map_or(Value::Null, Value::Float)
			}
		}
		serde_json::Value::String(s) => Value::Str(s),
		serde_json::Value::Array(items) => Value::List(items.into_iter().map(from_json).collect()),
		serde_json::Value::Object(object) => {
			if let Some(value) = encoded_float(&object) {
				return Value::Float(value);
			}
			if is_encoded_level(&object) {
				return object
					.get("name")
					.and_then(serde_json::Value::as_str)
					.and_then(|name| name.parse::<LogLevel>().ok())
					.map_or(Value::Null, Value::Level);
			}
			Value::Map(
				object
					.into_iter()
					.map(|(key, value)| (key, from_json(value)))
					.collect::<ValueMap>(),
			)
		}
	}
}

fn non_finite_name(value: f64) -> &'static str {
	if value.is_nan() {
		"nan"
	} else if value.is_sign_negative() {
		"-inf"
	} else {
		"inf"
	}
}

fn encoded_float(object: &Map<String, serde_json::Value>) -> Option<f64> {
	if object.get(CLASS_UUID_KEY).and_then(serde_json::Value::as_str) != Some(FLOAT_CLASS_UUID) {
		return None;
	}
	match object.get("float").and_then(serde_json::Value::as_str)? {
		"nan" => Some(f64::NAN),
		"inf" => Some(f64::INFINITY),
		"-inf" => Some(f64::NEG_INFINITY),
		_ => None,
	}
}

fn is_encoded_level(object: &Map<String, serde_json::Value>) -> bool {
	object.get(CLASS_UUID_KEY).and_then(serde_json::Value::as_str) == Some(LEVEL_CLASS_UUID)
}

/// Level name of a `log_level` value, encoded or given as plain text.
fn level_name(value: &serde_json::Value) -> Option<&str> {
	match value {
		serde_json::Value::String(name) => Some(name),
		serde_json::Value::Object(object) if is_encoded_level(object) => {
			object.get("name").and_then(serde_json::Value::as_str)
		}
		_ => None,
	}
}
