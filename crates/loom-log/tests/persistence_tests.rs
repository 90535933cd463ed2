// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Integration tests for writing events to files and reading them back.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use loom_log::{
	events_from_json_lines, extract_field, format_event, json_file_observer, text_file_observer,
	Fields, LogLevel, LogValue, Logger, LoggingWriter, Observer, Publisher, RingBuffer, Value,
	ValueError,
};
use tempfile::tempdir;

struct User {
	name: String,
}

impl LogValue for User {
	fn display(&self) -> Result<String, ValueError> {
		Ok(format!("user {}", self.name))
	}

	fn attribute(&self, name: &str) -> Option<Value> {
		(name == "name").then(|| Value::from(self.name.as_str()))
	}
}

fn append(path: &std::path::Path) -> Box<dyn Write + Send> {
	Box::new(
		OpenOptions::new()
			.create(true)
			.append(true)
			.open(path)
			.unwrap(),
	)
}

#[test]
fn json_log_file_round_trip_formats_identically() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("events.jsonl");

	let publisher = Arc::new(Publisher::new());
	let captured = RingBuffer::unbounded();
	publisher.add_observer(Arc::new(json_file_observer(append(&path))));
	publisher.add_observer(Arc::new(captured.clone()));

	let calls = Arc::new(AtomicUsize::new(0));
	let counter = calls.clone();
	let log = Logger::new("app.accounts", publisher.clone());
	log.info(
		"{user} ({user.name!r}) logged in after {attempts()} attempts, score {score:>8.3f}",
		Fields::new()
			.with(
				"user",
				Value::object(User {
					name: "ada".to_string(),
				}),
			)
			.with_thunk("attempts", move || {
				counter.fetch_add(1, Ordering::SeqCst);
				3
			})
			.with("score", 0.5),
	);
	log.warn("no fields here", ());

	let originals = captured.events();
	let loaded: Vec<_> = events_from_json_lines(BufReader::new(File::open(&path).unwrap())).collect();
	assert_eq!(loaded.len(), 2);

	assert_eq!(
		format_event(&loaded[0]),
		"user ada (\"ada\") logged in after 3 attempts, score    0.500"
	);
	for (original, loaded) in originals.iter().zip(&loaded) {
		assert_eq!(format_event(loaded), format_event(original));
		assert_eq!(loaded.level(), original.level());
		assert_eq!(loaded.namespace(), Some("app.accounts"));
	}
	assert_eq!(calls.load(Ordering::SeqCst), 1);

	assert_eq!(extract_field("attempts()", &loaded[0]).unwrap(), Value::Int(3));
	assert_eq!(
		extract_field("user.name!r", &loaded[0]).unwrap(),
		Value::from("\"ada\"")
	);
	assert_eq!(loaded[1].level(), Some(LogLevel::Warn));
}

#[test]
fn unknown_levels_and_damaged_lines_are_tolerated() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("events.jsonl");
	std::fs::write(
		&path,
		concat!(
			"{\"log_format\": \"ok\", \"log_level\": {\"name\": \"loud\", ",
			"\"__class_uuid__\": \"02E59486-F24D-46AD-8224-3ACDF2A5732A\"}}\n",
			"{\"log_format\": \"trunc\n",
			"\n",
			"{\"log_format\": \"fine\"}\n",
		),
	)
	.unwrap();

	let loaded: Vec<_> = events_from_json_lines(BufReader::new(File::open(&path).unwrap())).collect();
	assert_eq!(loaded.len(), 2);
	assert_eq!(loaded[0].level(), None);
	assert_eq!(loaded[0].get("log_level_name"), Some(&Value::from("loud")));
	assert_eq!(format_event(&loaded[1]), "fine");
}

#[test]
fn captured_output_lands_in_the_text_log() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("app.log");

	let sink: Arc<dyn Observer> = Arc::new(text_file_observer(append(&path), None));
	let logger = Logger::new("app.stdout", sink);
	let mut stdout = LoggingWriter::new(logger, LogLevel::Info);
	write!(stdout, "first line\nsecond").unwrap();
	stdout.close();

	let text = std::fs::read_to_string(&path).unwrap();
	assert_eq!(
		text,
		"- [app.stdout#info] first line\n- [app.stdout#info] second\n"
	);
}
