// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Integration tests for the startup pipeline.
//!
//! Tests cover:
//! - Buffering before logging begins and in-order replay afterwards
//! - Critical echo to the error stream, and its removal on begin
//! - The double-begin warning reaching every observer
//! - Failure isolation and reporting across a configured context

use std::io::{self, Write};
use std::sync::Arc;

use loom_log::publisher::PUBLISHER_NAMESPACE;
use loom_log::{
	format_event, LogContext, LogLevel, LoggingConfig, Observer, ObserverError, RingBuffer,
};
use parking_lot::Mutex;

/// Error stream shared with the test.
#[derive(Clone, Default)]
struct Stream(Arc<Mutex<Vec<u8>>>);

impl Stream {
	fn text(&self) -> String {
		String::from_utf8_lossy(&self.0.lock()).into_owned()
	}
}

impl Write for Stream {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

fn context(config: LoggingConfig) -> (LogContext, Stream) {
	let stream = Stream::default();
	let context = LogContext::from_config(config, Box::new(stream.clone()));
	(context, stream)
}

fn messages(buffer: &RingBuffer) -> Vec<String> {
	buffer.events().iter().map(format_event).collect()
}

fn collector() -> (Arc<dyn Observer>, RingBuffer) {
	let buffer = RingBuffer::unbounded();
	(Arc::new(buffer.clone()), buffer)
}

#[test]
fn events_before_begin_reach_late_observers_in_order() {
	let (context, stream) = context(LoggingConfig::default());
	let log = context.logger("app");

	log.info("starting {version}", [("version", "1.2.0")]);
	log.debug("filtered by the default level", ());
	log.critical("config missing: {path}", [("path", "/etc/app.toml")]);
	log.warn("running with defaults", ());

	assert_eq!(stream.text(), "config missing: /etc/app.toml\n");

	let (first, first_seen) = collector();
	let (second, second_seen) = collector();
	context.beginner().begin_logging_to([first, second]);

	let expected = vec![
		"starting 1.2.0".to_string(),
		"config missing: /etc/app.toml".to_string(),
		"running with defaults".to_string(),
	];
	assert_eq!(messages(&first_seen), expected);
	assert_eq!(messages(&second_seen), expected);

	log.critical("after begin", ());
	assert_eq!(stream.text(), "config missing: /etc/app.toml\n");
	assert_eq!(first_seen.len(), 4);
}

#[test]
fn bounded_startup_buffer_drops_the_oldest() {
	let (context, _) = context(LoggingConfig {
		buffer_capacity: Some(2),
		..Default::default()
	});
	let log = context.logger("app");
	for n in 0..5 {
		log.info("event {n}", [("n", n)]);
	}

	let (observer, seen) = collector();
	context.beginner().begin_logging_to([observer]);
	assert_eq!(messages(&seen), vec!["event 3", "event 4"]);
}

#[test]
fn second_begin_warns_every_observer() {
	let (context, _) = context(LoggingConfig::default());
	let (first, first_seen) = collector();
	let (second, second_seen) = collector();

	context.beginner().begin_logging_to([first]);
	context.beginner().begin_logging_to([second]);

	for seen in [&first_seen, &second_seen] {
		let events = seen.events();
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].level(), Some(LogLevel::Warn));
		let text = format_event(&events[0]);
		assert!(text.starts_with("Warning: primary log target selected twice at <"));
		assert!(text.contains("startup_tests.rs"));
		assert!(text.ends_with("Remove one of the calls to begin_logging_to."));
	}
}

#[test]
fn broken_observer_does_not_starve_the_others() {
	let (context, _) = context(LoggingConfig::default());
	let broken: Arc<dyn Observer> = Arc::new(|_: &mut loom_log::Event| -> Result<(), ObserverError> {
		Err(ObserverError::failed("disk full"))
	});
	let (healthy, seen) = collector();
	context.beginner().begin_logging_to([broken, healthy]);

	context.logger("app").error("request failed", ());

	let events = seen.events();
	assert_eq!(events.len(), 2);
	assert_eq!(format_event(&events[0]), "request failed");
	assert_eq!(events[1].namespace(), Some(PUBLISHER_NAMESPACE));
	assert_eq!(events[1].level(), Some(LogLevel::Critical));
	assert!(format_event(&events[1]).ends_with("due to exception: disk full"));
}
