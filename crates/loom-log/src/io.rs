// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! A writer that turns lines of output into events.

use std::io;

use loom_log_core::LogLevel;

use crate::logger::{Fields, Logger};

/// Template of the events emitted by [`LoggingWriter`].
pub const LINE_FORMAT: &str = "{log_io}";

/// Field holding one line of written text.
pub const LINE_FIELD: &str = "log_io";

/// An [`io::Write`] that emits one event per completed line.
///
/// Bytes are decoded as UTF-8 (lossily) a line at a time, so multi-byte
/// characters split across writes survive. A trailing partial line is held
/// until a newline arrives, or emitted as-is on flush, close or drop.
pub struct LoggingWriter {
	logger: Logger,
	level: LogLevel,
	pending: Vec<u8>,
	closed: bool,
}

impl LoggingWriter {
	pub fn new(logger: Logger, level: LogLevel) -> Self {
		Self {
			logger,
			level,
			pending: Vec::new(),
			closed: false,
		}
	}

	pub fn level(&self) -> LogLevel {
		self.level
	}

	pub fn is_closed(&self) -> bool {
		self.closed
	}

	/// Display name, e.g. `<LoggingWriter app.stdout#info>`.
	pub fn name(&self) -> String {
		format!("<LoggingWriter {}#{}>", self.logger.namespace(), self.level)
	}

	/// Emit any partial line; later writes fail.
	pub fn close(&mut self) {
		self.emit_pending();
		self.closed = true;
	}

	fn emit_line(&self, line: &[u8]) {
		let text = String::from_utf8_lossy(line);
		self.logger.emit(
			self.level,
			LINE_FORMAT,
			Fields::new().with(LINE_FIELD, text.into_owned()),
		);
	}

	fn emit_pending(&mut self) {
		if self.pending.is_empty() {
			return;
		}
		let line = std::mem::take(&mut self.pending);
		self.emit_line(&line);
	}
}

impl io::Write for LoggingWriter {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		if self.closed {
			return Err(io::Error::other("write to a closed LoggingWriter"));
		}
		self.pending.extend_from_slice(buf);
		while let Some(newline) = self.pending.iter().position(|&b| b == b'\n') {
			let rest = self.pending.split_off(newline + 1);
			let mut line = std::mem::replace(&mut self.pending, rest);
			line.pop();
			self.emit_line(&line);
		}
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		self.emit_pending();
		Ok(())
	}
}

impl Drop for LoggingWriter {
	fn drop(&mut self) {
		self.emit_pending();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::buffer::RingBuffer;
	use loom_log_core::{format_event, Value};
	use std::io::Write;
	use std::sync::Arc;

	fn writer(level: LogLevel) -> (LoggingWriter, RingBuffer) {
		let buffer = RingBuffer::unbounded();
		let logger = Logger::new("app.stdout", Arc::new(buffer.clone()));
		(LoggingWriter::new(logger, level), buffer)
	}

	fn lines(buffer: &RingBuffer) -> Vec<String> {
		buffer.events().iter().map(format_event).collect()
	}

	#[test]
	fn test_one_event_per_line() {
		let (mut out, seen) = writer(LogLevel::Warn);
		write!(out, "hello\nwor").unwrap();
		assert_eq!(lines(&seen), vec!["hello"]);

		write!(out, "ld\n\nlast").unwrap();
		assert_eq!(lines(&seen), vec!["hello", "world", ""]);

		let events = seen.events();
		assert_eq!(events[0].level(), Some(LogLevel::Warn));
		assert_eq!(events[0].get(LINE_FIELD), Some(&Value::from("hello")));
		assert_eq!(events[0].namespace(), Some("app.stdout"));
	}

	#[test]
	fn test_flush_emits_partial_line() {
		let (mut out, seen) = writer(LogLevel::Info);
		out.write_all(b"partial").unwrap();
		assert!(seen.is_empty());
		out.flush().unwrap();
		out.flush().unwrap();
		assert_eq!(lines(&seen), vec!["partial"]);
	}

	#[test]
	fn test_split_utf8_sequences() {
		let (mut out, seen) = writer(LogLevel::Info);
		let bytes = "caf\u{e9}\n".as_bytes();
		out.write_all(&bytes[..4]).unwrap();
		out.write_all(&bytes[4..]).unwrap();
		assert_eq!(lines(&seen), vec!["caf\u{e9}"]);
	}

	#[test]
	fn test_writes_after_close_fail() {
		let (mut out, seen) = writer(LogLevel::Info);
		out.write_all(b"tail").unwrap();
		out.close();
		assert!(out.is_closed());
		assert_eq!(lines(&seen), vec!["tail"]);
		assert!(out.write_all(b"more").is_err());
		assert_eq!(out.name(), "<LoggingWriter app.stdout#info>");
	}

	#[test]
	fn test_drop_emits_partial_line() {
		let (mut out, seen) = writer(LogLevel::Info);
		out.write_all(b"unterminated").unwrap();
		drop(out);
		assert_eq!(lines(&seen), vec!["unterminated"]);
	}
}
