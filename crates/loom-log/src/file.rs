// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Terminal observer writing formatted events to a byte stream.

use std::io::Write;

use loom_log_core::{format_event_as_classic_log_text, Event, TimeFormat};
use parking_lot::Mutex;

use crate::error::ObserverError;
use crate::observer::Observer;

type EventFormat = Box<dyn Fn(&mut Event) -> Option<String> + Send + Sync>;

/// Writes each event through a formatting function, then flushes.
///
/// The formatter may annotate the event before rendering it. Events for
/// which it returns `None` are skipped.
pub struct FileObserver {
	writer: Mutex<Box<dyn Write + Send>>,
	format: EventFormat,
}

impl FileObserver {
	pub fn new<F>(writer: Box<dyn Write + Send>, format: F) -> Self
	where
		F: Fn(&mut Event) -> Option<String> + Send + Sync + 'static,
	{
		Self {
			writer: Mutex::new(writer),
			format: Box::new(format),
		}
	}
}

impl Observer for FileObserver {
	fn observe(&self, event: &mut Event) -> Result<(), ObserverError> {
		let Some(text) = (self.format)(event) else {
			return Ok(());
		};
		let mut writer = self.writer.lock();
		writer.write_all(text.as_bytes())?;
		writer.flush()?;
		Ok(())
	}

	fn name(&self) -> String {
		"FileObserver".to_string()
	}
}

/// A [`FileObserver`] writing classic `"{time} [{system}] {text}"` lines.
pub fn text_file_observer(
	writer: Box<dyn Write + Send>,
	time_format: Option<TimeFormat>,
) -> FileObserver {
	FileObserver::new(writer, move |event| {
		format_event_as_classic_log_text(event, time_format.as_ref())
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use loom_log_core::{keys, LogLevel};
	use std::io;
	use std::sync::Arc;

	/// Shared in-memory sink.
	#[derive(Clone, Default)]
	struct Sink(Arc<Mutex<Vec<u8>>>);

	impl Sink {
		fn contents(&self) -> String {
			String::from_utf8(self.0.lock().clone()).unwrap()
		}
	}

	impl Write for Sink {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.0.lock().extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	struct Broken;

	impl Write for Broken {
		fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
			Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	#[test]
	fn test_text_lines() {
		let sink = Sink::default();
		let observer = text_file_observer(Box::new(sink.clone()), None);

		let mut event = Event::new()
			.with(keys::FORMAT, "two\nlines")
			.with(keys::NAMESPACE, "app")
			.with(keys::LEVEL, LogLevel::Warn);
		observer.observe(&mut event).unwrap();

		let mut silent = Event::new().with(keys::NAMESPACE, "app");
		observer.observe(&mut silent).unwrap();

		assert_eq!(sink.contents(), "- [app#warn] two\n\tlines\n");
	}

	#[test]
	fn test_custom_format_and_skips() {
		let sink = Sink::default();
		let observer = FileObserver::new(Box::new(sink.clone()), |event| {
			event.get("n").map(|n| format!("{}|", n.safe_repr()))
		});
		observer.observe(&mut Event::new().with("n", 1)).unwrap();
		observer.observe(&mut Event::new()).unwrap();
		observer.observe(&mut Event::new().with("n", 2)).unwrap();
		assert_eq!(sink.contents(), "1|2|");
	}

	#[test]
	fn test_write_errors_surface() {
		let observer = text_file_observer(Box::new(Broken), None);
		let mut event = Event::new().with(keys::FORMAT, "x");
		assert!(matches!(
			observer.observe(&mut event),
			Err(ObserverError::Io(_))
		));
	}
}
