// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Startup buffering and the one-way switch to real log targets.

use std::io::Write;
use std::panic::Location;
use std::sync::{Arc, Weak};

use loom_log_core::{format_event, Event, LogLevel};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::buffer::{RingBuffer, DEFAULT_CAPACITY};
use crate::error::ObserverError;
use crate::file::FileObserver;
use crate::filter::{FilteringObserver, LevelGate, Predicate};
use crate::logger::{Fields, Logger};
use crate::observer::Observer;
use crate::publisher::Publisher;

/// Namespace of the double-begin warning.
pub const BEGINNER_NAMESPACE: &str = "loom_log.beginner";

/// Template of the double-begin warning.
pub const SELECTED_TWICE: &str = "Warning: primary log target selected twice at \
	<{file_now}:{line_now}> - previously selected at <{file_then}:{line_then}>.  \
	Remove one of the calls to begin_logging_to.";

/// The observer registered while buffering.
///
/// Once closed it stops buffering. A delivery that took its registry
/// snapshot before the switch, and so missed the new observers, is handed
/// back to the publisher instead.
struct StartupObserver {
	publisher: Weak<Publisher>,
	buffer: RingBuffer,
	critical_echo: FilteringObserver,
	closed: Mutex<bool>,
}

impl StartupObserver {
	fn close(&self) {
		*self.closed.lock() = true;
	}
}

impl Observer for StartupObserver {
	fn observe(&self, event: &mut Event) -> Result<(), ObserverError> {
		{
			let closed = self.closed.lock();
			if !*closed {
				self.buffer.push(event.clone());
				return self.critical_echo.observe(event);
			}
		}
		if let Some(publisher) = self.publisher.upgrade() {
			publisher.publish(event);
		}
		Ok(())
	}

	fn name(&self) -> String {
		"StartupObserver".to_string()
	}
}

enum BeginnerState {
	Buffering { startup: Arc<StartupObserver> },
	Begun { previous: &'static Location<'static> },
}

/// What a call to `begin_logging_to` switched away from.
enum Switched {
	First(Arc<StartupObserver>),
	Again(&'static Location<'static>),
}

/// Holds events emitted before logging is configured.
///
/// Until [`LogBeginner::begin_logging_to`] is called, every event published
/// is retained in a ring buffer, and critical events are also written as
/// text to an error stream. The first call attaches the real observers and
/// replays the buffer into the publisher. Later calls still attach their
/// observers but emit a warning naming both call sites.
///
/// The switch itself is a single registry update, so each event reaches
/// the new observers exactly once: live or through the replay. Events
/// published from other threads while the replay runs may be seen before
/// older buffered ones.
pub struct LogBeginner {
	publisher: Arc<Publisher>,
	state: Mutex<BeginnerState>,
}

impl LogBeginner {
	/// Start buffering with the default capacity.
	pub fn new(publisher: Arc<Publisher>, error_stream: Box<dyn Write + Send>) -> Self {
		Self::with_capacity(publisher, error_stream, Some(DEFAULT_CAPACITY))
	}

	/// Start buffering at most `capacity` events; `None` keeps everything.
	pub fn with_capacity(
		publisher: Arc<Publisher>,
		error_stream: Box<dyn Write + Send>,
		capacity: Option<usize>,
	) -> Self {
		let critical_gate: Arc<dyn Predicate> = Arc::new(LevelGate::with_default(LogLevel::Critical));
		let critical_echo = FilteringObserver::new(
			Arc::new(FileObserver::new(error_stream, |event| {
				let text = format_event(event);
				(!text.is_empty()).then(|| format!("{text}\n"))
			})),
			[critical_gate],
		);

		let startup = Arc::new(StartupObserver {
			publisher: Arc::downgrade(&publisher),
			buffer: RingBuffer::with_capacity(capacity),
			critical_echo,
			closed: Mutex::new(false),
		});
		publisher.add_observer(startup.clone());

		Self {
			publisher,
			state: Mutex::new(BeginnerState::Buffering { startup }),
		}
	}

	pub fn publisher(&self) -> &Arc<Publisher> {
		&self.publisher
	}

	pub fn is_begun(&self) -> bool {
		matches!(*self.state.lock(), BeginnerState::Begun { .. })
	}

	/// Attach the given observers and replay everything buffered so far.
	#[track_caller]
	pub fn begin_logging_to(&self, observers: impl IntoIterator<Item = Arc<dyn Observer>>) {
		self.begin_logging_to_with(observers, false);
	}

	/// Like [`LogBeginner::begin_logging_to`]; with `discard_buffer` the
	/// buffered events are dropped instead of replayed.
	#[track_caller]
	pub fn begin_logging_to_with(
		&self,
		observers: impl IntoIterator<Item = Arc<dyn Observer>>,
		discard_buffer: bool,
	) {
		let caller = Location::caller();

		// Concurrent callers wait here until the switch is complete.
		let switched = {
			let mut state = self.state.lock();
			match std::mem::replace(&mut *state, BeginnerState::Begun { previous: caller }) {
				BeginnerState::Buffering { startup } => {
					let temporary: Arc<dyn Observer> = startup.clone();
					self.publisher.replace_observer(&temporary, observers);
					startup.close();
					Switched::First(startup)
				}
				BeginnerState::Begun { previous } => {
					for observer in observers {
						self.publisher.add_observer(observer);
					}
					Switched::Again(previous)
				}
			}
		};

		match switched {
			Switched::First(startup) => {
				let buffer = &startup.buffer;
				if discard_buffer {
					debug!(discarded = buffer.len(), "dropping startup buffer");
					return;
				}
				debug!(events = buffer.len(), "replaying startup buffer");
				if let Err(err) = buffer.replay_to(&*self.publisher) {
					warn!(error = %err, "startup buffer replay failed");
				}
			}
			Switched::Again(previous) => {
				warn!(
					now = %caller,
					then = %previous,
					"log targets selected more than once"
				);
				Logger::new(BEGINNER_NAMESPACE, self.publisher.clone()).warn(
					SELECTED_TWICE,
					Fields::new()
						.with("file_now", caller.file())
						.with("line_now", caller.line())
						.with("file_then", previous.file())
						.with("line_then", previous.line()),
				);
			}
		}
	}
}
