// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Thread-safe ring buffer of events.

use std::collections::VecDeque;
use std::sync::Arc;

use loom_log_core::{Event, LogLevel};
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::error::ObserverError;
use crate::observer::Observer;

/// Default buffer capacity.
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Capacity of the live-tail broadcast channel.
const BROADCAST_CAPACITY: usize = 1024;

/// A FIFO of recent events, optionally bounded.
///
/// When a bounded buffer is full, the oldest event is evicted to make room.
/// Clones share the same storage. Besides replay and queries, new events
/// can be followed live through [`RingBuffer::subscribe`].
#[derive(Clone)]
pub struct RingBuffer {
	inner: Arc<RingBufferInner>,
}

struct RingBufferInner {
	events: RwLock<VecDeque<Event>>,
	/// `None` means unbounded.
	capacity: Option<usize>,
	sender: broadcast::Sender<Event>,
}

impl RingBuffer {
	/// Create a buffer holding at most `capacity` events.
	pub fn new(capacity: usize) -> Self {
		Self::with_capacity(Some(capacity))
	}

	pub fn unbounded() -> Self {
		Self::with_capacity(None)
	}

	pub fn with_default_capacity() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}

	pub fn with_capacity(capacity: Option<usize>) -> Self {
		let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
		let initial = capacity.unwrap_or(0).min(BROADCAST_CAPACITY);
		Self {
			inner: Arc::new(RingBufferInner {
				events: RwLock::new(VecDeque::with_capacity(initial)),
				capacity,
				sender,
			}),
		}
	}

	/// Append an event, evicting the oldest if the buffer is full.
	pub fn push(&self, event: Event) {
		if self.inner.sender.receiver_count() > 0 {
			// Ignore errors if every subscriber has gone away since.
			let _ = self.inner.sender.send(event.clone());
		}

		let mut events = self.inner.events.write();
		match self.inner.capacity {
			Some(0) => {}
			Some(capacity) => {
				while events.len() >= capacity {
					events.pop_front();
				}
				events.push_back(event);
			}
			None => events.push_back(event),
		}
	}

	/// Deliver every buffered event, oldest first, without removing them.
	///
	/// Works on a snapshot, so the observer may push back into this buffer.
	pub fn replay_to(&self, observer: &dyn Observer) -> Result<(), ObserverError> {
		for mut event in self.events() {
			observer.observe(&mut event)?;
		}
		Ok(())
	}

	/// Snapshot of the buffered events, oldest first.
	pub fn events(&self) -> Vec<Event> {
		self.inner.events.read().iter().cloned().collect()
	}

	/// The most recent `limit` events matching the filters, oldest first.
	pub fn query(
		&self,
		limit: usize,
		min_level: Option<LogLevel>,
		namespace_prefix: Option<&str>,
	) -> Vec<Event> {
		let events = self.inner.events.read();

		let mut matched: Vec<Event> = events
			.iter()
			.rev()
			.filter(|e| {
				if let Some(min) = min_level {
					if e.level().map_or(true, |level| level < min) {
						return false;
					}
				}
				if let Some(prefix) = namespace_prefix {
					if !e.namespace().is_some_and(|ns| ns.starts_with(prefix)) {
						return false;
					}
				}
				true
			})
			.take(limit)
			.cloned()
			.collect();
		matched.reverse();
		matched
	}

	pub fn len(&self) -> usize {
		self.inner.events.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.events.read().is_empty()
	}

	/// Maximum number of retained events; `None` when unbounded.
	pub fn capacity(&self) -> Option<usize> {
		self.inner.capacity
	}

	/// Follow events pushed after this call.
	pub fn subscribe(&self) -> broadcast::Receiver<Event> {
		self.inner.sender.subscribe()
	}

	pub fn clear(&self) {
		self.inner.events.write().clear();
	}
}

impl Default for RingBuffer {
	fn default() -> Self {
		Self::with_default_capacity()
	}
}

impl Observer for RingBuffer {
	fn observe(&self, event: &mut Event) -> Result<(), ObserverError> {
		self.push(event.clone());
		Ok(())
	}

	fn name(&self) -> String {
		match self.inner.capacity {
			Some(capacity) => format!("RingBuffer({capacity})"),
			None => "RingBuffer(unbounded)".to_string(),
		}
	}
}
