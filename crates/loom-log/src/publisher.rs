// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Fan-out of events to a dynamic set of observers.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use loom_log_core::error::panic_message;
use loom_log_core::{Event, LogLevel, ObserverId};
use parking_lot::RwLock;
use tracing::debug;

use crate::error::ObserverError;
use crate::logger::{Fields, Logger};
use crate::observer::Observer;

/// Namespace of the events reporting a failed observer.
pub const PUBLISHER_NAMESPACE: &str = "loom_log.publisher";

/// Template of the event reporting a failed observer.
pub const OBSERVER_DISABLED: &str =
	"Temporarily disabling observer {observer} due to exception: {log_failure}";

/// Delivers every event to each registered observer, in registration order.
///
/// Observers are unique by identity. Delivery works on a snapshot of the
/// registry, so observers may add or remove observers (including
/// themselves) while an event is in flight. A failing or panicking
/// observer does not stop delivery to the others; after the pass each
/// failure is reported through a publisher holding every observer except
/// the one that failed.
#[derive(Default)]
pub struct Publisher {
	observers: RwLock<Vec<Arc<dyn Observer>>>,
}

impl Publisher {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_observers(observers: impl IntoIterator<Item = Arc<dyn Observer>>) -> Self {
		let publisher = Self::new();
		for observer in observers {
			publisher.add_observer(observer);
		}
		publisher
	}

	/// Register an observer; a no-op if it is already registered.
	pub fn add_observer(&self, observer: Arc<dyn Observer>) {
		let mut observers = self.observers.write();
		if !observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
			observers.push(observer);
		}
	}

	/// Unregister an observer; a no-op if it is not registered.
	pub fn remove_observer(&self, observer: &Arc<dyn Observer>) {
		self.observers.write().retain(|o| !Arc::ptr_eq(o, observer));
	}

	/// Swap `old` for `new` in one registry update, so no delivery sees
	/// both or neither. Observers already registered are skipped.
	pub fn replace_observer(
		&self,
		old: &Arc<dyn Observer>,
		new: impl IntoIterator<Item = Arc<dyn Observer>>,
	) {
		let mut observers = self.observers.write();
		observers.retain(|o| !Arc::ptr_eq(o, old));
		for observer in new {
			if !observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
				observers.push(observer);
			}
		}
	}

	pub fn contains(&self, observer: &Arc<dyn Observer>) -> bool {
		self.observers.read().iter().any(|o| Arc::ptr_eq(o, observer))
	}

	/// Snapshot of the registered observers in delivery order.
	pub fn observers(&self) -> Vec<Arc<dyn Observer>> {
		self.observers.read().clone()
	}

	pub fn len(&self) -> usize {
		self.observers.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.observers.read().is_empty()
	}

	/// Deliver an event to every observer.
	pub fn publish(&self, event: &mut Event) {
		let observers = self.observers();
		let me = ObserverId::of(self);
		let mut broken = Vec::new();

		for observer in &observers {
			event.record_hop(me, ObserverId::of(&**observer));
			let error = match catch_unwind(AssertUnwindSafe(|| observer.observe(event))) {
				Ok(Ok(())) => continue,
				Ok(Err(err)) => err,
				Err(payload) => ObserverError::Panicked(panic_message(payload.as_ref())),
			};
			debug!(observer = %observer.name(), error = %error, "observer failed");
			broken.push((observer, error));
		}

		for (observer, error) in broken {
			self.report_failure(&observers, observer, &error);
		}
	}

	fn report_failure(
		&self,
		observers: &[Arc<dyn Observer>],
		broken: &Arc<dyn Observer>,
		error: &ObserverError,
	) {
		let others = Publisher::with_observers(
			observers
				.iter()
				.filter(|o| !Arc::ptr_eq(o, broken))
				.cloned(),
		);
		Logger::new(PUBLISHER_NAMESPACE, Arc::new(others)).failure(
			OBSERVER_DISABLED,
			error.to_string(),
			LogLevel::Critical,
			Fields::new().with("observer", broken.name()),
		);
	}
}

impl Observer for Publisher {
	fn observe(&self, event: &mut Event) -> Result<(), ObserverError> {
		self.publish(event);
		Ok(())
	}
}
