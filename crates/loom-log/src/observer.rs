// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The observer capability.

use std::sync::Arc;

use loom_log_core::Event;

use crate::error::ObserverError;

/// A consumer of events.
///
/// Observers receive the event mutably so pipeline stages can annotate it
/// in place (trace hops, flattened fields, legacy keys).
pub trait Observer: Send + Sync {
	fn observe(&self, event: &mut Event) -> Result<(), ObserverError>;

	/// Name used when reporting a failure of this observer.
	fn name(&self) -> String {
		std::any::type_name::<Self>().to_string()
	}
}

impl<F> Observer for F
where
	F: Fn(&mut Event) -> Result<(), ObserverError> + Send + Sync,
{
	fn observe(&self, event: &mut Event) -> Result<(), ObserverError> {
		self(event)
	}
}

/// Wrap an infallible closure as a shareable observer.
pub fn observer_fn<F>(f: F) -> Arc<dyn Observer>
where
	F: Fn(&mut Event) + Send + Sync + 'static,
{
	Arc::new(move |event: &mut Event| -> Result<(), ObserverError> {
		f(event);
		Ok(())
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use parking_lot::Mutex;

	#[test]
	fn test_closures_are_observers() {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = seen.clone();
		let observer = observer_fn(move |event| sink.lock().push(event.clone()));

		let mut event = Event::new().with("x", 1);
		observer.observe(&mut event).unwrap();
		assert_eq!(seen.lock().len(), 1);
	}

	#[test]
	fn test_fallible_closure_reports_error() {
		let observer: Arc<dyn Observer> =
			Arc::new(|_: &mut Event| -> Result<(), ObserverError> { Err(ObserverError::failed("nope")) });
		assert!(observer.observe(&mut Event::new()).is_err());
		assert!(observer.name().contains("closure"));
	}
}
