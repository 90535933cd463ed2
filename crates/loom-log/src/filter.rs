// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Predicate-based filtering and the namespace level gate.

use std::collections::HashMap;
use std::sync::Arc;

use loom_log_core::{Event, LogError, LogLevel, ObserverId};
use parking_lot::RwLock;
use tracing::trace;

use crate::error::ObserverError;
use crate::observer::Observer;

/// Decision of a single predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateResult {
	Yes,
	No,
	/// Defer to the next predicate.
	Abstain,
}

/// A filter consulted before an event is forwarded.
pub trait Predicate: Send + Sync {
	fn evaluate(&self, event: &Event) -> PredicateResult;
}

impl<F> Predicate for F
where
	F: Fn(&Event) -> PredicateResult + Send + Sync,
{
	fn evaluate(&self, event: &Event) -> PredicateResult {
		self(event)
	}
}

/// Forwards events to a downstream observer when its predicates allow.
///
/// Predicates run in order; the first `Yes` or `No` decides. When every
/// predicate abstains the event is forwarded.
pub struct FilteringObserver {
	observer: Arc<dyn Observer>,
	predicates: Vec<Arc<dyn Predicate>>,
}

impl FilteringObserver {
	pub fn new(
		observer: Arc<dyn Observer>,
		predicates: impl IntoIterator<Item = Arc<dyn Predicate>>,
	) -> Self {
		Self {
			observer,
			predicates: predicates.into_iter().collect(),
		}
	}

	pub fn should_log(&self, event: &Event) -> bool {
		for predicate in &self.predicates {
			match predicate.evaluate(event) {
				PredicateResult::Yes => return true,
				PredicateResult::No => return false,
				PredicateResult::Abstain => continue,
			}
		}
		true
	}
}

impl Observer for FilteringObserver {
	fn observe(&self, event: &mut Event) -> Result<(), ObserverError> {
		if !self.should_log(event) {
			trace!(namespace = event.namespace(), "event filtered out");
			return Ok(());
		}
		event.record_hop(ObserverId::of(self), ObserverId::of(&*self.observer));
		self.observer.observe(event)
	}

	fn name(&self) -> String {
		format!("FilteringObserver({})", self.observer.name())
	}
}

struct LevelMap {
	default: LogLevel,
	namespaces: HashMap<String, LogLevel>,
}

/// Per-namespace minimum levels.
///
/// Lookups walk dotted prefixes from the most specific: with `a.b` set to
/// `warn`, `a.b.c` resolves to `warn`. Unconfigured namespaces, and a
/// missing or empty namespace, resolve to the default level.
///
/// As a [`Predicate`] it only vetoes: events without a level or namespace,
/// or below their namespace's level, get `No`; everything else `Abstain`.
pub struct LevelGate {
	initial_default: LogLevel,
	levels: RwLock<LevelMap>,
}

impl LevelGate {
	/// A gate whose default level is `info`.
	pub fn new() -> Self {
		Self::with_default(LogLevel::Info)
	}

	pub fn with_default(default: LogLevel) -> Self {
		Self {
			initial_default: default,
			levels: RwLock::new(LevelMap {
				default,
				namespaces: HashMap::new(),
			}),
		}
	}

	pub fn default_level(&self) -> LogLevel {
		self.levels.read().default
	}

	pub fn resolve(&self, namespace: Option<&str>) -> LogLevel {
		let levels = self.levels.read();
		let Some(mut namespace) = namespace.filter(|ns| !ns.is_empty()) else {
			return levels.default;
		};
		loop {
			if let Some(level) = levels.namespaces.get(namespace) {
				return *level;
			}
			match namespace.rfind('.') {
				Some(dot) => namespace = &namespace[..dot],
				None => return levels.default,
			}
		}
	}

	/// Set the level for a namespace, or the default when it is missing or
	/// empty.
	pub fn set(&self, namespace: Option<&str>, level: LogLevel) {
		let mut levels = self.levels.write();
		match namespace.filter(|ns| !ns.is_empty()) {
			Some(namespace) => {
				levels.namespaces.insert(namespace.to_string(), level);
			}
			None => levels.default = level,
		}
	}

	/// Like [`LevelGate::set`], with the level given by name.
	pub fn set_by_name(&self, namespace: Option<&str>, level: &str) -> Result<(), LogError> {
		self.set(namespace, level.parse()?);
		Ok(())
	}

	/// Forget every namespace level and restore the original default.
	pub fn clear(&self) {
		let mut levels = self.levels.write();
		levels.namespaces.clear();
		levels.default = self.initial_default;
	}
}

impl Default for LevelGate {
	fn default() -> Self {
		Self::new()
	}
}

impl Predicate for LevelGate {
	fn evaluate(&self, event: &Event) -> PredicateResult {
		let (Some(level), Some(namespace)) = (event.level(), event.namespace()) else {
			return PredicateResult::No;
		};
		if level.priority() < self.resolve(Some(namespace)).priority() {
			PredicateResult::No
		} else {
			PredicateResult::Abstain
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::buffer::RingBuffer;
	use loom_log_core::keys;
	use proptest::prelude::*;

	fn event(namespace: &str, level: LogLevel) -> Event {
		Event::new()
			.with(keys::NAMESPACE, namespace)
			.with(keys::LEVEL, level)
	}

	fn answer(result: PredicateResult) -> Arc<dyn Predicate> {
		Arc::new(move |_: &Event| result)
	}

	fn filtered(predicates: Vec<Arc<dyn Predicate>>) -> (FilteringObserver, RingBuffer) {
		let buffer = RingBuffer::unbounded();
		(
			FilteringObserver::new(Arc::new(buffer.clone()), predicates),
			buffer,
		)
	}

	#[test]
	fn test_first_decision_wins() {
		let (observer, seen) = filtered(vec![
			answer(PredicateResult::Abstain),
			answer(PredicateResult::No),
			answer(PredicateResult::Yes),
		]);
		observer.observe(&mut Event::new()).unwrap();
		assert!(seen.is_empty());

		let (observer, seen) = filtered(vec![
			answer(PredicateResult::Yes),
			answer(PredicateResult::No),
		]);
		observer.observe(&mut Event::new()).unwrap();
		assert_eq!(seen.len(), 1);
	}

	#[test]
	fn test_exhausted_chain_forwards() {
		let (observer, seen) = filtered(vec![
			answer(PredicateResult::Abstain),
			answer(PredicateResult::Abstain),
		]);
		observer.observe(&mut Event::new()).unwrap();
		assert_eq!(seen.len(), 1);

		let (observer, seen) = filtered(Vec::new());
		observer.observe(&mut Event::new()).unwrap();
		assert_eq!(seen.len(), 1);
	}

	#[test]
	fn test_forwarding_records_trace_hop() {
		let buffer = RingBuffer::unbounded();
		let downstream: Arc<dyn Observer> = Arc::new(buffer.clone());
		let observer = FilteringObserver::new(downstream.clone(), Vec::new());

		let mut event = Event::new().traced();
		observer.observe(&mut event).unwrap();
		let trace = event.trace().unwrap();
		assert_eq!(trace.len(), 1);
		assert_eq!(trace[0].from, ObserverId::of(&observer));
		assert_eq!(trace[0].to, ObserverId::of(&*downstream));
	}

	#[test]
	fn test_level_resolution_walks_prefixes() {
		let gate = LevelGate::new();
		gate.set(Some("a.b"), LogLevel::Warn);

		assert_eq!(gate.resolve(Some("a.b.c")), LogLevel::Warn);
		assert_eq!(gate.resolve(Some("a.b")), LogLevel::Warn);
		assert_eq!(gate.resolve(Some("a")), LogLevel::Info);
		assert_eq!(gate.resolve(Some("x")), LogLevel::Info);
		assert_eq!(gate.resolve(None), LogLevel::Info);
		assert_eq!(gate.resolve(Some("")), LogLevel::Info);

		gate.set(None, LogLevel::Error);
		assert_eq!(gate.resolve(Some("x")), LogLevel::Error);
		gate.set(Some(""), LogLevel::Debug);
		assert_eq!(gate.resolve(None), LogLevel::Debug);

		gate.clear();
		assert_eq!(gate.resolve(Some("a.b.c")), LogLevel::Info);
		assert_eq!(gate.default_level(), LogLevel::Info);
	}

	#[test]
	fn test_set_by_name_rejects_unknown_levels() {
		let gate = LevelGate::new();
		assert_eq!(
			gate.set_by_name(Some("a"), "loud"),
			Err(LogError::InvalidLogLevel("loud".to_string()))
		);
		gate.set_by_name(Some("a"), "debug").unwrap();
		assert_eq!(gate.resolve(Some("a.z")), LogLevel::Debug);
	}

	#[test]
	fn test_gate_only_vetoes() {
		let gate = LevelGate::new();
		gate.set(Some("quiet"), LogLevel::Error);

		assert_eq!(gate.evaluate(&event("app", LogLevel::Info)), PredicateResult::Abstain);
		assert_eq!(gate.evaluate(&event("app", LogLevel::Debug)), PredicateResult::No);
		assert_eq!(gate.evaluate(&event("quiet.x", LogLevel::Warn)), PredicateResult::No);
		assert_eq!(gate.evaluate(&event("quiet.x", LogLevel::Critical)), PredicateResult::Abstain);
		assert_eq!(
			gate.evaluate(&Event::new().with(keys::LEVEL, LogLevel::Critical)),
			PredicateResult::No
		);
		assert_eq!(
			gate.evaluate(&Event::new().with(keys::NAMESPACE, "app")),
			PredicateResult::No
		);
	}

	proptest! {
		#[test]
		fn resolve_matches_closest_configured_prefix(
			segments in prop::collection::vec("[a-c]", 1..5),
			depth in 1usize..5,
		) {
			let gate = LevelGate::with_default(LogLevel::Debug);
			let depth = depth.min(segments.len());
			gate.set(Some(&segments[..depth].join(".")), LogLevel::Critical);

			prop_assert_eq!(gate.resolve(Some(&segments.join("."))), LogLevel::Critical);
			prop_assert_eq!(gate.resolve(Some("zzz")), LogLevel::Debug);
		}
	}
}
