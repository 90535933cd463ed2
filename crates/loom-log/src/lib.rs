// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Structured event logging for Loom.
//!
//! Call sites emit [`Event`]s through a [`Logger`]; a [`Publisher`] fans them
//! out to [`Observer`]s, optionally behind a [`FilteringObserver`] and the
//! namespace [`LevelGate`]. Until logging is configured, a [`LogBeginner`]
//! keeps events in a [`RingBuffer`] and replays them once real observers are
//! attached.
//!
//! This crate provides:
//! - [`Publisher`], [`FilteringObserver`], [`LevelGate`] - the pipeline
//! - [`RingBuffer`] - bounded event capture with replay and live tail
//! - [`LogBeginner`] - startup buffering and the switch to real targets
//! - [`FileObserver`], [`json_file_observer`] - text and JSON line sinks
//! - [`EventLayer`] - a tracing Layer feeding `tracing` events into a pipeline
//! - [`LogContext`] - a configured pipeline, optionally installed globally
//!
//! # Usage
//!
//! ```ignore
//! use loom_log::{config, LogContext};
//!
//! let config = config::load_config()?;
//! let context = LogContext::from_config(config, Box::new(std::io::stderr()));
//! let log = context.logger("app.http");
//! log.info("listening on {port}", [("port", 8080)]);
//!
//! let sink = context.primary_observer(Box::new(std::io::stdout()));
//! context.beginner().begin_logging_to([sink]);
//! ```

pub mod beginner;
pub mod buffer;
pub mod config;
pub mod context;
pub mod error;
pub mod file;
pub mod filter;
pub mod io;
pub mod json;
pub mod layer;
pub mod legacy;
pub mod logger;
pub mod observer;
pub mod publisher;

pub use beginner::LogBeginner;
pub use buffer::RingBuffer;
pub use config::{LoggingConfig, LoggingConfigLayer, OutputFormat};
pub use context::LogContext;
pub use error::{ConfigError, ContextError, ObserverError, Result};
pub use file::{text_file_observer, FileObserver};
pub use filter::{FilteringObserver, LevelGate, Predicate, PredicateResult};
pub use io::LoggingWriter;
pub use json::{event_as_json, event_from_json, events_from_json_lines, json_file_observer};
pub use layer::EventLayer;
pub use legacy::{LegacyLogger, LegacyObserverWrapper};
pub use logger::{Fields, Logger};
pub use observer::{observer_fn, Observer};
pub use publisher::Publisher;

pub use loom_log_core::{
	extract_field, flatten_event, format_event, format_event_as_classic_log_text, keys, Event,
	LogLevel, LogValue, TimeFormat, Value, ValueError,
};
