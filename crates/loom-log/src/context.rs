// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The composition root: a publisher, its level gate and its beginner.

use std::io::Write;
use std::sync::{Arc, OnceLock};

use crate::beginner::LogBeginner;
use crate::config::{LoggingConfig, OutputFormat};
use crate::error::ContextError;
use crate::file::text_file_observer;
use crate::filter::{FilteringObserver, LevelGate, Predicate};
use crate::json::json_file_observer;
use crate::logger::Logger;
use crate::observer::Observer;
use crate::publisher::Publisher;

static GLOBAL: OnceLock<LogContext> = OnceLock::new();

/// A wired-up logging pipeline.
///
/// Loggers handed out by [`LogContext::logger`] pass through the level gate
/// before reaching the publisher. Until [`LogBeginner::begin_logging_to`] is
/// called on [`LogContext::beginner`], published events are buffered.
pub struct LogContext {
	publisher: Arc<Publisher>,
	level_gate: Arc<LevelGate>,
	gated: Arc<dyn Observer>,
	beginner: LogBeginner,
	config: LoggingConfig,
}

impl LogContext {
	/// A context with default settings; critical events are echoed to
	/// `error_stream` until logging begins.
	pub fn new(error_stream: Box<dyn Write + Send>) -> Self {
		Self::from_config(LoggingConfig::default(), error_stream)
	}

	pub fn from_config(config: LoggingConfig, error_stream: Box<dyn Write + Send>) -> Self {
		let publisher = Arc::new(Publisher::new());
		let level_gate = Arc::new(LevelGate::with_default(config.level));
		config.apply_levels(&level_gate);

		let gate: Arc<dyn Predicate> = level_gate.clone();
		let gated: Arc<dyn Observer> = Arc::new(FilteringObserver::new(publisher.clone(), [gate]));
		let beginner = LogBeginner::with_capacity(
			publisher.clone(),
			error_stream,
			config.buffer_capacity,
		);

		Self {
			publisher,
			level_gate,
			gated,
			beginner,
			config,
		}
	}

	pub fn publisher(&self) -> &Arc<Publisher> {
		&self.publisher
	}

	pub fn level_gate(&self) -> &Arc<LevelGate> {
		&self.level_gate
	}

	pub fn beginner(&self) -> &LogBeginner {
		&self.beginner
	}

	pub fn config(&self) -> &LoggingConfig {
		&self.config
	}

	/// A logger for `namespace` whose events are filtered by the level gate.
	pub fn logger(&self, namespace: &str) -> Logger {
		Logger::new(namespace, self.gated.clone())
	}

	/// The primary sink described by the configuration, writing to `writer`.
	pub fn primary_observer(&self, writer: Box<dyn Write + Send>) -> Arc<dyn Observer> {
		match self.config.output {
			OutputFormat::Text => Arc::new(text_file_observer(writer, self.config.time_format.clone())),
			OutputFormat::Json => Arc::new(json_file_observer(writer)),
		}
	}
}

impl Default for LogContext {
	fn default() -> Self {
		Self::new(Box::new(std::io::stderr()))
	}
}

/// Install the process-wide context. Fails if one is already installed.
pub fn install(context: LogContext) -> Result<&'static LogContext, ContextError> {
	GLOBAL
		.set(context)
		.map_err(|_| ContextError::AlreadyInstalled)?;
	GLOBAL.get().ok_or(ContextError::AlreadyInstalled)
}

/// The process-wide context, if one has been installed.
pub fn global() -> Option<&'static LogContext> {
	GLOBAL.get()
}
