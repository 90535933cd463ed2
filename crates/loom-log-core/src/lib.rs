// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for structured event logging.
//!
//! This crate holds the event data model and the text engine:
//!
//! - [`Event`]: an ordered map of named [`Value`]s with reserved `log_*` keys
//! - [`LogLevel`]: the ordered severity scale
//! - [`format_event`]: renders an event's message template, never failing
//! - [`flatten_event`]: pre-resolves template fields so an event can be
//!   persisted and rendered identically later
//!
//! The observer pipeline that moves events around lives in `loom-log`.

pub mod error;
pub mod event;
pub mod format;
pub mod format_spec;
pub mod level;
pub mod template;
pub mod time;
pub mod value;

pub use error::{FormatError, LogError, Result, ValueError};
pub use event::{keys, Event, ObserverId, TraceHop};
pub use format::{
	extract_field, flatten_event, format_event, format_event_as_classic_log_text,
	format_unformattable_event, render_event, Rendering,
};
pub use level::LogLevel;
pub use time::{format_time, now_timestamp, TimeFormat, TIME_FORMAT_RFC3339};
pub use value::{LogValue, Thunk, Value, ValueMap};
