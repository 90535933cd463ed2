// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Field values carried by events.
//!
//! A [`Value`] is either plain data, a live object rendered on demand through
//! [`LogValue`], or a [`Thunk`] that is only invoked when a template refers to
//! it with a call marker (`{name()}`).

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::{panic_message, ValueError};
use crate::level::LogLevel;

/// Map of named values, used for nested structures and flattened fields.
pub type ValueMap = BTreeMap<String, Value>;

/// A live object that can appear in an event.
///
/// Rendering may fail; a failure degrades the formatted message instead of
/// propagating to the emitter.
pub trait LogValue: Send + Sync {
	/// Human-readable text, used for plain `{field}` and `{field!s}`.
	fn display(&self) -> Result<String, ValueError>;

	/// Debug representation, used for `{field!r}`.
	fn repr(&self) -> Result<String, ValueError> {
		self.display()
	}

	/// Attribute lookup for `{field.name}` and `{field[name]}`.
	fn attribute(&self, _name: &str) -> Option<Value> {
		None
	}

	/// Plain-data form used when the event is persisted, if any.
	fn persistable(&self) -> Option<Value> {
		None
	}
}

/// Adapter exposing any `Display + Debug` type as a [`LogValue`].
struct DisplayValue<T>(T);

impl<T> LogValue for DisplayValue<T>
where
	T: fmt::Display + fmt::Debug + Send + Sync,
{
	fn display(&self) -> Result<String, ValueError> {
		Ok(self.0.to_string())
	}

	fn repr(&self) -> Result<String, ValueError> {
		Ok(format!("{:?}", self.0))
	}
}

type ThunkFn = dyn Fn() -> Result<Value, ValueError> + Send + Sync;

/// A deferred value, computed only when a template calls it.
#[derive(Clone)]
pub struct Thunk(Arc<ThunkFn>);

impl Thunk {
	pub fn new<F>(f: F) -> Self
	where
		F: Fn() -> Result<Value, ValueError> + Send + Sync + 'static,
	{
		Self(Arc::new(f))
	}

	/// Invoke the thunk.
	pub fn call(&self) -> Result<Value, ValueError> {
		(self.0)()
	}

	fn ptr_eq(&self, other: &Thunk) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for Thunk {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("<thunk>")
	}
}

/// A field value.
#[derive(Clone)]
pub enum Value {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(String),
	Bytes(Vec<u8>),
	List(Vec<Value>),
	Map(ValueMap),
	Level(LogLevel),
	Object(Arc<dyn LogValue>),
	Thunk(Thunk),
}

impl Value {
	/// Wrap a live object.
	pub fn object<T: LogValue + 'static>(value: T) -> Self {
		Self::Object(Arc::new(value))
	}

	/// Wrap any `Display + Debug` value as a live object.
	pub fn display<T>(value: T) -> Self
	where
		T: fmt::Display + fmt::Debug + Send + Sync + 'static,
	{
		Self::Object(Arc::new(DisplayValue(value)))
	}

	/// A deferred value that cannot fail.
	pub fn thunk<F, V>(f: F) -> Self
	where
		F: Fn() -> V + Send + Sync + 'static,
		V: Into<Value>,
	{
		Self::Thunk(Thunk::new(move || Ok(f().into())))
	}

	/// A deferred value that may fail when invoked.
	pub fn try_thunk<F>(f: F) -> Self
	where
		F: Fn() -> Result<Value, ValueError> + Send + Sync + 'static,
	{
		Self::Thunk(Thunk::new(f))
	}

	pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
		Self::Bytes(bytes.into())
	}

	/// Short name of the variant, used in diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "bool",
			Value::Int(_) => "int",
			Value::Float(_) => "float",
			Value::Str(_) => "str",
			Value::Bytes(_) => "bytes",
			Value::List(_) => "list",
			Value::Map(_) => "map",
			Value::Level(_) => "level",
			Value::Object(_) => "object",
			Value::Thunk(_) => "thunk",
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Value::Int(i) => Some(*i),
			_ => None,
		}
	}

	/// Numeric view; integers widen to floats.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Int(i) => Some(*i as f64),
			Value::Float(f) => Some(*f),
			_ => None,
		}
	}

	pub fn as_level(&self) -> Option<LogLevel> {
		match self {
			Value::Level(level) => Some(*level),
			_ => None,
		}
	}

	pub fn as_map(&self) -> Option<&ValueMap> {
		match self {
			Value::Map(map) => Some(map),
			_ => None,
		}
	}

	/// Human-readable text of the value.
	pub fn to_text(&self) -> Result<String, ValueError> {
		match self {
			Value::Str(s) => Ok(s.clone()),
			Value::Level(level) => Ok(level.as_str().to_string()),
			Value::Object(obj) => obj.display(),
			_ => self.to_repr(),
		}
	}

	/// Debug representation of the value.
	pub fn to_repr(&self) -> Result<String, ValueError> {
		match self {
			Value::Null => Ok("null".to_string()),
			Value::Bool(b) => Ok(b.to_string()),
			Value::Int(i) => Ok(i.to_string()),
			Value::Float(f) => Ok(format!("{f:?}")),
			Value::Str(s) => Ok(format!("{s:?}")),
			Value::Bytes(b) => Ok(format!("b\"{}\"", b.escape_ascii())),
			Value::List(items) => {
				let parts = items
					.iter()
					.map(Value::to_repr)
					.collect::<Result<Vec<_>, _>>()?;
				Ok(format!("[{}]", parts.join(", ")))
			}
			Value::Map(map) => {
				let parts = map
					.iter()
					.map(|(k, v)| Ok(format!("{k:?}: {}", v.to_repr()?)))
					.collect::<Result<Vec<_>, ValueError>>()?;
				Ok(format!("{{{}}}", parts.join(", ")))
			}
			Value::Level(level) => Ok(format!("LogLevel::{level:?}")),
			Value::Object(obj) => obj.repr(),
			Value::Thunk(_) => Ok("<thunk>".to_string()),
		}
	}

	/// Debug representation that never fails and never panics.
	pub fn safe_repr(&self) -> String {
		match catch_unwind(AssertUnwindSafe(|| self.to_repr())) {
			Ok(Ok(repr)) => repr,
			Ok(Err(err)) => format!("<unrepresentable {}: {err}>", self.kind()),
			Err(payload) => format!(
				"<unrepresentable {}: panicked: {}>",
				self.kind(),
				panic_message(payload.as_ref())
			),
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.safe_repr())
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Null, Value::Null) => true,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Int(a), Value::Int(b)) => a == b,
			(Value::Float(a), Value::Float(b)) => a == b,
			(Value::Str(a), Value::Str(b)) => a == b,
			(Value::Bytes(a), Value::Bytes(b)) => a == b,
			(Value::List(a), Value::List(b)) => a == b,
			(Value::Map(a), Value::Map(b)) => a == b,
			(Value::Level(a), Value::Level(b)) => a == b,
			(Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
			(Value::Thunk(a), Value::Thunk(b)) => a.ptr_eq(b),
			_ => false,
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Value::Int(value.into())
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Int(value)
	}
}

impl From<u32> for Value {
	fn from(value: u32) -> Self {
		Value::Int(value.into())
	}
}

impl From<u64> for Value {
	fn from(value: u64) -> Self {
		match i64::try_from(value) {
			Ok(i) => Value::Int(i),
			Err(_) => Value::Float(value as f64),
		}
	}
}

impl From<usize> for Value {
	fn from(value: usize) -> Self {
		Value::from(value as u64)
	}
}

impl From<f32> for Value {
	fn from(value: f32) -> Self {
		Value::Float(value.into())
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::Float(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::Str(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::Str(value)
	}
}

impl From<LogLevel> for Value {
	fn from(value: LogLevel) -> Self {
		Value::Level(value)
	}
}

impl From<ValueMap> for Value {
	fn from(value: ValueMap) -> Self {
		Value::Map(value)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(value: Vec<T>) -> Self {
		Value::List(value.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Value::Null, Into::into)
	}
}
