// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Message template parsing.
//!
//! Templates use named substitution fields: `{name}`, `{name!r}`,
//! `{name:>8}`, `{name()}` (call the value before use), `{obj.attr}` and
//! `{obj[key]}`. `{{` and `}}` are literal braces.

use crate::error::FormatError;

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
	Literal(String),
	Field(FieldRef<'a>),
}

/// A substitution field as written in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef<'a> {
	/// Field expression, including any call marker and accessors.
	pub expr: &'a str,
	pub conversion: Option<char>,
	pub spec: &'a str,
}

impl FieldRef<'_> {
	/// Key under which the flattened value of this field is stored.
	pub fn flat_key(&self) -> String {
		flat_key(self.expr, self.conversion, self.spec)
	}
}

/// Compute the flattened-value key for a field, conversion and spec.
pub fn flat_key(expr: &str, conversion: Option<char>, spec: &str) -> String {
	let mut key = String::with_capacity(expr.len() + spec.len() + 3);
	key.push_str(expr);
	key.push('!');
	if let Some(c) = conversion {
		key.push(c);
	}
	key.push(':');
	key.push_str(spec);
	key
}

/// Parse a template into literal text and fields.
pub fn parse(template: &str) -> Result<Vec<Segment<'_>>, FormatError> {
	let mut segments = Vec::new();
	let mut literal = String::new();
	let mut chars = template.char_indices().peekable();

	while let Some((i, c)) = chars.next() {
		match c {
			'{' => {
				if matches!(chars.peek(), Some((_, '{'))) {
					chars.next();
					literal.push('{');
					continue;
				}
				let start = i + 1;
				let mut depth = 1;
				let mut end = None;
				for (j, c) in chars.by_ref() {
					match c {
						'{' => depth += 1,
						'}' => {
							depth -= 1;
							if depth == 0 {
								end = Some(j);
								break;
							}
						}
						_ => {}
					}
				}
				let end = end.ok_or_else(|| FormatError::template("single '{' encountered in template"))?;
				if !literal.is_empty() {
					segments.push(Segment::Literal(std::mem::take(&mut literal)));
				}
				segments.push(Segment::Field(parse_field(&template[start..end])?));
			}
			'}' => {
				if matches!(chars.peek(), Some((_, '}'))) {
					chars.next();
					literal.push('}');
				} else {
					return Err(FormatError::template("single '}' encountered in template"));
				}
			}
			c => literal.push(c),
		}
	}

	if !literal.is_empty() {
		segments.push(Segment::Literal(literal));
	}
	Ok(segments)
}

fn parse_field(field: &str) -> Result<FieldRef<'_>, FormatError> {
	let mut in_brackets = false;
	let mut name_end = field.len();
	for (i, c) in field.char_indices() {
		match c {
			'[' => in_brackets = true,
			']' => in_brackets = false,
			'!' | ':' if !in_brackets => {
				name_end = i;
				break;
			}
			_ => {}
		}
	}

	let expr = &field[..name_end];
	let rest = &field[name_end..];

	let (conversion, spec_part) = match rest.strip_prefix('!') {
		Some(after) => {
			let mut it = after.chars();
			let conversion = it.next().ok_or_else(|| {
				FormatError::template("end of field while looking for conversion specifier")
			})?;
			let remainder = it.as_str();
			if !remainder.is_empty() && !remainder.starts_with(':') {
				return Err(FormatError::template(
					"expected ':' after conversion specifier",
				));
			}
			(Some(conversion), remainder)
		}
		None => (None, rest),
	};

	let spec = spec_part.strip_prefix(':').unwrap_or(spec_part);
	if spec.contains('{') || spec.contains('}') {
		return Err(FormatError::template(
			"nested fields inside a format spec are not supported",
		));
	}

	Ok(FieldRef {
		expr,
		conversion,
		spec,
	})
}

/// A step applied after looking up a field's base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor<'a> {
	Attr(&'a str),
	Index(&'a str),
}

/// A parsed field expression such as `request().headers[host]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath<'a> {
	pub name: &'a str,
	/// The base value must be invoked before use.
	pub call: bool,
	pub accessors: Vec<Accessor<'a>>,
}

impl<'a> FieldPath<'a> {
	pub fn parse(expr: &'a str) -> Result<Self, FormatError> {
		let base_end = expr.find(&['.', '['][..]).unwrap_or(expr.len());
		let base = &expr[..base_end];
		let (name, call) = match base.strip_suffix("()") {
			Some(name) => (name, true),
			None => (base, false),
		};

		if name.is_empty() || name.chars().all(|c| c.is_ascii_digit()) {
			return Err(FormatError::Positional(expr.to_string()));
		}

		let mut accessors = Vec::new();
		let mut rest = &expr[base_end..];
		while !rest.is_empty() {
			if let Some(after) = rest.strip_prefix('.') {
				let end = after.find(&['.', '['][..]).unwrap_or(after.len());
				let attr = &after[..end];
				if attr.is_empty() {
					return Err(FormatError::template("empty attribute in field"));
				}
				accessors.push(Accessor::Attr(attr));
				rest = &after[end..];
			} else if let Some(after) = rest.strip_prefix('[') {
				let end = after
					.find(']')
					.ok_or_else(|| FormatError::template("missing ']' in field"))?;
				let key = &after[..end];
				if key.is_empty() {
					return Err(FormatError::template("empty index in field"));
				}
				accessors.push(Accessor::Index(key));
				rest = &after[end + 1..];
			} else {
				return Err(FormatError::template(
					"only '.' or '[' may follow ']' in field",
				));
			}
		}

		Ok(Self {
			name,
			call,
			accessors,
		})
	}
}
