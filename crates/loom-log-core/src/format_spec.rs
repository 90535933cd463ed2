// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The format-spec mini-language used after `:` in a template field.
//!
//! Grammar: `[[fill]align][sign][#][0][width][,|_][.precision][type]`.
//!
//! Integers accept `d`, `n`, `b`, `o`, `x`, `X` and `c`, plus the float codes
//! (the integer is widened). Floats accept `e`, `E`, `f`, `F`, `g`, `G` and
//! `%`. Text accepts only `s`. Numbers align right by default, text left.

use crate::error::FormatError;
use crate::value::Value;

/// Largest width or precision accepted. Keeps padding allocations small
/// and derived float precisions within what `fmt` supports.
pub const MAX_SPEC_NUMBER: usize = i16::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
	Left,
	Right,
	Center,
	/// Padding goes between the sign/prefix and the digits.
	AfterSign,
}

impl Align {
	fn from_char(c: char) -> Option<Self> {
		match c {
			'<' => Some(Align::Left),
			'>' => Some(Align::Right),
			'^' => Some(Align::Center),
			'=' => Some(Align::AfterSign),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
	Minus,
	Plus,
	Space,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormatSpec {
	fill: Option<char>,
	align: Option<Align>,
	sign: Option<Sign>,
	alternate: bool,
	zero: bool,
	width: Option<usize>,
	grouping: Option<char>,
	precision: Option<usize>,
	ty: Option<char>,
}

/// Render a value according to a format spec.
///
/// An empty spec renders the value's display text.
pub fn apply(value: &Value, spec: &str) -> Result<String, FormatError> {
	if spec.is_empty() {
		return Ok(value.to_text()?);
	}
	let parsed = FormatSpec::parse(spec)?;
	match value {
		Value::Int(i) => parsed.format_int(*i, spec),
		Value::Float(f) => parsed.format_float(*f, spec),
		other => parsed.format_text(&other.to_text()?, spec),
	}
}

impl FormatSpec {
	fn parse(spec: &str) -> Result<Self, FormatError> {
		let chars: Vec<char> = spec.chars().collect();
		let mut parsed = FormatSpec {
			fill: None,
			align: None,
			sign: None,
			alternate: false,
			zero: false,
			width: None,
			grouping: None,
			precision: None,
			ty: None,
		};
		let mut i = 0;

		if let Some(align) = chars.get(1).copied().and_then(Align::from_char) {
			parsed.fill = Some(chars[0]);
			parsed.align = Some(align);
			i = 2;
		} else if let Some(align) = chars.first().copied().and_then(Align::from_char) {
			parsed.align = Some(align);
			i = 1;
		}

		parsed.sign = match chars.get(i) {
			Some('+') => Some(Sign::Plus),
			Some('-') => Some(Sign::Minus),
			Some(' ') => Some(Sign::Space),
			_ => None,
		};
		if parsed.sign.is_some() {
			i += 1;
		}

		if chars.get(i) == Some(&'#') {
			parsed.alternate = true;
			i += 1;
		}
		if chars.get(i) == Some(&'0') {
			parsed.zero = true;
			i += 1;
		}

		let (width, next) = read_number(&chars, i, spec)?;
		parsed.width = width;
		i = next;

		if let Some(&c @ (',' | '_')) = chars.get(i) {
			parsed.grouping = Some(c);
			i += 1;
		}

		if chars.get(i) == Some(&'.') {
			let (precision, next) = read_number(&chars, i + 1, spec)?;
			if precision.is_none() {
				return Err(FormatError::invalid_spec(spec, "format specifier missing precision"));
			}
			parsed.precision = precision;
			i = next;
		}

		match &chars[i..] {
			[] => {}
			[ty] => parsed.ty = Some(*ty),
			_ => return Err(FormatError::invalid_spec(spec, "invalid format specifier")),
		}

		Ok(parsed)
	}

	fn format_text(&self, text: &str, spec: &str) -> Result<String, FormatError> {
		if let Some(code) = self.ty.filter(|c| *c != 's') {
			return Err(FormatError::UnknownFormatCode { code, kind: "str" });
		}
		if self.sign.is_some() {
			return Err(FormatError::invalid_spec(spec, "sign not allowed in string format specifier"));
		}
		if self.alternate {
			return Err(FormatError::invalid_spec(
				spec,
				"alternate form (#) not allowed in string format specifier",
			));
		}
		if self.grouping.is_some() {
			return Err(FormatError::invalid_spec(spec, "cannot specify grouping with strings"));
		}
		if self.align == Some(Align::AfterSign) {
			return Err(FormatError::invalid_spec(
				spec,
				"'=' alignment not allowed in string format specifier",
			));
		}

		let body: String = match self.precision {
			Some(p) => text.chars().take(p).collect(),
			None => text.to_string(),
		};
		Ok(self.pad("", &body, false))
	}

	fn format_int(&self, value: i64, spec: &str) -> Result<String, FormatError> {
		let ty = self.ty.unwrap_or('d');
		let radix = match ty {
			'd' | 'n' => 10,
			'b' => 2,
			'o' => 8,
			'x' | 'X' => 16,
			'c' => return self.format_char(value, spec),
			'e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%' => {
				return self.format_float(value as f64, spec);
			}
			code => return Err(FormatError::UnknownFormatCode { code, kind: "int" }),
		};
		if self.precision.is_some() {
			return Err(FormatError::invalid_spec(
				spec,
				"precision not allowed in integer format specifier",
			));
		}
		if self.grouping == Some(',') && radix != 10 {
			return Err(FormatError::invalid_spec(spec, format!("cannot specify ',' with '{ty}'")));
		}

		let magnitude = value.unsigned_abs();
		let digits = match ty {
			'b' => format!("{magnitude:b}"),
			'o' => format!("{magnitude:o}"),
			'x' => format!("{magnitude:x}"),
			'X' => format!("{magnitude:X}"),
			_ => magnitude.to_string(),
		};
		let digits = match self.grouping {
			Some(sep) => group_digits(&digits, sep, if radix == 10 { 3 } else { 4 }),
			None => digits,
		};
		let prefix = match (self.alternate, ty) {
			(true, 'b') => "0b",
			(true, 'o') => "0o",
			(true, 'x') => "0x",
			(true, 'X') => "0X",
			_ => "",
		};

		let lead = format!("{}{prefix}", self.sign_str(value < 0));
		Ok(self.pad(&lead, &digits, true))
	}

	fn format_char(&self, value: i64, spec: &str) -> Result<String, FormatError> {
		if self.sign.is_some() {
			return Err(FormatError::invalid_spec(spec, "sign not allowed with integer format specifier 'c'"));
		}
		let c = u32::try_from(value)
			.ok()
			.and_then(char::from_u32)
			.ok_or_else(|| FormatError::invalid_spec(spec, format!("%c arg not in range: {value}")))?;
		Ok(self.pad("", &c.to_string(), true))
	}

	fn format_float(&self, value: f64, spec: &str) -> Result<String, FormatError> {
		match self.ty {
			None | Some('e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%') => {}
			Some(code) => return Err(FormatError::UnknownFormatCode { code, kind: "float" }),
		}

		let negative = !value.is_nan() && value.is_sign_negative();
		let magnitude = value.abs();

		let mut body = if magnitude.is_nan() {
			"nan".to_string()
		} else if magnitude.is_infinite() {
			"inf".to_string()
		} else {
			match self.ty {
				Some('f' | 'F') => fixed(magnitude, self.precision.unwrap_or(6)),
				Some('e' | 'E') => exponent(magnitude, self.precision.unwrap_or(6)),
				Some('g' | 'G') => general(magnitude, self.precision.unwrap_or(6), self.alternate),
				Some('%') => fixed(magnitude * 100.0, self.precision.unwrap_or(6)),
				_ => match self.precision {
					Some(p) => {
						let mut text = general(magnitude, p, self.alternate);
						if !text.contains(&['.', 'e'][..]) {
							text.push_str(".0");
						}
						text
					}
					None => format!("{magnitude:?}"),
				},
			}
		};

		if let Some(sep) = self.grouping {
			let int_len = body
				.find(|c: char| !c.is_ascii_digit())
				.unwrap_or(body.len());
			body = format!("{}{}", group_digits(&body[..int_len], sep, 3), &body[int_len..]);
		}
		if self.ty == Some('%') {
			body.push('%');
		}
		if matches!(self.ty, Some('E' | 'F' | 'G')) {
			body = body.to_uppercase();
		}

		Ok(self.pad(self.sign_str(negative), &body, true))
	}

	fn sign_str(&self, negative: bool) -> &'static str {
		if negative {
			return "-";
		}
		match self.sign {
			Some(Sign::Plus) => "+",
			Some(Sign::Space) => " ",
			_ => "",
		}
	}

	fn pad(&self, lead: &str, body: &str, numeric: bool) -> String {
		let len = lead.chars().count() + body.chars().count();
		let width = self.width.unwrap_or(0);
		if len >= width {
			return format!("{lead}{body}");
		}

		let zero_fill = self.zero && self.fill.is_none();
		let fill = if zero_fill { '0' } else { self.fill.unwrap_or(' ') };
		let align = self.align.unwrap_or(match (numeric, zero_fill) {
			(true, true) => Align::AfterSign,
			(true, false) => Align::Right,
			(false, _) => Align::Left,
		});

		let padding = width - len;
		let fills = |n: usize| std::iter::repeat(fill).take(n).collect::<String>();
		match align {
			Align::Left => format!("{lead}{body}{}", fills(padding)),
			Align::Right => format!("{}{lead}{body}", fills(padding)),
			Align::Center => {
				let left = padding / 2;
				format!("{}{lead}{body}{}", fills(left), fills(padding - left))
			}
			Align::AfterSign => format!("{lead}{}{body}", fills(padding)),
		}
	}
}

fn read_number(chars: &[char], start: usize, spec: &str) -> Result<(Option<usize>, usize), FormatError> {
	let end = chars[start.min(chars.len())..]
		.iter()
		.position(|c| !c.is_ascii_digit())
		.map_or(chars.len(), |offset| start + offset);
	if end <= start {
		return Ok((None, start));
	}
	let digits: String = chars[start..end].iter().collect();
	match digits.parse::<usize>() {
		Ok(number) if number <= MAX_SPEC_NUMBER => Ok((Some(number), end)),
		_ => Err(FormatError::invalid_spec(spec, "too many decimal digits in format string")),
	}
}

fn group_digits(digits: &str, sep: char, size: usize) -> String {
	let mut out = String::with_capacity(digits.len() + digits.len() / size);
	for (i, c) in digits.chars().enumerate() {
		if i > 0 && (digits.len() - i) % size == 0 {
			out.push(sep);
		}
		out.push(c);
	}
	out
}

fn fixed(value: f64, precision: usize) -> String {
	format!("{value:.precision$}")
}

fn exponent(value: f64, precision: usize) -> String {
	signed_exponent(&format!("{value:.precision$e}"))
}

/// Rewrite `1.5e3` as `1.5e+03`.
fn signed_exponent(text: &str) -> String {
	match text.split_once('e') {
		Some((mantissa, exp)) => {
			let (sign, digits) = match exp.strip_prefix('-') {
				Some(digits) => ('-', digits),
				None => ('+', exp),
			};
			format!("{mantissa}e{sign}{digits:0>2}")
		}
		None => text.to_string(),
	}
}

fn general(value: f64, precision: usize, alternate: bool) -> String {
	let p = precision.max(1);
	let digits = p - 1;
	let scientific = format!("{value:.digits$e}");
	let exp: i64 = scientific
		.split_once('e')
		.and_then(|(_, e)| e.parse().ok())
		.unwrap_or(0);

	let text = if exp >= -4 && exp < p as i64 {
		fixed(value, (p as i64 - 1 - exp) as usize)
	} else {
		signed_exponent(&scientific)
	};
	if alternate {
		text
	} else {
		strip_trailing_zeros(&text)
	}
}

fn strip_trailing_zeros(text: &str) -> String {
	let (mantissa, exp) = text.split_at(text.find('e').unwrap_or(text.len()));
	let mantissa = if mantissa.contains('.') {
		mantissa.trim_end_matches('0').trim_end_matches('.')
	} else {
		mantissa
	};
	format!("{mantissa}{exp}")
}
