//! Printf-style formatting of data into attribute templates.
//!
//! Directives follow the familiar `%[argnum$][flags][width][.precision]conv`
//! shape:
//!
//! - flags: `-` (left-justify), `+` (always sign), `0` or space (padding),
//!   `'c` (pad with `c`)
//! - conversions: `s d u f F e E g G x X o b c` and `%%`
//!
//! [`evaluate`] is the entry point used by the engine: it picks the right
//! formatter for the datum's shape.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::value;

/// Largest accepted width or precision.
pub const MAX_FIELD_WIDTH: usize = 4096;

/// Formatting failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// A directive refers to an argument that was not supplied.
    #[error("argument {needed} requested but only {available} supplied")]
    TooFewArguments { needed: usize, available: usize },

    /// Unrecognized conversion character.
    #[error("unknown conversion '%{0}'")]
    UnknownConversion(char),

    /// Template ends in the middle of a directive.
    #[error("unterminated directive")]
    Unterminated,

    /// `%0$s` style argument number.
    #[error("argument numbers start at 1")]
    ZeroArgument,

    /// Width or precision above [`MAX_FIELD_WIDTH`].
    #[error("field size {digits} exceeds {limit}")]
    FieldTooLarge { digits: String, limit: usize },
}

/// Formats `datum` through `template`.
///
/// - temporal values use `template` as a strftime pattern
/// - lists supply positional arguments
/// - other non-false scalars supply a single argument
///
/// Maps, `false` and formatting failures yield `None`.
pub fn evaluate(template: &str, datum: &Value) -> Option<String> {
    if let Some(moment) = value::temporal(datum) {
        let formatted = value::format_temporal(&moment, template);
        if formatted.is_none() {
            warn!(template, "invalid date format pattern");
        }
        return formatted;
    }

    let result = match datum {
        Value::Array(items) => {
            let args: Vec<&Value> = items.iter().collect();
            sprintf(template, &args)
        }
        Value::String(_) | Value::Number(_) | Value::Bool(true) => sprintf(template, &[datum]),
        _ => return None,
    };
    match result {
        Ok(text) => Some(text),
        Err(err) => {
            warn!(%err, template, "formatting failed");
            None
        }
    }
}

/// Formats `args` according to `template`.
pub fn sprintf(template: &str, args: &[&Value]) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut next_arg = 0;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let (spec, consumed) = Spec::parse(&rest[pos + 1..])?;
        rest = &rest[pos + 1 + consumed..];

        if spec.conversion == '%' {
            out.push('%');
            continue;
        }
        let index = match spec.argnum {
            Some(0) => return Err(FormatError::ZeroArgument),
            Some(n) => n - 1,
            None => {
                next_arg += 1;
                next_arg - 1
            }
        };
        let arg = args.get(index).ok_or(FormatError::TooFewArguments {
            needed: index + 1,
            available: args.len(),
        })?;
        spec.render(arg, &mut out)?;
    }
    out.push_str(rest);
    Ok(out)
}

#[derive(Debug, Clone, PartialEq)]
struct Spec {
    argnum: Option<usize>,
    left: bool,
    plus: bool,
    pad: char,
    width: usize,
    precision: Option<usize>,
    conversion: char,
}

impl Spec {
    /// Parses a directive body (text after `%`). Returns the spec and the
    /// number of bytes consumed.
    fn parse(body: &str) -> Result<(Self, usize), FormatError> {
        let bytes = body.as_bytes();
        let mut spec = Spec {
            argnum: None,
            left: false,
            plus: false,
            pad: ' ',
            width: 0,
            precision: None,
            conversion: '%',
        };
        let mut i = 0;

        let digits = count_digits(bytes, 0);
        if digits > 0 && bytes.get(digits) == Some(&b'$') {
            spec.argnum = Some(body[..digits].parse().unwrap_or(usize::MAX));
            i = digits + 1;
        }

        loop {
            match bytes.get(i) {
                Some(b'-') => spec.left = true,
                Some(b'+') => spec.plus = true,
                Some(b'0') => spec.pad = '0',
                Some(b' ') => spec.pad = ' ',
                Some(b'\'') => {
                    let custom = body[i + 1..].chars().next().ok_or(FormatError::Unterminated)?;
                    spec.pad = custom;
                    i += 1 + custom.len_utf8();
                    continue;
                }
                _ => break,
            }
            i += 1;
        }

        let width_digits = count_digits(bytes, i);
        if width_digits > 0 {
            spec.width = field_size(&body[i..i + width_digits])?;
            i += width_digits;
        }

        if bytes.get(i) == Some(&b'.') {
            i += 1;
            let precision_digits = count_digits(bytes, i);
            spec.precision = Some(if precision_digits == 0 {
                0
            } else {
                field_size(&body[i..i + precision_digits])?
            });
            i += precision_digits;
        }

        let conversion = body[i..].chars().next().ok_or(FormatError::Unterminated)?;
        spec.conversion = conversion;
        Ok((spec, i + conversion.len_utf8()))
    }

    fn render(&self, arg: &Value, out: &mut String) -> Result<(), FormatError> {
        let (body, numeric) = match self.conversion {
            's' => {
                let text = text_of(arg);
                let text = match self.precision {
                    Some(p) => text.chars().take(p).collect(),
                    None => text,
                };
                (text, false)
            }
            'd' => {
                let n = int_of(arg);
                (self.signed(n.unsigned_abs().to_string(), n < 0), true)
            }
            'u' => (u64_of(arg).to_string(), true),
            'f' | 'F' => {
                let f = float_of(arg);
                let digits = format!("{:.*}", self.precision.unwrap_or(6), f.abs());
                (self.signed(digits, f.is_sign_negative() && f != 0.0), true)
            }
            'e' | 'E' => {
                let f = float_of(arg);
                let digits = exponential(f.abs(), self.precision.unwrap_or(6));
                let digits = if self.conversion == 'E' {
                    digits.to_uppercase()
                } else {
                    digits
                };
                (self.signed(digits, f.is_sign_negative() && f != 0.0), true)
            }
            'g' | 'G' => {
                let f = float_of(arg);
                let digits = general(f.abs(), self.precision.unwrap_or(6));
                let digits = if self.conversion == 'G' {
                    digits.to_uppercase()
                } else {
                    digits
                };
                (self.signed(digits, f.is_sign_negative() && f != 0.0), true)
            }
            'x' => (format!("{:x}", u64_of(arg)), true),
            'X' => (format!("{:X}", u64_of(arg)), true),
            'o' => (format!("{:o}", u64_of(arg)), true),
            'b' => (format!("{:b}", u64_of(arg)), true),
            'c' => {
                if let Some(c) = u32::try_from(int_of(arg)).ok().and_then(char::from_u32) {
                    out.push(c);
                }
                return Ok(());
            }
            other => return Err(FormatError::UnknownConversion(other)),
        };
        self.pad_into(&body, numeric, out);
        Ok(())
    }

    fn signed(&self, digits: String, negative: bool) -> String {
        if negative {
            format!("-{digits}")
        } else if self.plus {
            format!("+{digits}")
        } else {
            digits
        }
    }

    fn pad_into(&self, body: &str, numeric: bool, out: &mut String) {
        let len = body.chars().count();
        if len >= self.width {
            out.push_str(body);
            return;
        }
        let fill: String = std::iter::repeat(self.pad).take(self.width - len).collect();
        if self.left {
            out.push_str(body);
            out.push_str(&fill);
        } else if numeric && self.pad == '0' && body.starts_with(['-', '+']) {
            let (sign, digits) = body.split_at(1);
            out.push_str(sign);
            out.push_str(&fill);
            out.push_str(digits);
        } else {
            out.push_str(&fill);
            out.push_str(body);
        }
    }
}

fn field_size(digits: &str) -> Result<usize, FormatError> {
    digits
        .parse()
        .ok()
        .filter(|&size| size <= MAX_FIELD_WIDTH)
        .ok_or_else(|| FormatError::FieldTooLarge {
            digits: digits.to_string(),
            limit: MAX_FIELD_WIDTH,
        })
}

fn count_digits(bytes: &[u8], from: usize) -> usize {
    bytes
        .iter()
        .skip(from)
        .take_while(|b| b.is_ascii_digit())
        .count()
}

/// `1.5e+3` style exponent notation.
fn exponential(f: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, f);
    match raw.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => raw,
    }
}

/// Shortest of fixed or exponent notation with `precision` significant digits.
fn general(f: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if f == 0.0 {
        return "0".to_string();
    }
    let probe = format!("{:.*e}", precision - 1, f);
    let exponent: i64 = probe
        .split_once('e')
        .and_then(|(_, exp)| exp.parse().ok())
        .unwrap_or(0);

    if exponent < -4 || exponent >= precision as i64 {
        let formatted = exponential(f, precision - 1);
        match formatted.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{}", trim_fraction(mantissa), exp),
            None => formatted,
        }
    } else {
        let decimals = (precision as i64 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, f)).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

fn text_of(arg: &Value) -> String {
    match arg {
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => arg.to_string(),
        scalar => value::scalar_text(scalar).unwrap_or_default(),
    }
}

fn float_of(arg: &Value) -> f64 {
    match arg {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => value::leading_number(s),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::Array(items) => f64::from(u8::from(!items.is_empty())),
        Value::Object(map) => f64::from(u8::from(!map.is_empty())),
    }
}

fn int_of(arg: &Value) -> i64 {
    match arg {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| u as i64))
            .unwrap_or_else(|| n.as_f64().unwrap_or(0.0) as i64),
        other => float_of(other) as i64,
    }
}

fn u64_of(arg: &Value) -> u64 {
    match arg {
        Value::Number(n) => n.as_u64().unwrap_or_else(|| int_of(arg) as u64),
        other => int_of(other) as u64,
    }
}
