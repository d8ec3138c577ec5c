//! Runtime printf-style templates.
//!
//! `format!` only works with literals known at compile time, while a log call
//! decides at runtime whether its message is a template. This module
//! interprets the familiar mini-language against a slice of [`Value`]s:
//!
//! ```text
//! %[index$ | <][flags][width][.precision]conversion
//! ```
//!
//! Conversions are type-checked: `%d` wants an integer, `%f` wants a float,
//! and a mismatch is an [`Error`] rather than a best-effort rendering. Extra
//! arguments are ignored. A null argument renders as `null` for every
//! conversion except `%b`, where it is `false`.

use std::iter;

use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("format specifier '{0}' has no matching argument")]
    MissingArgument(String),
    #[error("unknown format conversion '{0}'")]
    UnknownConversion(String),
    #[error("conversion '{conversion}' cannot format {found} argument")]
    IllegalConversion { conversion: char, found: &'static str },
    #[error("precision is not allowed for conversion '{0}'")]
    IllegalPrecision(char),
    #[error("width is not allowed for conversion '{0}'")]
    IllegalWidth(char),
    #[error("flag '{flag}' is not allowed for conversion '{conversion}'")]
    IllegalFlag { flag: char, conversion: char },
    #[error("format specifier '{0}' needs a width")]
    MissingWidth(String),
    #[error("code point {0} is not a valid character")]
    IllegalCodePoint(i128),
    #[error("malformed format specifier '{0}'")]
    Malformed(String),
    #[error("width or precision of '{0}' exceeds 65535")]
    FieldTooLarge(String),
}

/// Largest width or precision a specifier may ask for.
pub const MAX_FIELD: usize = u16::MAX as usize;

const CONVERSIONS: &str = "bBsScCdoxXeEfgGn%";

/// Applies `args` to `template`.
pub fn sprintf(template: &str, args: &[Value]) -> Result<String, Error> {
    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut cursor = Cursor::new(args);
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let spec = Spec::parse(&rest[pos..])?;
        rest = &rest[pos + spec.text.len()..];
        spec.validate()?;
        spec.render(&mut cursor, &mut out)?;
    }
    out.push_str(rest);

    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgIndex {
    Next,
    Explicit(usize),
    Previous,
}

#[derive(Debug, Default, Clone, Copy)]
struct Flags {
    left: bool,
    alternate: bool,
    plus: bool,
    space: bool,
    zero: bool,
    group: bool,
    parens: bool,
}

impl Flags {
    fn set(&self) -> impl Iterator<Item = char> {
        [
            ('-', self.left),
            ('#', self.alternate),
            ('+', self.plus),
            (' ', self.space),
            ('0', self.zero),
            (',', self.group),
            ('(', self.parens),
        ]
        .into_iter()
        .filter_map(|(flag, on)| on.then_some(flag))
    }
}

#[derive(Debug)]
struct Spec<'t> {
    text: &'t str,
    index: ArgIndex,
    flags: Flags,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: char,
}

struct Cursor<'a> {
    values: &'a [Value],
    next: usize,
    last: Option<usize>,
}

impl<'a> Cursor<'a> {
    fn new(values: &'a [Value]) -> Self {
        Self {
            values,
            next: 0,
            last: None,
        }
    }

    fn take(&mut self, spec: &Spec<'_>) -> Result<&'a Value, Error> {
        let missing = || Error::MissingArgument(spec.text.to_string());
        let index = match spec.index {
            ArgIndex::Next => {
                self.next += 1;
                self.next - 1
            }
            ArgIndex::Explicit(n) => n - 1,
            ArgIndex::Previous => self.last.ok_or_else(missing)?,
        };
        let value = self.values.get(index).ok_or_else(missing)?;
        self.last = Some(index);
        Ok(value)
    }
}

fn digits_at(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    i
}

impl<'t> Spec<'t> {
    /// Parses the specifier at the start of `s`, which begins with `%`.
    fn parse(s: &'t str) -> Result<Self, Error> {
        let bytes = s.as_bytes();
        let malformed = |end: usize| {
            let mut end = end.min(s.len());
            while !s.is_char_boundary(end) {
                end += 1;
            }
            Error::Malformed(s[..end].to_string())
        };
        let number = |from: usize, to: usize| -> Result<usize, Error> {
            s[from..to].parse().map_err(|_| malformed(to))
        };

        let mut i = 1;
        let mut index = ArgIndex::Next;

        let end = digits_at(bytes, i);
        if end > i && bytes.get(end) == Some(&b'$') {
            let n = number(i, end)?;
            if n == 0 {
                return Err(malformed(end + 1));
            }
            index = ArgIndex::Explicit(n);
            i = end + 1;
        }

        let mut flags = Flags::default();
        while let Some(&b) = bytes.get(i) {
            let slot = match b {
                b'-' => &mut flags.left,
                b'#' => &mut flags.alternate,
                b'+' => &mut flags.plus,
                b' ' => &mut flags.space,
                b'0' => &mut flags.zero,
                b',' => &mut flags.group,
                b'(' => &mut flags.parens,
                b'<' => {
                    index = ArgIndex::Previous;
                    i += 1;
                    continue;
                }
                _ => break,
            };
            if *slot {
                return Err(malformed(i + 1));
            }
            *slot = true;
            i += 1;
        }

        let end = digits_at(bytes, i);
        let width = if end > i { Some(number(i, end)?) } else { None };
        i = end;

        let mut precision = None;
        if bytes.get(i) == Some(&b'.') {
            let end = digits_at(bytes, i + 1);
            if end == i + 1 {
                return Err(malformed(end + 1));
            }
            precision = Some(number(i + 1, end)?);
            i = end;
        }

        let conversion = s[i..]
            .chars()
            .next()
            .ok_or_else(|| Error::UnknownConversion("%".to_string()))?;

        Ok(Self {
            text: &s[..i + conversion.len_utf8()],
            index,
            flags,
            width,
            precision,
            conversion,
        })
    }

    fn validate(&self) -> Result<(), Error> {
        if !CONVERSIONS.contains(self.conversion) {
            return Err(Error::UnknownConversion(self.conversion.to_string()));
        }

        let flags = self.flags;
        if (flags.left || flags.zero) && self.width.is_none() {
            return Err(Error::MissingWidth(self.text.to_string()));
        }
        if (flags.left && flags.zero) || (flags.plus && flags.space) {
            return Err(Error::Malformed(self.text.to_string()));
        }

        let (allowed, takes_precision) = match self.conversion.to_ascii_lowercase() {
            'b' | 's' => ("-", true),
            'c' => ("-", false),
            'd' => ("-+ 0,(", false),
            'o' | 'x' => ("-#0", false),
            'e' => ("-#+ 0(", true),
            'f' => ("-#+ 0,(", true),
            'g' => ("-+ 0,(", true),
            '%' => ("-", false),
            _ => ("", false),
        };

        if let Some(flag) = flags.set().find(|f| !allowed.contains(*f)) {
            return Err(Error::IllegalFlag {
                flag,
                conversion: self.conversion,
            });
        }
        if self.precision.is_some() && !takes_precision {
            return Err(Error::IllegalPrecision(self.conversion));
        }
        if self.conversion == 'n' && self.width.is_some() {
            return Err(Error::IllegalWidth('n'));
        }
        if self.width.max(self.precision).is_some_and(|n| n > MAX_FIELD) {
            return Err(Error::FieldTooLarge(self.text.to_string()));
        }

        Ok(())
    }

    fn render(&self, cursor: &mut Cursor<'_>, out: &mut String) -> Result<(), Error> {
        let text = match self.conversion {
            '%' => "%".to_string(),
            'n' => "\n".to_string(),
            _ => self.convert(cursor.take(self)?)?,
        };

        let text = if self.conversion.is_ascii_uppercase() {
            text.to_uppercase()
        } else {
            text
        };

        let pad = self
            .width
            .unwrap_or(0)
            .saturating_sub(text.chars().count());
        if self.flags.left {
            out.push_str(&text);
            out.extend(iter::repeat(' ').take(pad));
        } else {
            out.extend(iter::repeat(' ').take(pad));
            out.push_str(&text);
        }

        Ok(())
    }

    fn convert(&self, value: &Value) -> Result<String, Error> {
        let conversion = self.conversion.to_ascii_lowercase();
        match (conversion, value) {
            ('b', _) => {
                let b = match value {
                    Value::Null => false,
                    Value::Bool(b) => *b,
                    _ => true,
                };
                Ok(self.truncate(b.to_string()))
            }
            ('s', _) => Ok(self.truncate(value.to_string())),
            (_, Value::Null) => Ok("null".to_string()),
            ('c', Value::Char(c)) => Ok(c.to_string()),
            ('c', Value::Int(i)) => code_point(i128::from(*i)),
            ('c', Value::UInt(u)) => code_point(i128::from(*u)),
            ('d', Value::Int(i)) => Ok(self.signed(i.unsigned_abs().to_string(), *i < 0, true)),
            ('d', Value::UInt(u)) => Ok(self.signed(u.to_string(), false, true)),
            ('o' | 'x', Value::Int(i)) => Ok(self.radix(*i as u64, conversion)),
            ('o' | 'x', Value::UInt(u)) => Ok(self.radix(*u, conversion)),
            ('e' | 'f' | 'g', Value::Float(x)) => Ok(self.float(*x, conversion)),
            _ => Err(Error::IllegalConversion {
                conversion: self.conversion,
                found: kind(value),
            }),
        }
    }

    fn truncate(&self, text: String) -> String {
        match self.precision {
            Some(p) => text.chars().take(p).collect(),
            None => text,
        }
    }

    fn radix(&self, bits: u64, conversion: char) -> String {
        let (prefix, digits) = match conversion {
            'o' => ("0", format!("{bits:o}")),
            _ => ("0x", format!("{bits:x}")),
        };
        let prefix = if self.flags.alternate { prefix } else { "" };
        self.zero_pad(prefix, digits, "")
    }

    fn float(&self, x: f64, conversion: char) -> String {
        if x.is_nan() {
            return "NaN".to_string();
        }
        if x.is_infinite() {
            return self.signed("Infinity".to_string(), x < 0.0, false);
        }

        let ax = x.abs();
        let body = match conversion {
            'e' => scientific(ax, self.precision.unwrap_or(6)),
            'f' => {
                let precision = self.precision.unwrap_or(6);
                let mut body = format!("{ax:.precision$}");
                if self.flags.alternate && precision == 0 {
                    body.push('.');
                }
                body
            }
            _ => general(ax, self.precision.unwrap_or(6)),
        };

        self.signed(body, x.is_sign_negative(), true)
    }

    fn signed(&self, digits: String, negative: bool, zero_pad: bool) -> String {
        let digits = if self.flags.group {
            group(&digits)
        } else {
            digits
        };

        let (prefix, suffix) = match (negative, self.flags) {
            (true, Flags { parens: true, .. }) => ("(", ")"),
            (true, _) => ("-", ""),
            (false, Flags { plus: true, .. }) => ("+", ""),
            (false, Flags { space: true, .. }) => (" ", ""),
            _ => ("", ""),
        };

        if zero_pad {
            self.zero_pad(prefix, digits, suffix)
        } else {
            format!("{prefix}{digits}{suffix}")
        }
    }

    fn zero_pad(&self, prefix: &str, body: String, suffix: &str) -> String {
        let mut out = String::from(prefix);
        if let (true, Some(width)) = (self.flags.zero, self.width) {
            let used = prefix.len() + body.chars().count() + suffix.len();
            out.extend(iter::repeat('0').take(width.saturating_sub(used)));
        }
        out.push_str(&body);
        out.push_str(suffix);
        out
    }
}

fn code_point(n: i128) -> Result<String, Error> {
    u32::try_from(n)
        .ok()
        .and_then(char::from_u32)
        .map(String::from)
        .ok_or(Error::IllegalCodePoint(n))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Char(_) => "char",
        Value::Int(_) | Value::UInt(_) => "integer",
        Value::Float(_) => "floating-point",
        Value::Str(_) => "string",
        Value::Other(_) => "object",
        Value::Error(_) => "error",
    }
}

/// `d.dddddde+xx`, exponent signed and at least two digits wide.
fn scientific(x: f64, precision: usize) -> String {
    let raw = format!("{x:.precision$e}");
    let (mantissa, exponent) = raw.split_once('e').unwrap_or((&raw, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
}

/// Fixed notation when the rounded magnitude is in `[1e-4, 10^precision)`,
/// scientific otherwise. `precision` counts significant digits.
fn general(x: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if x == 0.0 {
        return format!("{:.*}", precision - 1, x);
    }

    let rounded = format!("{:.*e}", precision - 1, x);
    let exponent: i64 = rounded
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    let significant = precision as i64;
    if (-4..significant).contains(&exponent) {
        let decimals = (significant - 1 - exponent).max(0) as usize;
        format!("{x:.decimals$}")
    } else {
        scientific(x, precision - 1)
    }
}

/// Inserts thousands separators into the integral part of `digits`.
fn group(digits: &str) -> String {
    let split = digits.find('.').unwrap_or(digits.len());
    let (int, frac) = digits.split_at(split);
    if !int.bytes().all(|b| b.is_ascii_digit()) {
        return digits.to_string();
    }

    let mut out = String::with_capacity(digits.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.push_str(frac);
    out
}
