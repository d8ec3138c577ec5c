//! The dynamically typed values a log call carries.
//!
//! A log call accepts a message and any number of arguments of mixed types,
//! some of which may be absent (`Null`) and the last of which may be an error.
//! [`Value`] keeps enough of the original type around for printf templates to
//! type-check their conversions, and renders everything else as text.

use std::{
    backtrace::{Backtrace, BacktraceStatus},
    borrow::Cow,
    fmt,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Textual value. Only textual messages are candidates for templating.
    Str(String),
    /// Pre-rendered value of some non-textual type.
    Other(String),
    Error(ErrorValue),
}

impl Value {
    /// Captures any error as a value that renders with its trace when it is
    /// the trailing argument of a call.
    pub fn error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Value::Error(ErrorValue::new(err))
    }

    pub fn report(report: &eyre::Report) -> Self {
        Value::Error(ErrorValue::from_report(report))
    }

    /// Renders any `Display` value up front. The result is not textual, so it
    /// never acts as a template.
    pub fn display<T: fmt::Display + ?Sized>(value: &T) -> Self {
        Value::Other(value.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::UInt(u) => write!(f, "{u}"),
            Value::Float(x) => fmt_float(*x, f),
            Value::Str(s) | Value::Other(s) => f.write_str(s),
            Value::Error(e) => write!(f, "{}", e.headline()),
        }
    }
}

// Whole numbers keep their fractional digit ("1.0"), infinities are spelled out.
fn fmt_float(x: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if x.is_infinite() {
        f.write_str(if x > 0.0 { "Infinity" } else { "-Infinity" })
    } else if x.is_nan() {
        f.write_str("NaN")
    } else {
        write!(f, "{x:?}")
    }
}

/// An error captured at the log call site.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    type_name: String,
    message: String,
    causes: Vec<String>,
    backtrace: Option<String>,
}

impl ErrorValue {
    pub fn new<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        Self {
            type_name: short_type_name(std::any::type_name::<E>()).to_string(),
            message: err.to_string(),
            causes,
            backtrace: capture_backtrace(),
        }
    }

    pub fn from_report(report: &eyre::Report) -> Self {
        Self {
            type_name: "Report".to_string(),
            message: report.to_string(),
            causes: report.chain().skip(1).map(|e| e.to_string()).collect(),
            backtrace: capture_backtrace(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    /// `"Type: message"`, or just the type when the message is empty.
    pub fn headline(&self) -> String {
        if self.message.is_empty() {
            self.type_name.clone()
        } else {
            format!("{}: {}", self.type_name, self.message)
        }
    }

    /// Headline, one `Caused by:` line per source, then the backtrace when one
    /// was captured.
    pub fn trace(&self) -> String {
        let mut out = self.headline();
        for cause in &self.causes {
            out.push_str("\nCaused by: ");
            out.push_str(cause);
        }
        if let Some(backtrace) = &self.backtrace {
            out.push('\n');
            out.push_str(backtrace.trim_end());
        }
        out
    }
}

fn capture_backtrace() -> Option<String> {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    }
}

/// `std::io::error::Error` becomes `Error`, `Box<dyn Error>` becomes `Box`.
fn short_type_name(full: &str) -> &str {
    let head = full.split('<').next().unwrap_or(full);
    head.rsplit("::").next().unwrap_or(head)
}

macro_rules! value_from {
    ($variant:ident: $($ty:ty),+ => $conv:expr) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant($conv(v))
                }
            }
        )+
    };
}

value_from!(Int: i8, i16, i32, i64, isize => |v| v as i64);
value_from!(UInt: u8, u16, u32, u64, usize => |v| v as u64);
value_from!(Float: f32, f64 => |v| v as f64);
value_from!(Bool: bool => |v| v);
value_from!(Char: char => |v| v);
value_from!(Str: &str, String, &String => |v: _| String::from(v));

impl<'a> From<Cow<'a, str>> for Value {
    fn from(v: Cow<'a, str>) -> Self {
        Value::Str(v.into_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[derive(Debug)]
    struct Exception(&'static str, Option<Box<Exception>>);

    impl fmt::Display for Exception {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for Exception {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            self.1.as_deref().map(|e| e as _)
        }
    }

    #[test]
    fn renders_scalars() {
        assert_eq!(Value::from(1).to_string(), "1");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(None::<&str>).to_string(), "null");
        assert_eq!(Value::from(1.0).to_string(), "1.0");
        assert_eq!(Value::from(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::from('x').to_string(), "x");
        assert_eq!(Value::display(&std::net::Ipv4Addr::LOCALHOST).to_string(), "127.0.0.1");
    }

    #[test]
    fn only_strings_are_textual() {
        assert_eq!(Value::from("a%d").as_text(), Some("a%d"));
        assert_eq!(Value::display("a%d").as_text(), None);
        assert_eq!(Value::from(42).as_text(), None);
    }

    #[test]
    fn error_headline_uses_short_type_name() {
        let value = Value::error(&Exception("foo", None));
        assert_eq!(value.to_string(), "Exception: foo");
    }

    #[test]
    fn error_trace_lists_causes() {
        let err = Exception("outer", Some(Box::new(Exception("inner", None))));
        let value = ErrorValue::new(&err);
        assert_eq!(value.causes(), ["inner".to_string()]);
        assert!(value.trace().starts_with("Exception: outer\nCaused by: inner"));
    }

    #[test]
    fn report_chain_becomes_causes() {
        let report = eyre::eyre!("root").wrap_err("context");
        let value = ErrorValue::from_report(&report);
        assert_eq!(value.headline(), "Report: context");
        assert_eq!(value.causes(), ["root".to_string()]);
    }

    #[test]
    fn short_type_names() {
        assert_eq!(short_type_name("std::io::error::Error"), "Error");
        assert_eq!(short_type_name("alloc::boxed::Box<dyn core::error::Error>"), "Box");
        assert_eq!(short_type_name("Plain"), "Plain");
    }
}
