//! `console.log`-style logging.
//!
//! A log call takes a message and any number of loosely typed arguments,
//! resolves a tag from the caller, formats everything into text and hands
//! that text to every registered sink, split into lines short enough for
//! backends that truncate long ones.
//!
//! ```
//! use std::sync::Arc;
//!
//! use taglog::{Level, Logger, TracingSink};
//!
//! let log = Logger::builder()
//!     .with_level(Level::Debug)
//!     .with_auto_format(true)
//!     .build()
//!     .unwrap();
//! log.register_sink(Arc::new(TracingSink::new()));
//!
//! taglog::i!(log, "a", "b", 1, true, None::<&str>); // I/<module>: a\tb\t1\ttrue\tnull
//! taglog::d!(log, "number %d", 42);                 // D/<module>: number 42
//! taglog::v!(log, "dropped");                       // below the minimum level
//! ```
//!
//! Formatting rules, in order:
//!
//! * a trailing error argument ([`Value::error`]) is detached and its trace
//!   appended on the following lines;
//! * with auto-format on, a textual message containing `%` is a printf
//!   template for the remaining arguments (see [`printf`]); a template that
//!   does not fit its arguments falls back to the next rule;
//! * otherwise the message and the arguments are joined with tabs, absent
//!   values rendering as `null`.

mod config;
mod format;
mod level;
mod logging;
mod macros;
pub mod printf;
mod split;
mod tag;
mod value;

pub use config::{EnvConfig, COLOR_VAR, FORMAT_VAR, LEVEL_VAR, MAX_LINE_VAR};
pub use format::{collapse_tag, format};
pub use level::{Level, ParseLevelError};
pub use logging::{
    dispatch, global, Builder, ColorChoice, Config, ConsoleSink, DefaultFormatter, FileSink,
    FormatterConfig, LineFormatter, LogSink, Logger, Stream, TracingSink,
};
pub use split::{split, DELIMITERS, MAX_LINE_LENGTH};
pub use tag::{Caller, FixedTagProvider, ModuleTagProvider, TagProvider};
pub use value::{ErrorValue, Value};
