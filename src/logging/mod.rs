mod formatters;
mod logger;
mod sinks;

pub use formatters::{ColorChoice, DefaultFormatter, FormatterConfig};
pub use logger::{dispatch, global, Builder, Config, Logger};
pub use sinks::{ConsoleSink, FileSink, Stream, TracingSink};

use crate::level::Level;

/// Renders one segment of a log line for a text-oriented sink.
pub trait LineFormatter: Sync + Send {
    fn format(&self, level: Level, tag: &str, text: &str) -> String;
}

/// A destination for log segments.
///
/// Errors and panics raised by `emit` never reach the logging caller; the
/// logger drops the segment for that sink and carries on.
pub trait LogSink: Sync + Send {
    fn emit(&self, level: Level, tag: &str, text: &str) -> eyre::Result<()>;

    fn flush(&self) {}
}
