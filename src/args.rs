use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use taglog::{ColorChoice, Level, Value};

#[derive(Parser, Debug)]
#[command(version, long_version = "")]
#[command(
    about = "Write tagged, console.log-style lines to stdout, stderr, a file or tracing.",
    long_about = None
)]
pub struct Args {
    #[arg(
        short,
        long,
        default_value_t = Level::Info,
        help = "Priority of the logged lines: v, d, i, w or e.",
        display_order = 0
    )]
    pub priority: Level,

    #[arg(
        short,
        long,
        help = "Drop lines below this priority. Overrides TAGLOG_LEVEL.",
        display_order = 0
    )]
    pub min_level: Option<Level>,

    #[arg(short, long, default_value = "taglog", display_order = 0)]
    pub tag: String,

    #[arg(
        short = 'f',
        long = "format",
        help = "Treat a message containing '%' as a printf template for the arguments.",
        display_order = 1
    )]
    pub auto_format: bool,

    #[arg(long, value_name = "CHARS", help = "Split lines longer than this.", display_order = 1)]
    pub max_line: Option<usize>,

    #[arg(
        long = "sink",
        value_enum,
        help = "Where lines go. Repeat for several sinks; defaults to console.",
        display_order = 2
    )]
    pub sinks: Vec<SinkKind>,

    #[arg(long, help = "Log file used by the file sink. Implies --sink file.", display_order = 2)]
    pub file: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FMT",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "%Y-%m-%d %H:%M:%S",
        help = "Prefix lines with a local timestamp, optionally in the given chrono format.",
        display_order = 3
    )]
    pub timestamp: Option<String>,

    #[arg(long, value_enum, display_order = 3)]
    pub color: Option<ColorChoice>,

    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        help = "Write diagnostics about taglog itself to stderr.",
        display_order = 999
    )]
    pub verbose: u8,

    #[arg(index = 1, help = "Message to log. Reads one message per line from stdin when omitted.")]
    pub message: Option<String>,

    #[arg(
        index = 2,
        allow_negative_numbers = true,
        help = "Arguments joined to, or formatted into, the message."
    )]
    pub args: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkKind {
    Console,
    Stderr,
    Tracing,
    File,
}

impl Args {
    /// Requested sinks, deduplicated, with `--file` adding the file sink.
    pub fn sink_kinds(&self) -> Vec<SinkKind> {
        let mut kinds: Vec<SinkKind> = Vec::new();
        for kind in &self.sinks {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        if self.file.is_some() && !kinds.contains(&SinkKind::File) {
            kinds.push(SinkKind::File);
        }
        kinds
    }

    pub fn values(&self) -> Vec<Value> {
        self.args.iter().map(|arg| parse_value(arg)).collect()
    }
}

/// Reads a command line argument as the most specific value it spells.
pub fn parse_value(raw: &str) -> Value {
    match raw {
        "null" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(int) = raw.parse::<i64>() {
        return Value::Int(int);
    }

    // "inf" and "nan" stay text.
    if raw.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(float) = raw.parse::<f64>() {
            return Value::Float(float);
        }
    }

    Value::from(raw)
}
