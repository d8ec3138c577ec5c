use std::{
    fs::File,
    io::{IsTerminal, LineWriter, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use eyre::Context;

use super::{formatters::FormatterConfig, DefaultFormatter, LineFormatter, LogSink};
use crate::level::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    pub fn is_terminal(self) -> bool {
        match self {
            Stream::Stdout => std::io::stdout().is_terminal(),
            Stream::Stderr => std::io::stderr().is_terminal(),
        }
    }
}

/// Writes one formatted line per segment to stdout or stderr.
pub struct ConsoleSink {
    stream: Stream,
    formatter: Box<dyn LineFormatter>,
}

impl ConsoleSink {
    pub fn new(stream: Stream, config: &FormatterConfig) -> Self {
        let formatter = DefaultFormatter::new(config, stream.is_terminal());
        Self::with_formatter(stream, Box::new(formatter))
    }

    pub fn with_formatter(stream: Stream, formatter: Box<dyn LineFormatter>) -> Self {
        Self { stream, formatter }
    }

    pub fn stdout() -> Self {
        Self::new(Stream::Stdout, &FormatterConfig::default())
    }

    pub fn stderr() -> Self {
        Self::new(Stream::Stderr, &FormatterConfig::default())
    }
}

impl LogSink for ConsoleSink {
    fn emit(&self, level: Level, tag: &str, text: &str) -> eyre::Result<()> {
        let line = self.formatter.format(level, tag, text);
        match self.stream {
            Stream::Stdout => {
                let mut writer = std::io::stdout().lock();
                writeln!(writer, "{line}")?;
                writer.flush().context("Can't flush stdout")
            }
            Stream::Stderr => {
                let mut writer = std::io::stderr().lock();
                writeln!(writer, "{line}")?;
                writer.flush().context("Can't flush stderr")
            }
        }
    }

    fn flush(&self) {
        let result = match self.stream {
            Stream::Stdout => std::io::stdout().flush(),
            Stream::Stderr => std::io::stderr().flush(),
        };
        if let Err(err) = result {
            tracing::trace!(target: "taglog", error = %err, stream = ?self.stream, "flush failed");
        }
    }
}

/// Appends formatted lines to a file.
///
/// With a maximum size set, a file that has grown past it is moved aside to
/// `<path>.old` (or `<path>.old1`, `<path>.old2`, ... when taken) before the
/// next line is written, and a fresh file is started.
pub struct FileSink {
    file: Mutex<LineWriter<File>>,
    file_path: PathBuf,
    formatter: Box<dyn LineFormatter>,
    max_file_size: Option<u64>,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>, config: &FormatterConfig) -> eyre::Result<Self> {
        let formatter = DefaultFormatter::new(config, false);
        Self::with_formatter(path, Box::new(formatter))
    }

    pub fn with_formatter(
        path: impl AsRef<Path>,
        formatter: Box<dyn LineFormatter>,
    ) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = open_append(path)?;

        Ok(Self {
            file: Mutex::new(LineWriter::new(file)),
            file_path: path.to_path_buf(),
            formatter,
            max_file_size: None,
        })
    }

    pub fn with_max_file_size(self, bytes: u64) -> Self {
        Self {
            max_file_size: Some(bytes),
            ..self
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn rotate_if_exceeds_max_file_size(&self, file: &mut LineWriter<File>) -> eyre::Result<()> {
        let Some(max) = self.max_file_size else {
            return Ok(());
        };

        let md = file.get_ref().metadata().context("Can't stat log file")?;
        if md.len() <= max {
            return Ok(());
        }

        file.flush().context("Can't flush log file before rotating")?;

        let path = self.file_path.display().to_string();
        let mut new_path = format!("{path}.old");
        let mut counter = 1;
        while Path::new(&new_path).exists() {
            new_path = format!("{path}.old{counter}");
            counter += 1;
        }

        std::fs::rename(&self.file_path, &new_path)
            .with_context(|| format!("Failed rotating log file {path} to {new_path}"))?;
        *file = LineWriter::new(open_append(&self.file_path)?);

        Ok(())
    }
}

fn open_append(path: &Path) -> eyre::Result<File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed opening or creating log file {}", path.display()))
}

impl LogSink for FileSink {
    fn emit(&self, level: Level, tag: &str, text: &str) -> eyre::Result<()> {
        let mut file = self.file.lock().map_err(|e| eyre::eyre!(e.to_string()))?;
        self.rotate_if_exceeds_max_file_size(&mut file)?;

        writeln!(file, "{}", self.formatter.format(level, tag, text))?;
        file.flush().context("Can't flush file")
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            if let Err(err) = file.flush() {
                tracing::trace!(
                    target: "taglog",
                    error = %err,
                    path = %self.file_path.display(),
                    "flush failed"
                );
            }
        }
    }
}

/// Hands segments to the `tracing` dispatcher, which plays the role of the
/// platform log: whatever subscriber the host installed decides where lines
/// go. Events use target `taglog::sink` and carry the tag as a field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

macro_rules! tracing_event {
    ($level:expr, $tag:expr, $text:expr) => {
        match $level {
            Level::Verbose => tracing::trace!(target: "taglog::sink", tag = $tag, "{}", $text),
            Level::Debug => tracing::debug!(target: "taglog::sink", tag = $tag, "{}", $text),
            Level::Info => tracing::info!(target: "taglog::sink", tag = $tag, "{}", $text),
            Level::Warn => tracing::warn!(target: "taglog::sink", tag = $tag, "{}", $text),
            Level::Error => tracing::error!(target: "taglog::sink", tag = $tag, "{}", $text),
        }
    };
}

impl LogSink for TracingSink {
    fn emit(&self, level: Level, tag: &str, text: &str) -> eyre::Result<()> {
        tracing_event!(level, tag, text);
        Ok(())
    }
}
