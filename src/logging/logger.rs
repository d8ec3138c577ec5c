use std::{
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use eyre::Context;

use super::{
    formatters::FormatterConfig,
    sinks::{ConsoleSink, FileSink, Stream, TracingSink},
    LogSink,
};
use crate::{
    config::EnvConfig,
    format::{collapse_tag, format},
    level::Level,
    split::{split, MAX_LINE_LENGTH},
    tag::{Caller, ModuleTagProvider, TagProvider},
    value::Value,
};

/// Settings every log call reads. Calls work on an immutable snapshot, so a
/// concurrent change is seen either entirely or not at all.
#[derive(Clone)]
pub struct Config {
    pub min_level: Level,
    pub auto_format: bool,
    pub max_line_length: usize,
    sinks: Vec<Arc<dyn LogSink>>,
    tag_provider: Arc<dyn TagProvider>,
}

impl Config {
    pub fn sinks(&self) -> &[Arc<dyn LogSink>] {
        &self.sinks
    }

    fn has_sink<S: LogSink + ?Sized>(&self, sink: &Arc<S>) -> bool {
        self.sinks.iter().any(|s| same_sink(s, sink))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_level: Level::Verbose,
            auto_format: false,
            max_line_length: MAX_LINE_LENGTH,
            sinks: vec![Arc::new(ConsoleSink::stdout())],
            tag_provider: Arc::new(ModuleTagProvider::new()),
        }
    }
}

fn same_sink<S: LogSink + ?Sized>(a: &Arc<dyn LogSink>, b: &Arc<S>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Formats log calls and hands the resulting segments to every registered
/// sink.
///
/// Cloning is cheap and every clone shares the same configuration, so one
/// logger can be passed around an application (or installed as the `log`
/// backend) and reconfigured from anywhere.
#[derive(Clone)]
pub struct Logger {
    config: Arc<RwLock<Arc<Config>>>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Logger {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Installs a clone of this logger as the backend of the `log` crate.
    pub fn init(&self) -> eyre::Result<()> {
        log::set_boxed_logger(Box::new(self.clone()))
            .context("Failed registering taglog as the log backend")?;
        log::set_max_level(log::LevelFilter::Trace);

        Ok(())
    }

    pub fn snapshot(&self) -> Arc<Config> {
        let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&config)
    }

    fn update(&self, change: impl FnOnce(&mut Config)) {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = Config::clone(&config);
        change(&mut next);
        *config = Arc::new(next);
    }

    pub fn set_min_level(&self, level: Level) {
        self.update(|c| c.min_level = level);
    }

    pub fn set_auto_format(&self, enabled: bool) {
        self.update(|c| c.auto_format = enabled);
    }

    pub fn set_max_line_length(&self, max: usize) {
        self.update(|c| c.max_line_length = max);
    }

    pub fn set_tag_provider(&self, provider: Arc<dyn TagProvider>) {
        self.update(|c| c.tag_provider = provider);
    }

    /// Adds a sink. Registering a sink that is already registered is a no-op.
    pub fn register_sink(&self, sink: Arc<dyn LogSink>) {
        self.update(|c| {
            if !c.has_sink(&sink) {
                c.sinks.push(sink);
            }
        });
    }

    /// Removes a sink. Unknown sinks are ignored.
    pub fn unregister_sink<S: LogSink + ?Sized>(&self, sink: &Arc<S>) {
        self.update(|c| c.sinks.retain(|s| !same_sink(s, sink)));
    }

    pub fn clear_sinks(&self) {
        self.update(|c| c.sinks.clear());
    }

    pub fn is_loggable(&self, level: Level) -> bool {
        level.passes(self.snapshot().min_level)
    }

    /// Logs `message` with `args` at `level`.
    ///
    /// The tag is the caller's explicit tag if it has one, otherwise whatever
    /// the tag provider derives. A message equal to that tag is treated as a
    /// redundant tag and dropped.
    pub fn log(&self, level: Level, caller: Caller<'_>, message: &Value, args: &[Value]) {
        let config = self.snapshot();
        if !level.passes(config.min_level) {
            return;
        }

        let tag = match caller.tag {
            Some(tag) => tag.to_string(),
            None => resolve_tag(config.tag_provider.as_ref(), &caller),
        };
        let (message, args) = collapse_tag(&tag, message, args);
        let text = format_quietly(config.auto_format, &message, args);

        dispatch(level, &tag, &text, &config.sinks, config.max_line_length);
    }

    pub fn log_tagged(&self, level: Level, tag: &str, message: &Value, args: &[Value]) {
        self.log(level, Caller::tagged(tag), message, args);
    }

    pub fn v(&self, caller: Caller<'_>, message: &Value, args: &[Value]) {
        self.log(Level::Verbose, caller, message, args);
    }

    pub fn d(&self, caller: Caller<'_>, message: &Value, args: &[Value]) {
        self.log(Level::Debug, caller, message, args);
    }

    pub fn i(&self, caller: Caller<'_>, message: &Value, args: &[Value]) {
        self.log(Level::Info, caller, message, args);
    }

    pub fn w(&self, caller: Caller<'_>, message: &Value, args: &[Value]) {
        self.log(Level::Warn, caller, message, args);
    }

    pub fn e(&self, caller: Caller<'_>, message: &Value, args: &[Value]) {
        self.log(Level::Error, caller, message, args);
    }

    pub fn flush(&self) {
        for sink in self.snapshot().sinks() {
            if panic::catch_unwind(AssertUnwindSafe(|| sink.flush())).is_err() {
                tracing::trace!(target: "taglog", "sink panicked while flushing");
            }
        }
    }
}

/// Splits `text` into segments of at most `max_line_length` chars and emits
/// each segment to every sink, once per sink.
pub fn dispatch(
    level: Level,
    tag: &str,
    text: &str,
    sinks: &[Arc<dyn LogSink>],
    max_line_length: usize,
) {
    if sinks.is_empty() {
        return;
    }

    for segment in split(text, max_line_length) {
        for sink in sinks {
            emit_quietly(sink.as_ref(), level, tag, segment);
        }
    }
}

/// Asks `provider` for a tag; a panicking provider yields an empty tag.
fn resolve_tag(provider: &dyn TagProvider, caller: &Caller<'_>) -> String {
    panic::catch_unwind(AssertUnwindSafe(|| provider.tag(caller))).unwrap_or_else(|_| {
        tracing::trace!(target: "taglog", module = caller.module_path, "tag provider panicked");
        String::new()
    })
}

fn format_quietly(auto_format: bool, message: &Value, args: &[Value]) -> String {
    match panic::catch_unwind(AssertUnwindSafe(|| format(auto_format, message, args))) {
        Ok(text) => text,
        Err(_) => {
            tracing::trace!(target: "taglog", "formatting panicked, joining arguments instead");
            format(false, message, args)
        }
    }
}

fn emit_quietly(sink: &dyn LogSink, level: Level, tag: &str, segment: &str) {
    match panic::catch_unwind(AssertUnwindSafe(|| sink.emit(level, tag, segment))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::trace!(target: "taglog", error = %err, "sink failed, segment dropped")
        }
        Err(_) => tracing::trace!(target: "taglog", "sink panicked, segment dropped"),
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.is_loggable(metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        let config = self.snapshot();
        let level = Level::from(record.level());
        if !level.passes(config.min_level) {
            return;
        }

        let tag = resolve_tag(config.tag_provider.as_ref(), &Caller::new(record.target()));
        let text = record.args().to_string();
        dispatch(level, &tag, &text, &config.sinks, config.max_line_length);
    }

    fn flush(&self) {
        Logger::flush(self)
    }
}

static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// The process-wide logger, built from the environment on first use.
pub fn global() -> &'static Logger {
    GLOBAL.get_or_init(|| {
        Builder::from_env().build().unwrap_or_else(|err| {
            tracing::warn!(target: "taglog", error = %err, "falling back to the default logger");
            Logger::default()
        })
    })
}

type SinkConstructor = Box<dyn Fn(&FormatterConfig) -> eyre::Result<Arc<dyn LogSink>>>;

pub struct Builder {
    level: Level,
    auto_format: bool,
    max_line_length: usize,
    constructors: Option<Vec<SinkConstructor>>,
    tag_provider: Arc<dyn TagProvider>,
    formatter_config: FormatterConfig,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            level: Level::Verbose,
            auto_format: false,
            max_line_length: MAX_LINE_LENGTH,
            constructors: None,
            tag_provider: Arc::new(ModuleTagProvider::new()),
            formatter_config: FormatterConfig::default(),
        }
    }

    /// Starts from `TAGLOG_*` environment variables.
    pub fn from_env() -> Self {
        Self::new().with_env(&EnvConfig::load())
    }

    pub fn with_env(self, env: &EnvConfig) -> Self {
        let mut builder = self;
        if let Some(level) = env.level {
            builder.level = level;
        }
        if let Some(auto_format) = env.auto_format {
            builder.auto_format = auto_format;
        }
        if let Some(max) = env.max_line_length {
            builder.max_line_length = max;
        }
        if let Some(color) = env.color {
            builder.formatter_config.color = color;
        }
        builder
    }

    pub fn with_level(self, level: Level) -> Self {
        Self { level, ..self }
    }

    pub fn with_auto_format(self, auto_format: bool) -> Self {
        Self {
            auto_format,
            ..self
        }
    }

    pub fn with_max_line_length(self, max_line_length: usize) -> Self {
        Self {
            max_line_length,
            ..self
        }
    }

    pub fn with_tag_provider(self, provider: impl TagProvider + 'static) -> Self {
        Self {
            tag_provider: Arc::new(provider),
            ..self
        }
    }

    pub fn with_formatter_config(self, formatter_config: FormatterConfig) -> Self {
        Self {
            formatter_config,
            ..self
        }
    }

    fn with_constructor(
        mut self,
        constructor: impl Fn(&FormatterConfig) -> eyre::Result<Arc<dyn LogSink>> + 'static,
    ) -> Self {
        self.constructors
            .get_or_insert_with(Vec::new)
            .push(Box::new(constructor));
        self
    }

    /// Builds a logger without any sink instead of the default console sink.
    pub fn without_sinks(self) -> Self {
        Self {
            constructors: Some(Vec::new()),
            ..self
        }
    }

    pub fn with_console_sink(self) -> Self {
        self.with_constructor(|config| Ok(Arc::new(ConsoleSink::new(Stream::Stdout, config))))
    }

    pub fn with_stderr_sink(self) -> Self {
        self.with_constructor(|config| Ok(Arc::new(ConsoleSink::new(Stream::Stderr, config))))
    }

    pub fn with_file_sink(self, path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        self.with_constructor(move |config| {
            let sink = FileSink::new(&path, config)?;
            Ok(Arc::new(sink))
        })
    }

    pub fn with_tracing_sink(self) -> Self {
        self.with_constructor(|_| Ok(Arc::new(TracingSink::new())))
    }

    pub fn with_sink(self, sink: Arc<dyn LogSink>) -> Self {
        self.with_constructor(move |_| Ok(Arc::clone(&sink)))
    }

    pub fn build(&self) -> eyre::Result<Logger> {
        let mut config = Config {
            min_level: self.level,
            auto_format: self.auto_format,
            max_line_length: self.max_line_length,
            sinks: Vec::new(),
            tag_provider: Arc::clone(&self.tag_provider),
        };

        match &self.constructors {
            None => config
                .sinks
                .push(Arc::new(ConsoleSink::new(Stream::Stdout, &self.formatter_config))),
            Some(constructors) => {
                for constructor in constructors {
                    let sink = constructor(&self.formatter_config)?;
                    if !config.has_sink(&sink) {
                        config.sinks.push(sink);
                    }
                }
            }
        }

        Ok(Logger::new(config))
    }
}
