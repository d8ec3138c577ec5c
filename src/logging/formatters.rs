use std::fmt::Write;

use yansi::Paint;

use super::LineFormatter;
use crate::level::Level;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Colour when writing to a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn use_ansi(self, is_terminal: bool) -> bool {
        match self {
            ColorChoice::Auto => is_terminal,
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatterConfig {
    /// `chrono` format string for a timestamp prefix; no prefix when unset.
    pub datetime_format: Option<String>,
    pub color: ColorChoice,
}

/// Renders `"D/tag: text"`, optionally prefixed by `[timestamp] `.
pub struct DefaultFormatter {
    datetime_format: Option<String>,
    use_ansi: bool,
}

impl DefaultFormatter {
    pub fn new(config: &FormatterConfig, is_terminal: bool) -> Self {
        Self {
            datetime_format: config.datetime_format.clone(),
            use_ansi: config.color.use_ansi(is_terminal),
        }
    }

    fn timestamp(&self, out: &mut String) {
        let Some(format) = &self.datetime_format else {
            return;
        };

        let mut time = String::new();
        // chrono reports a bad format string as a fmt::Error
        if write!(time, "{}", chrono::Local::now().format(format)).is_err() {
            return;
        }

        let stamp = format!("[{time}]");
        if self.use_ansi {
            let _ = write!(out, "{} ", stamp.bright_black());
        } else {
            let _ = write!(out, "{stamp} ");
        }
    }

    fn format_level(&self, level: Level, out: &mut String) {
        let letter = level.letter();
        if !self.use_ansi {
            out.push_str(letter);
            return;
        }

        let _ = match level {
            Level::Error => write!(out, "{}", letter.red().bold()),
            Level::Warn => write!(out, "{}", letter.yellow().bold()),
            Level::Info => write!(out, "{}", letter.green()),
            Level::Debug => write!(out, "{}", letter.blue()),
            Level::Verbose => write!(out, "{}", letter.white()),
        };
    }
}

impl LineFormatter for DefaultFormatter {
    fn format(&self, level: Level, tag: &str, text: &str) -> String {
        let mut out = String::with_capacity(tag.len() + text.len() + 8);
        self.timestamp(&mut out);
        self.format_level(level, &mut out);
        out.push('/');
        out.push_str(tag);
        out.push_str(": ");
        out.push_str(text);
        out
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn plain() -> DefaultFormatter {
        DefaultFormatter::new(&FormatterConfig::default(), false)
    }

    #[test]
    fn renders_letter_tag_and_text() {
        assert_eq!(plain().format(Level::Debug, "Net", "hello"), "D/Net: hello");
        assert_eq!(plain().format(Level::Error, "", ""), "E/: ");
    }

    #[test]
    fn timestamp_prefix() {
        let config = FormatterConfig {
            datetime_format: Some("%Y".to_string()),
            color: ColorChoice::Never,
        };
        let line = DefaultFormatter::new(&config, true).format(Level::Info, "T", "x");
        let year = chrono::Local::now().format("%Y").to_string();
        assert_eq!(line, format!("[{year}] I/T: x"));
    }

    #[test]
    fn colour_only_when_asked() {
        let config = FormatterConfig {
            color: ColorChoice::Always,
            ..Default::default()
        };
        let line = DefaultFormatter::new(&config, false).format(Level::Warn, "T", "x");
        assert!(line.contains("\x1b["), "{line:?}");
        assert!(line.ends_with("/T: x"));

        let formatter = DefaultFormatter::new(&FormatterConfig::default(), false);
        let line = formatter.format(Level::Warn, "T", "x");
        assert_eq!(line, "W/T: x");
    }

    #[test]
    fn colour_choice_resolution() {
        assert!(ColorChoice::Auto.use_ansi(true));
        assert!(!ColorChoice::Auto.use_ansi(false));
        assert!(ColorChoice::Always.use_ansi(false));
        assert!(!ColorChoice::Never.use_ansi(true));
    }
}
