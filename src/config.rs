use clap::ValueEnum;

use crate::{level::Level, logging::ColorChoice};

pub const LEVEL_VAR: &str = "TAGLOG_LEVEL";
pub const FORMAT_VAR: &str = "TAGLOG_FORMAT";
pub const MAX_LINE_VAR: &str = "TAGLOG_MAX_LINE";
pub const COLOR_VAR: &str = "TAGLOG_COLOR";

/// Logger settings taken from the environment. Unset or unparseable
/// variables leave the corresponding setting alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub level: Option<Level>,
    pub auto_format: Option<bool>,
    pub max_line_length: Option<usize>,
    pub color: Option<ColorChoice>,
}

impl EnvConfig {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            level: parse_var(&lookup, LEVEL_VAR, |v| v.parse().ok()),
            auto_format: parse_var(&lookup, FORMAT_VAR, parse_bool),
            max_line_length: parse_var(&lookup, MAX_LINE_VAR, |v| v.trim().parse().ok()),
            color: parse_var(&lookup, COLOR_VAR, |v| ColorChoice::from_str(v.trim(), true).ok()),
        }
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = lookup(key)?;
    let parsed = parse(&raw);
    if parsed.is_none() {
        tracing::debug!(
            target: "taglog",
            key,
            value = %raw,
            "ignoring unparseable environment value"
        );
    }
    parsed
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use std::collections::HashMap;

    use super::*;

    fn from(vars: &[(&str, &str)]) -> EnvConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_changes_nothing() {
        assert_eq!(from(&[]), EnvConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = from(&[
            (LEVEL_VAR, "warn"),
            (FORMAT_VAR, "yes"),
            (MAX_LINE_VAR, " 120 "),
            (COLOR_VAR, "Never"),
        ]);
        assert_eq!(config.level, Some(Level::Warn));
        assert_eq!(config.auto_format, Some(true));
        assert_eq!(config.max_line_length, Some(120));
        assert_eq!(config.color, Some(ColorChoice::Never));
    }

    #[test]
    fn garbage_is_ignored() {
        let config = from(&[
            (LEVEL_VAR, "loud"),
            (FORMAT_VAR, "maybe"),
            (MAX_LINE_VAR, "-1"),
            (COLOR_VAR, "rainbow"),
        ]);
        assert_eq!(config, EnvConfig::default());
    }
}
