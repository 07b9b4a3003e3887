//! Leveled, structured logging for the skipdict drivers.
//!
//! A [`LogEntry`] carries a level, an optional component, a message and a
//! set of key/value fields. A [`Logger`] filters entries against a
//! [`LoggingConfig`] and hands the survivors to a [`LogSink`]: either a
//! [`WriterSink`] rendering lines to any `io::Write`, or a [`LogCollector`]
//! that keeps them in memory.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Log level for filtering, from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Whether a logger at this level lets a message at `level` through.
    pub fn should_log(&self, level: LogLevel) -> bool {
        level <= *self
    }

    fn label(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label().to_lowercase())
    }
}

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => bail!("unknown log level {other:?} (expected error, warn, info, debug or trace)"),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `<timestamp> INFO  [component] message key=value`
    #[default]
    Plain,
    /// One JSON object per line.
    Json,
    /// `I component: message key=value`
    Compact,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogFormat::Plain => "plain",
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
        };
        f.write_str(name)
    }
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => bail!("unknown log format {other:?} (expected plain, json or compact)"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level to output
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
    /// Prefix rendered lines with an RFC 3339 timestamp.
    #[serde(default = "default_true")]
    pub timestamps: bool,
    /// Per-component overrides of `level`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub component_levels: BTreeMap<String, LogLevel>,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Plain,
            timestamps: true,
            component_levels: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn with_component_level(mut self, component: impl Into<String>, level: LogLevel) -> Self {
        self.component_levels.insert(component.into(), level);
        self
    }

    /// The component's override if it has one, else the global level.
    pub fn effective_level(&self, component: Option<&str>) -> LogLevel {
        component
            .and_then(|comp| self.component_levels.get(comp).copied())
            .unwrap_or(self.level)
    }

    pub fn should_log(&self, level: LogLevel, component: Option<&str>) -> bool {
        self.effective_level(component).should_log(level)
    }
}

/// A log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            component: None,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_component(level: LogLevel, component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: Some(component.into()),
            ..Self::new(level, message)
        }
    }

    /// Attach a structured field. A repeated key keeps the last value.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Render as a single line, without the trailing newline.
    pub fn render(&self, format: LogFormat, timestamps: bool) -> Result<String> {
        match format {
            LogFormat::Json => {
                let mut value = serde_json::to_value(self).context("serialize log entry")?;
                if !timestamps && let Some(object) = value.as_object_mut() {
                    object.remove("timestamp");
                }
                serde_json::to_string(&value).context("serialize log entry")
            }
            LogFormat::Plain => {
                let mut line = String::new();
                if timestamps {
                    line.push_str(&self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true));
                    line.push(' ');
                }
                line.push_str(&format!("{:<5}", self.level.label()));
                if let Some(component) = &self.component {
                    line.push_str(&format!(" [{component}]"));
                }
                line.push(' ');
                line.push_str(&self.message);
                self.push_fields(&mut line);
                Ok(line)
            }
            LogFormat::Compact => {
                let mut line = String::new();
                if timestamps {
                    line.push_str(&self.timestamp.format("%H:%M:%S").to_string());
                    line.push(' ');
                }
                line.push_str(&self.level.label()[..1]);
                line.push(' ');
                if let Some(component) = &self.component {
                    line.push_str(component);
                    line.push_str(": ");
                }
                line.push_str(&self.message);
                self.push_fields(&mut line);
                Ok(line)
            }
        }
    }

    fn push_fields(&self, line: &mut String) {
        for (key, value) in &self.fields {
            match value {
                Value::String(s) => line.push_str(&format!(" {key}={s}")),
                other => line.push_str(&format!(" {key}={other}")),
            }
        }
    }
}

/// Destination for entries that passed the level filter.
pub trait LogSink {
    fn emit(&mut self, entry: &LogEntry, config: &LoggingConfig) -> Result<()>;
}

impl<S: LogSink + ?Sized> LogSink for &mut S {
    fn emit(&mut self, entry: &LogEntry, config: &LoggingConfig) -> Result<()> {
        (**self).emit(entry, config)
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn emit(&mut self, entry: &LogEntry, config: &LoggingConfig) -> Result<()> {
        (**self).emit(entry, config)
    }
}

/// Renders each entry as one line in the configured format.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> LogSink for WriterSink<W> {
    fn emit(&mut self, entry: &LogEntry, config: &LoggingConfig) -> Result<()> {
        let line = entry.render(config.format, config.timestamps)?;
        writeln!(self.writer, "{line}").context("write log line")?;
        self.writer.flush().context("flush log writer")
    }
}

/// Log collector for capturing log entries
#[derive(Debug, Default)]
pub struct LogCollector {
    entries: Vec<LogEntry>,
}

impl LogCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn filter_by_level(&self, level: LogLevel) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.level == level).collect()
    }

    pub fn filter_by_component(&self, component: &str) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|e| e.component.as_deref() == Some(component))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl LogSink for LogCollector {
    fn emit(&mut self, entry: &LogEntry, _config: &LoggingConfig) -> Result<()> {
        self.push(entry.clone());
        Ok(())
    }
}

/// Level-filtering front end over a [`LogSink`].
#[derive(Debug)]
pub struct Logger<S> {
    config: LoggingConfig,
    sink: S,
}

impl<S: LogSink> Logger<S> {
    pub fn new(config: LoggingConfig, sink: S) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn enabled(&self, level: LogLevel, component: Option<&str>) -> bool {
        self.config.should_log(level, component)
    }

    /// Emit `entry` if its level passes; returns whether it was emitted.
    pub fn log(&mut self, entry: LogEntry) -> Result<bool> {
        if !self.enabled(entry.level, entry.component.as_deref()) {
            return Ok(false);
        }
        self.sink.emit(&entry, &self.config)?;
        Ok(true)
    }
}

impl<W: Write> Logger<WriterSink<W>> {
    /// Logger rendering lines to `writer`.
    pub fn to_writer(config: LoggingConfig, writer: W) -> Self {
        Self::new(config, WriterSink::new(writer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).single().unwrap()
    }

    fn sample() -> LogEntry {
        LogEntry::with_component(LogLevel::Info, "stress", "round complete")
            .field("round", 2)
            .field("deleted", 1000)
            .field("phase", "reinsert")
            .at(fixed_time())
    }

    #[test]
    fn log_level_ordering() {
        assert!(LogLevel::Info.should_log(LogLevel::Info));
        assert!(LogLevel::Info.should_log(LogLevel::Warn));
        assert!(LogLevel::Info.should_log(LogLevel::Error));
        assert!(!LogLevel::Info.should_log(LogLevel::Debug));
        assert!(LogLevel::Trace.should_log(LogLevel::Debug));
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Trace.to_string(), "trace");
    }

    #[test]
    fn log_format_parses() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Plain);
        assert!(config.timestamps);
    }

    #[test]
    fn logging_config_component_levels() {
        let config = LoggingConfig::new()
            .with_level(LogLevel::Warn)
            .with_component_level("stress", LogLevel::Debug);

        assert!(!config.should_log(LogLevel::Info, None));
        assert!(!config.should_log(LogLevel::Info, Some("cli")));
        assert!(config.should_log(LogLevel::Debug, Some("stress")));
    }

    #[test]
    fn logging_config_deserializes_with_defaults() {
        let config: LoggingConfig = serde_json::from_str(r#"{"level":"debug"}"#).unwrap();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Plain);
        assert!(config.timestamps);
        assert!(config.component_levels.is_empty());
    }

    #[test]
    fn plain_rendering() {
        let line = sample().render(LogFormat::Plain, true).unwrap();
        assert_eq!(
            line,
            "2024-03-01T12:30:05.000Z INFO  [stress] round complete deleted=1000 phase=reinsert round=2"
        );
        let bare = sample().render(LogFormat::Plain, false).unwrap();
        assert!(bare.starts_with("INFO  [stress]"));
    }

    #[test]
    fn compact_rendering() {
        let line = sample().render(LogFormat::Compact, true).unwrap();
        assert_eq!(line, "12:30:05 I stress: round complete deleted=1000 phase=reinsert round=2");
    }

    #[test]
    fn json_rendering_snapshot() {
        let line = sample().render(LogFormat::Json, false).unwrap();
        let value: Value = serde_json::from_str(&line).unwrap();
        insta::assert_json_snapshot!(value, @r###"
        {
          "component": "stress",
          "fields": {
            "deleted": 1000,
            "phase": "reinsert",
            "round": 2
          },
          "level": "info",
          "message": "round complete"
        }
        "###);
    }

    #[test]
    fn json_rendering_keeps_timestamp_when_enabled() {
        let line = sample().render(LogFormat::Json, true).unwrap();
        let back: LogEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn logger_filters_before_sink() {
        let config = LoggingConfig::new().with_level(LogLevel::Info);
        let mut logger = Logger::new(config, LogCollector::new());

        assert!(logger.log(LogEntry::new(LogLevel::Info, "kept")).unwrap());
        assert!(!logger.log(LogEntry::new(LogLevel::Debug, "dropped")).unwrap());
        assert!(logger.log(LogEntry::new(LogLevel::Error, "kept too")).unwrap());

        let collector = logger.into_sink();
        assert_eq!(collector.entries().len(), 2);
        assert_eq!(collector.filter_by_level(LogLevel::Error).len(), 1);
    }

    #[test]
    fn writer_sink_writes_one_line_per_entry() {
        let config = LoggingConfig::new()
            .with_format(LogFormat::Compact)
            .with_timestamps(false);
        let mut logger = Logger::to_writer(config, Vec::new());
        logger.log(LogEntry::with_component(LogLevel::Warn, "cli", "first")).unwrap();
        logger.log(LogEntry::new(LogLevel::Info, "second").field("n", 3)).unwrap();

        let output = String::from_utf8(logger.into_sink().into_inner()).unwrap();
        assert_eq!(output, "W cli: first\nI second n=3\n");
    }

    #[test]
    fn log_collector_filters_by_component() {
        let mut collector = LogCollector::new();
        collector.push(LogEntry::with_component(LogLevel::Info, "stress", "a"));
        collector.push(LogEntry::with_component(LogLevel::Info, "cli", "b"));
        collector.push(LogEntry::new(LogLevel::Info, "c"));

        assert_eq!(collector.filter_by_component("stress").len(), 1);
        collector.clear();
        assert!(collector.entries().is_empty());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn strategy_level() -> impl Strategy<Value = LogLevel> {
            prop_oneof![
                Just(LogLevel::Error),
                Just(LogLevel::Warn),
                Just(LogLevel::Info),
                Just(LogLevel::Debug),
                Just(LogLevel::Trace),
            ]
        }

        proptest! {
            /// A more verbose threshold never drops what a stricter one keeps.
            #[test]
            fn prop_should_log_is_monotone(a in strategy_level(), b in strategy_level(), msg in strategy_level()) {
                let (strict, verbose) = if a <= b { (a, b) } else { (b, a) };
                if strict.should_log(msg) {
                    prop_assert!(verbose.should_log(msg));
                }
            }

            /// Rendered plain lines never contain a newline.
            #[test]
            fn prop_plain_is_single_line(msg in "[a-z ]{0,40}", n in any::<u32>()) {
                let entry = LogEntry::new(LogLevel::Info, msg).field("n", n);
                let line = entry.render(LogFormat::Plain, true).unwrap();
                prop_assert!(!line.contains('\n'));
            }
        }
    }
}
