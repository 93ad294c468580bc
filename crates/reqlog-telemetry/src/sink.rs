//! Structured record sinks.
//!
//! # Design
//! - A sink receives a level plus a flat payload and owns everything else: envelope fields,
//!   level filtering, and delivery.
//! - [`JsonLineSink`] writes one self-describing JSON object per line to any `MakeWriter`.
//! - [`TracingSink`] forwards records into an existing `tracing` pipeline instead.
//! - Sinks never fail the caller; delivery problems are reported as diagnostics and dropped.

use std::fmt::{self, Display, Formatter};
use std::io::{self, Write};
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing_subscriber::fmt::MakeWriter;

use crate::error::{Result, TelemetryError};

/// Flat key/value payload handed to a sink.
pub type Payload = Map<String, Value>;

/// Version of the envelope layout written by [`JsonLineSink`].
pub const LOG_SCHEMA_VERSION: u8 = 0;

/// `tracing` target used by [`TracingSink`].
pub const RECORD_TARGET: &str = "reqlog::record";

/// Severity of a log record, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Very detailed tracing output.
    Trace,
    /// Debugging output.
    Debug,
    /// Regular operational records.
    Info,
    /// Something unexpected that did not stop the request.
    Warn,
    /// A failed request or operation.
    Error,
    /// The process is about to stop.
    Fatal,
}

impl LogLevel {
    /// Numeric level written into the envelope.
    #[must_use]
    pub const fn as_number(self) -> u8 {
        match self {
            Self::Trace => 10,
            Self::Debug => 20,
            Self::Info => 30,
            Self::Warn => 40,
            Self::Error => 50,
            Self::Fatal => 60,
        }
    }

    /// Lower-case level name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = TelemetryError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" | "10" => Ok(Self::Trace),
            "debug" | "20" => Ok(Self::Debug),
            "info" | "30" => Ok(Self::Info),
            "warn" | "warning" | "40" => Ok(Self::Warn),
            "error" | "50" => Ok(Self::Error),
            "fatal" | "60" => Ok(Self::Fatal),
            _ => Err(TelemetryError::UnknownLevel {
                value: value.to_string(),
            }),
        }
    }
}

/// One record as handed to a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Severity of the record.
    pub level: LogLevel,
    /// Free-text message; empty for request/response/error records.
    pub msg: String,
    /// Structured payload fields.
    pub payload: Payload,
}

impl LogRecord {
    /// Build a record without a message.
    #[must_use]
    pub const fn new(level: LogLevel, payload: Payload) -> Self {
        Self {
            level,
            msg: String::new(),
            payload,
        }
    }

    /// Attach a free-text message.
    #[must_use]
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = msg.into();
        self
    }
}

/// Destination for structured records.
pub trait LogSink: Send + Sync {
    /// Whether records at `level` would be delivered.
    fn enabled(&self, _level: LogLevel) -> bool {
        true
    }

    /// Deliver a record unconditionally.
    fn emit(&self, record: LogRecord);

    /// Deliver a record if its level is enabled.
    fn log(&self, record: LogRecord) {
        if self.enabled(record.level) {
            self.emit(record);
        }
    }

    /// Log `payload` at info level.
    fn info(&self, payload: Payload) {
        self.log(LogRecord::new(LogLevel::Info, payload));
    }

    /// Log `payload` at error level.
    fn error(&self, payload: Payload) {
        self.log(LogRecord::new(LogLevel::Error, payload));
    }
}

/// Fields attached to every record written by [`JsonLineSink`].
#[derive(Debug, Clone)]
pub struct Envelope {
    name: String,
    hostname: String,
    pid: u32,
}

impl Envelope {
    /// Capture the envelope for the current process.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hostname: local_hostname(),
            pid: std::process::id(),
        }
    }

    /// Wrap a record's payload in the envelope. Envelope keys win over payload keys.
    #[must_use]
    pub fn wrap(&self, record: &LogRecord, time: DateTime<Utc>) -> Payload {
        let mut entry = Payload::new();
        entry.insert("name".to_string(), Value::from(self.name.as_str()));
        entry.insert("hostname".to_string(), Value::from(self.hostname.as_str()));
        entry.insert("pid".to_string(), Value::from(self.pid));
        entry.insert("level".to_string(), Value::from(record.level.as_number()));
        entry.insert("msg".to_string(), Value::from(record.msg.as_str()));
        entry.insert(
            "time".to_string(),
            Value::from(time.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        entry.insert("v".to_string(), Value::from(LOG_SCHEMA_VERSION));
        for (key, value) in &record.payload {
            entry
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        entry
    }
}

fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_default()
}

/// Sink writing newline-delimited JSON records.
pub struct JsonLineSink<W = fn() -> io::Stdout> {
    envelope: Envelope,
    level: LogLevel,
    writer: W,
}

impl JsonLineSink {
    /// Sink writing to standard output.
    #[must_use]
    pub fn stdout(name: impl Into<String>, level: LogLevel) -> Self {
        Self::with_writer(name, level, io::stdout as fn() -> io::Stdout)
    }
}

impl<W> JsonLineSink<W>
where
    W: for<'w> MakeWriter<'w> + Send + Sync,
{
    /// Sink writing to an arbitrary writer factory.
    pub fn with_writer(name: impl Into<String>, level: LogLevel, writer: W) -> Self {
        Self {
            envelope: Envelope::new(name),
            level,
            writer,
        }
    }

    fn write_record(&self, record: &LogRecord) -> Result<()> {
        let entry = self.envelope.wrap(record, Utc::now());
        let mut line =
            serde_json::to_vec(&entry).map_err(|source| TelemetryError::RecordSerialize { source })?;
        line.push(b'\n');
        let mut writer = self.writer.make_writer();
        writer
            .write_all(&line)
            .and_then(|()| writer.flush())
            .map_err(|source| TelemetryError::RecordWrite { source })
    }
}

impl<W> LogSink for JsonLineSink<W>
where
    W: for<'w> MakeWriter<'w> + Send + Sync,
{
    fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    fn emit(&self, record: LogRecord) {
        if let Err(err) = self.write_record(&record) {
            tracing::warn!(error = %err, level = %record.level, "dropping log record");
        }
    }
}

/// Sink forwarding records as `tracing` events under [`RECORD_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Trace => tracing::enabled!(target: RECORD_TARGET, tracing::Level::TRACE),
            LogLevel::Debug => tracing::enabled!(target: RECORD_TARGET, tracing::Level::DEBUG),
            LogLevel::Info => tracing::enabled!(target: RECORD_TARGET, tracing::Level::INFO),
            LogLevel::Warn => tracing::enabled!(target: RECORD_TARGET, tracing::Level::WARN),
            LogLevel::Error | LogLevel::Fatal => {
                tracing::enabled!(target: RECORD_TARGET, tracing::Level::ERROR)
            }
        }
    }

    fn emit(&self, record: LogRecord) {
        let payload = Value::Object(record.payload);
        let msg = record.msg;
        match record.level {
            LogLevel::Trace => tracing::trace!(target: RECORD_TARGET, %payload, "{msg}"),
            LogLevel::Debug => tracing::debug!(target: RECORD_TARGET, %payload, "{msg}"),
            LogLevel::Info => tracing::info!(target: RECORD_TARGET, %payload, "{msg}"),
            LogLevel::Warn => tracing::warn!(target: RECORD_TARGET, %payload, "{msg}"),
            LogLevel::Error | LogLevel::Fatal => {
                tracing::error!(target: RECORD_TARGET, %payload, "{msg}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn text(&self) -> anyhow::Result<String> {
            let bytes = self
                .0
                .lock()
                .map_err(|_| anyhow::anyhow!("buffer lock poisoned"))?
                .clone();
            Ok(String::from_utf8(bytes)?)
        }

        fn lines(&self) -> anyhow::Result<Vec<Value>> {
            self.text()?
                .lines()
                .map(|line| serde_json::from_str(line).map_err(Into::into))
                .collect()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .map_err(|_| io::Error::other("buffer lock poisoned"))?
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for SharedBuffer {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => Payload::new(),
        }
    }

    #[test]
    fn log_level_parses_names_and_numbers() -> anyhow::Result<()> {
        assert_eq!("info".parse::<LogLevel>()?, LogLevel::Info);
        assert_eq!("WARNING".parse::<LogLevel>()?, LogLevel::Warn);
        assert_eq!("60".parse::<LogLevel>()?, LogLevel::Fatal);
        assert!(matches!(
            "loud".parse::<LogLevel>(),
            Err(TelemetryError::UnknownLevel { .. })
        ));
        assert!(LogLevel::Error > LogLevel::Info);
        assert_eq!(LogLevel::Debug.as_number(), 20);
        Ok(())
    }

    #[test]
    fn json_line_sink_writes_envelope_and_payload_only() -> anyhow::Result<()> {
        let buffer = SharedBuffer::default();
        let sink = JsonLineSink::with_writer("demo app", LogLevel::Info, buffer.clone());
        sink.info(payload(json!({"req": {"url": "/"}})));

        let lines = buffer.lines()?;
        assert_eq!(lines.len(), 1);
        let entry = lines[0]
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("expected object"))?;
        let mut keys: Vec<&str> = entry.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["hostname", "level", "msg", "name", "pid", "req", "time", "v"]
        );
        assert_eq!(entry["name"], json!("demo app"));
        assert_eq!(entry["level"], json!(30));
        assert_eq!(entry["msg"], json!(""));
        assert_eq!(entry["v"], json!(0));
        assert_eq!(entry["pid"], json!(std::process::id()));
        assert_eq!(entry["req"], json!({"url": "/"}));
        Ok(())
    }

    #[test]
    fn json_line_sink_filters_below_threshold() -> anyhow::Result<()> {
        let buffer = SharedBuffer::default();
        let sink = JsonLineSink::with_writer("demo", LogLevel::Warn, buffer.clone());
        sink.info(payload(json!({"res": {}})));
        sink.error(payload(json!({"err": {}})));
        sink.log(LogRecord::new(LogLevel::Info, Payload::new()).with_msg("skipped"));

        let lines = buffer.lines()?;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], json!(50));
        assert!(lines[0].get("err").is_some());
        Ok(())
    }

    #[test]
    fn envelope_keys_take_precedence_over_payload() {
        let envelope = Envelope::new("app");
        let record = LogRecord::new(LogLevel::Info, payload(json!({"name": "x", "msg": "y"})))
            .with_msg("hello");
        let entry = envelope.wrap(&record, Utc::now());
        assert_eq!(entry["name"], json!("app"));
        assert_eq!(entry["msg"], json!("hello"));
    }

    #[test]
    fn tracing_sink_emits_under_record_target_and_respects_filter() -> anyhow::Result<()> {
        let buffer = SharedBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let sink = TracingSink;
            assert!(sink.enabled(LogLevel::Info));
            assert!(sink.enabled(LogLevel::Fatal));
            assert!(!sink.enabled(LogLevel::Debug));

            sink.log(
                LogRecord::new(LogLevel::Info, payload(json!({"req": {"url": "/x"}})))
                    .with_msg("hello"),
            );
            sink.log(LogRecord::new(LogLevel::Debug, Payload::new()).with_msg("suppressed"));
        });

        let output = buffer.text()?;
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains(RECORD_TARGET));
        assert!(output.contains("hello"));
        assert!(output.contains(r#"payload={"req":{"url":"/x"}}"#));
        assert!(!output.contains("suppressed"));
        Ok(())
    }
}
