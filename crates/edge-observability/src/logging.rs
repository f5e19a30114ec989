//! Structured logging with request context.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use edge_core::RequestId;
use serde::{Deserialize, Serialize};

/// Log level for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a level name (case-insensitive).
    pub fn parse(level: &str) -> Option<Self> {
        match level.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace => write!(f, "TRACE"),
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A structured log entry.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Log level.
    pub level: LogLevel,
    /// Log message.
    pub message: String,
    /// Request ID for correlation.
    pub request_id: String,
    /// Workload name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload: Option<String>,
    /// Route path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Additional structured fields.
    #[serde(flatten)]
    pub fields: HashMap<String, serde_json::Value>,
    /// Timestamp in microseconds since request start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_us: Option<u64>,
}

impl LogEntry {
    /// Format as JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }

    /// Format as human-readable string.
    pub fn to_human(&self) -> String {
        let mut s = format!("[{}] {}", self.level, self.message);

        if let Some(elapsed) = self.elapsed_us {
            s.push_str(&format!(" ({}us)", elapsed));
        }

        if !self.fields.is_empty() {
            s.push_str(" | ");
            let mut fields: Vec<String> = self
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            fields.sort();
            s.push_str(&fields.join(" "));
        }

        s
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (for production/log aggregation).
    #[default]
    Json,
    /// Human-readable format (for development).
    Human,
}

impl LogFormat {
    /// Parse a format name (case-insensitive).
    pub fn parse(format: &str) -> Option<Self> {
        match format.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "human" | "text" => Some(Self::Human),
            _ => None,
        }
    }
}

/// Where formatted lines go.
#[derive(Debug, Clone, Default)]
enum LogSink {
    /// Standard error (Spin captures this).
    #[default]
    Stderr,
    /// In-memory buffer, used to assert on log output.
    Capture(Arc<Mutex<Vec<LogEntry>>>),
}

/// Structured logger with request context.
///
/// Provides structured logging with automatic request ID propagation
/// and timing information. Cloning is cheap, so background tasks can carry
/// the logger of the request that spawned them.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    request_id: RequestId,
    workload: Option<String>,
    route: Option<String>,
    start_time: std::time::Instant,
    min_level: LogLevel,
    format: LogFormat,
    sink: LogSink,
}

impl StructuredLogger {
    /// Create a new logger with request context.
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            workload: None,
            route: None,
            start_time: std::time::Instant::now(),
            min_level: LogLevel::Info,
            format: LogFormat::Json,
            sink: LogSink::Stderr,
        }
    }

    /// Set the workload name.
    pub fn with_workload(mut self, workload: impl Into<String>) -> Self {
        self.workload = Some(workload.into());
        self
    }

    /// Set the route path.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Set minimum log level.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Set output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Record entries into `buffer` instead of writing them to stderr.
    pub fn with_capture(mut self, buffer: Arc<Mutex<Vec<LogEntry>>>) -> Self {
        self.sink = LogSink::Capture(buffer);
        self
    }

    /// Log at trace level.
    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message, HashMap::new());
    }

    /// Log at debug level.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, HashMap::new());
    }

    /// Log at info level.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, HashMap::new());
    }

    /// Log at warn level.
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, HashMap::new());
    }

    /// Log at error level.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, HashMap::new());
    }

    fn log(&self, level: LogLevel, message: &str, fields: HashMap<String, serde_json::Value>) {
        if level < self.min_level {
            return;
        }

        let entry = LogEntry {
            level,
            message: message.to_string(),
            request_id: self.request_id.to_string(),
            workload: self.workload.clone(),
            route: self.route.clone(),
            fields,
            elapsed_us: Some(self.start_time.elapsed().as_micros() as u64),
        };

        match &self.sink {
            LogSink::Stderr => {
                let output = match self.format {
                    LogFormat::Json => entry.to_json(),
                    LogFormat::Human => entry.to_human(),
                };
                eprintln!("{}", output);
            }
            LogSink::Capture(buffer) => {
                if let Ok(mut entries) = buffer.lock() {
                    entries.push(entry);
                }
            }
        }
    }

    /// Get the request ID.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }
}

/// Builder for log entries with fluent API.
pub struct LogBuilder<'a> {
    logger: &'a StructuredLogger,
    level: LogLevel,
    message: String,
    fields: HashMap<String, serde_json::Value>,
}

impl<'a> LogBuilder<'a> {
    /// Create a new log builder.
    pub fn new(logger: &'a StructuredLogger, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            logger,
            level,
            message: message.into(),
            fields: HashMap::new(),
        }
    }

    /// Add a string field.
    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields
            .insert(key.to_string(), serde_json::json!(value.into()));
        self
    }

    /// Add an integer field.
    pub fn field_i64(mut self, key: &str, value: i64) -> Self {
        self.fields.insert(key.to_string(), serde_json::json!(value));
        self
    }

    /// Add a boolean field.
    pub fn field_bool(mut self, key: &str, value: bool) -> Self {
        self.fields.insert(key.to_string(), serde_json::json!(value));
        self
    }

    /// Add a duration field (in milliseconds).
    pub fn duration_ms(mut self, key: &str, duration: std::time::Duration) -> Self {
        self.fields
            .insert(key.to_string(), serde_json::json!(duration.as_millis() as u64));
        self
    }

    /// Emit the log entry.
    pub fn emit(self) {
        self.logger.log(self.level, &self.message, self.fields);
    }
}

impl StructuredLogger {
    /// Start building an info log entry.
    pub fn info_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Info, message)
    }

    /// Start building a warn log entry.
    pub fn warn_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Warn, message)
    }

    /// Start building an error log entry.
    pub fn error_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Error, message)
    }

    /// Start building a debug log entry.
    pub fn debug_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Debug, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured() -> (StructuredLogger, Arc<Mutex<Vec<LogEntry>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let logger = StructuredLogger::new(RequestId::from_string("req-1"))
            .with_workload("site-functions")
            .with_route("/api/projects")
            .with_capture(buffer.clone());
        (logger, buffer)
    }

    #[test]
    fn test_min_level_filters() {
        let (logger, buffer) = captured();
        logger.debug("hidden");
        logger.info("shown");
        let entries = buffer.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "shown");
        assert_eq!(entries[0].request_id, "req-1");
    }

    #[test]
    fn test_builder_fields_serialize_flat() {
        let (logger, buffer) = captured();
        logger
            .warn_builder("upstream failed")
            .field("error", "connection refused")
            .field_i64("status", 502)
            .field_bool("stale", true)
            .emit();

        let entries = buffer.lock().unwrap();
        let json: serde_json::Value = serde_json::from_str(&entries[0].to_json()).unwrap();
        assert_eq!(json["level"], "warn");
        assert_eq!(json["error"], "connection refused");
        assert_eq!(json["status"], 502);
        assert_eq!(json["stale"], true);
        assert_eq!(json["route"], "/api/projects");
    }

    #[test]
    fn test_human_format() {
        let entry = LogEntry {
            level: LogLevel::Info,
            message: "cache hit".into(),
            request_id: "r".into(),
            workload: None,
            route: None,
            fields: HashMap::from([("status".to_string(), serde_json::json!("HIT"))]),
            elapsed_us: Some(12),
        };
        assert_eq!(entry.to_human(), r#"[INFO] cache hit (12us) | status="HIT""#);
    }

    #[test]
    fn test_parse_level_and_format() {
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("loud"), None);
        assert_eq!(LogFormat::parse("text"), Some(LogFormat::Human));
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
    }
}
