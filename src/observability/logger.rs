//! Structured JSON logger
//!
//! One log line per event, synchronous, with deterministic key ordering so
//! identical events always serialize identically. The mapping layer logs
//! little: rejected builds at WARN, resolution misses at TRACE if a caller
//! wants them.

use std::fmt;
use std::io::{self, Write};

use serde_json::{Map, Value};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace,
    /// Normal operations
    Info,
    /// Recoverable issues, including rejected builds
    Warn,
    /// Operation failures
    Error,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Synchronous structured logger
pub struct Logger;

impl Logger {
    /// Log an event with the given severity and fields
    pub fn log(severity: Severity, event: &str, fields: &[(&str, String)]) {
        if severity >= Severity::Error {
            Self::log_to_writer(severity, event, fields, &mut io::stderr());
        } else {
            Self::log_to_writer(severity, event, fields, &mut io::stdout());
        }
    }

    fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, String)],
        writer: &mut W,
    ) {
        // event and severity lead; remaining keys sort alphabetically
        let mut record = Map::new();
        record.insert("event".into(), Value::String(event.to_string()));
        record.insert("severity".into(), Value::String(severity.as_str().into()));

        let mut sorted: Vec<&(&str, String)> = fields.iter().collect();
        sorted.sort_by_key(|(key, _)| *key);
        for (key, value) in sorted {
            record.insert((*key).to_string(), Value::String(value.clone()));
        }

        let mut line = Value::Object(record).to_string();
        line.push('\n');

        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    /// Log at TRACE level
    pub fn trace(event: &str, fields: &[(&str, String)]) {
        Self::log(Severity::Trace, event, fields);
    }

    /// Log at INFO level
    pub fn info(event: &str, fields: &[(&str, String)]) {
        Self::log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(event: &str, fields: &[(&str, String)]) {
        Self::log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level
    pub fn error(event: &str, fields: &[(&str, String)]) {
        Self::log(Severity::Error, event, fields);
    }
}

/// Render a log line to a string for assertions
#[cfg(test)]
pub fn capture_log(severity: Severity, event: &str, fields: &[(&str, String)]) -> String {
    let mut buffer = Vec::new();
    Logger::log_to_writer(severity, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}
