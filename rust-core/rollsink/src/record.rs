// SPDX-License-Identifier: PMPL-1.0-or-later
//
// rollsink - Log record
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// A `LogRecord` is one structured event. On disk it is a single JSON object
// per line with a fixed field set and order, consumed by downstream tools:
//
//   {"Timestamp":"2026-10-18T09:30:12.1234567Z","FunctionName":"...",
//    "ErrorType":"...","Message":"...","Context":"...","LogStackTrace":"..."}
//
// The timestamp uses the round-trip layout with seven fractional digits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SinkResult;

/// Nanoseconds per 100ns tick, the resolution of the fractional field.
const NANOS_PER_TICK: u32 = 100;

/// A single structured log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// UTC instant the event was recorded.
    pub timestamp: DateTime<Utc>,

    /// Free-text origin label, usually the calling function.
    pub function_name: String,

    /// Free-text severity or category label. Written as `ErrorType`.
    pub level: String,

    /// Free-text payload.
    pub message: String,

    /// Free-text auxiliary data.
    pub context: String,

    /// Stack trace, empty when not applicable.
    pub stack_trace: String,
}

/// Borrowed view of a record in wire field order.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct WireRecord<'a> {
    timestamp: String,
    function_name: &'a str,
    error_type: &'a str,
    message: &'a str,
    context: &'a str,
    log_stack_trace: &'a str,
}

/// Owned form used when reading lines back.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedRecord {
    timestamp: DateTime<Utc>,
    #[serde(default)]
    function_name: String,
    #[serde(default)]
    error_type: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    context: String,
    #[serde(default)]
    log_stack_trace: String,
}

impl LogRecord {
    /// Create a record stamped with the current time. All optional fields
    /// start empty.
    pub fn new(level: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            function_name: String::new(),
            level: level.into(),
            message: message.into(),
            context: String::new(),
            stack_trace: String::new(),
        }
    }

    /// Set the originating function label.
    pub fn with_function_name(mut self, function_name: impl Into<String>) -> Self {
        self.function_name = function_name.into();
        self
    }

    /// Set the auxiliary context text.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Set the stack trace text.
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = stack_trace.into();
        self
    }

    /// Override the timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Serialize to one JSON line, without the trailing newline.
    pub fn to_json_line(&self) -> SinkResult<String> {
        let wire = WireRecord {
            timestamp: format_timestamp(&self.timestamp),
            function_name: &self.function_name,
            error_type: &self.level,
            message: &self.message,
            context: &self.context,
            log_stack_trace: &self.stack_trace,
        };
        Ok(serde_json::to_string(&wire)?)
    }

    /// Parse a line previously produced by [`LogRecord::to_json_line`].
    ///
    /// Missing text fields are read as empty strings.
    pub fn from_json_line(line: &str) -> SinkResult<Self> {
        let parsed: ParsedRecord = serde_json::from_str(line.trim_end())?;
        Ok(Self {
            timestamp: parsed.timestamp,
            function_name: parsed.function_name,
            level: parsed.error_type,
            message: parsed.message,
            context: parsed.context,
            stack_trace: parsed.log_stack_trace,
        })
    }
}

/// Render a UTC instant as `yyyy-MM-ddTHH:mm:ss.fffffffZ`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    // Leap-second instants report nanos >= 1e9; clamp into the 7-digit field.
    let ticks = timestamp.timestamp_subsec_nanos().min(999_999_999) / NANOS_PER_TICK;
    format!("{}.{ticks:07}Z", timestamp.format("%Y-%m-%dT%H:%M:%S"))
}
