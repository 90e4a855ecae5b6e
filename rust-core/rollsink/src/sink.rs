// SPDX-License-Identifier: PMPL-1.0-or-later
//
// rollsink - Sink trait and in-process sinks
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `LogSink` is the single capability every destination implements. A write
// either fails hard (`Err(SinkError)`) or succeeds with a `WriteReport` that
// may still describe degraded housekeeping, so callers can tell the two tiers
// apart without inspecting log output.

use std::path::PathBuf;

use crate::error::SinkResult;
use crate::record::LogRecord;

/// Which housekeeping step a cleanup failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStep {
    /// Listing the stream directory.
    List,
    /// Removing one expired file.
    Remove,
}

/// A non-fatal failure during retention cleanup.
#[derive(Debug)]
pub struct CleanupFailure {
    /// The directory (for [`CleanupStep::List`]) or file that failed.
    pub path: PathBuf,

    /// The step that failed.
    pub step: CleanupStep,

    /// The underlying filesystem error.
    pub error: std::io::Error,
}

/// What a successful write did besides appending.
#[derive(Debug, Default)]
pub struct WriteReport {
    /// Archival path the active file was renamed to, if a rollover happened.
    pub rolled_over_to: Option<PathBuf>,

    /// Files removed by retention cleanup, oldest first.
    pub removed: Vec<PathBuf>,

    /// Cleanup steps that failed. The record itself was written.
    pub cleanup_failures: Vec<CleanupFailure>,
}

impl WriteReport {
    /// Returns `true` if the record was written but cleanup did not fully
    /// succeed.
    pub fn is_degraded(&self) -> bool {
        !self.cleanup_failures.is_empty()
    }

    /// Returns `true` if this write rolled the active file over.
    pub fn rolled_over(&self) -> bool {
        self.rolled_over_to.is_some()
    }
}

/// A destination for structured log records.
pub trait LogSink {
    /// Write one record.
    fn write(&mut self, record: &LogRecord) -> SinkResult<WriteReport>;

    /// Build a record stamped now from its five text fields and write it.
    fn log(
        &mut self,
        message: &str,
        level: &str,
        function_name: &str,
        context: &str,
        stack_trace: &str,
    ) -> SinkResult<WriteReport> {
        let record = LogRecord::new(level, message)
            .with_function_name(function_name)
            .with_context(context)
            .with_stack_trace(stack_trace);
        self.write(&record)
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn write(&mut self, record: &LogRecord) -> SinkResult<WriteReport> {
        (**self).write(record)
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// Keeps every record in memory, in write order.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Vec<LogRecord>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written so far.
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Take ownership of the collected records.
    pub fn into_records(self) -> Vec<LogRecord> {
        self.records
    }
}

impl LogSink for MemorySink {
    fn write(&mut self, record: &LogRecord) -> SinkResult<WriteReport> {
        self.records.push(record.clone());
        Ok(WriteReport::default())
    }
}

// ---------------------------------------------------------------------------
// TracingSink
// ---------------------------------------------------------------------------

/// Re-emits records as `tracing` events under the `rollsink_record` target.
///
/// The level label is matched case-insensitively: `error`, `warn`/`warning`,
/// `debug`, `trace`; anything else is emitted at info. Every event carries
/// the record's function, context, level and stack trace as fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&mut self, record: &LogRecord) -> SinkResult<WriteReport> {
        let function = record.function_name.as_str();
        let context = record.context.as_str();
        let level = record.level.as_str();
        let message = record.message.as_str();
        let stack_trace = record.stack_trace.as_str();

        match level.to_ascii_lowercase().as_str() {
            "error" | "fatal" | "critical" => {
                tracing::error!(target: "rollsink_record", function, context, level, stack_trace, "{}", message)
            }
            "warn" | "warning" => {
                tracing::warn!(target: "rollsink_record", function, context, level, stack_trace, "{}", message)
            }
            "debug" => {
                tracing::debug!(target: "rollsink_record", function, context, level, stack_trace, "{}", message)
            }
            "trace" | "verbose" => {
                tracing::trace!(target: "rollsink_record", function, context, level, stack_trace, "{}", message)
            }
            _ => tracing::info!(target: "rollsink_record", function, context, level, stack_trace, "{}", message),
        }

        Ok(WriteReport::default())
    }
}
