// SPDX-License-Identifier: PMPL-1.0-or-later
//
// rollsink - append-only structured log sink
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Writes structured log records as JSON lines to a log stream identified by
// a base file path, rolling the active file over when it grows too large,
// too old, or when the directory holds too many of its siblings, and pruning
// the oldest files beyond a retention count.
//
// # Architecture
//
// A stream lives in one directory:
//
// ```text
// logs/
//   ModuleConfig.json         -- optional thresholds (Logging.FileBackend)
//   capture.log               -- active file, receives appends
//   capture.log.20261017231502
//   capture.log.20261018090011 -- archives, `<base>.<yyyyMMddHHmmss>` UTC
// ```
//
// Each `write` runs rollover check -> append -> retention cleanup. Rollover
// and append failures are returned as `SinkError`; cleanup failures are
// logged and reported in the `WriteReport` but never fail the write.
//
// ## Usage
//
// ```no_run
// use rollsink::{FileLogSink, LogRecord, LogSink};
//
// let mut sink = FileLogSink::open("/var/log/capture/capture.log").unwrap();
//
// let record = LogRecord::new("Error", "window not found")
//     .with_function_name("FocusWindow")
//     .with_context("title=Last War");
// let report = sink.write(&record).unwrap();
// if report.is_degraded() {
//     eprintln!("cleanup incomplete: {:?}", report.cleanup_failures);
// }
// ```

pub mod clock;
pub mod error;
pub mod policy;
pub mod record;
pub mod sink;
pub mod stream;
pub mod writer;

// Re-export the primary public API for ergonomic imports.
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{PolicyError, SinkError, SinkResult};
pub use policy::{LoadedPolicy, PolicySource, StreamPolicy, CONFIG_FILE_NAME};
pub use record::LogRecord;
pub use sink::{CleanupFailure, CleanupStep, LogSink, MemorySink, TracingSink, WriteReport};
pub use stream::{SiblingFile, StreamPaths};
pub use writer::{ActiveFileState, FileLogSink, RolloverReason, SyncMode};
