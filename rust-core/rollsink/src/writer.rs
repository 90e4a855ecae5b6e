// SPDX-License-Identifier: PMPL-1.0-or-later
//
// rollsink - File-backed sink
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `FileLogSink` appends one JSON line per record to the stream's active file.
// Every write runs three steps in order:
//
//   1. rollover   - rename the active file to `<base>.<yyyyMMddHHmmss>` when
//                   it is too large, too old, or the directory holds too many
//                   siblings;
//   2. append     - open the active file (creating it), write the line, close;
//   3. retention  - delete the oldest siblings beyond the retention count.
//
// Steps 1 and 2 fail the write. Step 3 never does: failures are logged and
// returned in the `WriteReport`.
//
// There is no locking. One sink value is one writer (`write` takes
// `&mut self`); two sinks or processes on the same stream race between the
// rollover check and the rename/append.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{SinkError, SinkResult};
use crate::policy::{self, PolicySource, StreamPolicy};
use crate::record::LogRecord;
use crate::sink::{CleanupFailure, CleanupStep, LogSink, WriteReport};
use crate::stream::StreamPaths;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

// ---------------------------------------------------------------------------
// SyncMode
// ---------------------------------------------------------------------------

/// Controls whether the sink calls `fsync` after appending.
#[derive(Debug, Clone, Default)]
pub enum SyncMode {
    /// Call `fsync` after every append.
    Fsync,

    /// Call `fsync` at most once per the given interval.
    Periodic(Duration),

    /// Leave flushing to the OS page cache. Each append is still handed to
    /// the filesystem before `write` returns.
    #[default]
    Async,
}

// ---------------------------------------------------------------------------
// Active file state
// ---------------------------------------------------------------------------

/// Lifecycle state of the active file.
///
/// `Absent -> Active` on the first append, `Active -> Absent` on rollover
/// (the renamed file is archived), and back to `Active` on the next append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveFileState {
    /// No active file exists; the next append creates it.
    Absent,
    /// The active file exists and receives appends.
    Active,
}

/// Which threshold forced a rollover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RolloverReason {
    /// The active file reached the size threshold.
    Size {
        /// Active file length in bytes.
        len: u64,
    },
    /// The active file reached the age threshold.
    Age {
        /// Active file age in fractional days.
        days: f64,
    },
    /// The directory holds at least the maximum number of siblings.
    SiblingCount {
        /// Number of siblings counted.
        count: usize,
    },
}

// ---------------------------------------------------------------------------
// FileLogSink
// ---------------------------------------------------------------------------

/// A log sink writing JSON lines to a rolling set of files.
pub struct FileLogSink<C = SystemClock> {
    /// Directory, base name, and active path of the stream.
    paths: StreamPaths,

    /// Thresholds, fixed at construction.
    policy: StreamPolicy,

    /// How `policy` was obtained.
    policy_source: PolicySource,

    /// Source of "now" for age checks and archival names.
    clock: C,

    /// How fsync is managed.
    sync_mode: SyncMode,

    /// Time of the last fsync (for `SyncMode::Periodic`).
    last_sync: Option<Instant>,
}

impl FileLogSink<SystemClock> {
    /// Open a stream at `log_file_path`, loading its policy from the
    /// `ModuleConfig.json` beside it.
    ///
    /// Fails only if the path cannot be split into a directory and a base
    /// name. A missing or broken configuration resource falls back to the
    /// default policy.
    pub fn open(log_file_path: impl AsRef<Path>) -> SinkResult<Self> {
        Self::open_with_clock(log_file_path, SystemClock)
    }

    /// Open a stream with an explicit policy, ignoring any configuration
    /// resource.
    pub fn with_policy(log_file_path: impl AsRef<Path>, policy: StreamPolicy) -> SinkResult<Self> {
        Self::with_policy_and_clock(log_file_path, policy, SystemClock)
    }
}

impl<C: Clock> FileLogSink<C> {
    /// Like [`FileLogSink::open`], reading the time from `clock`.
    pub fn open_with_clock(log_file_path: impl AsRef<Path>, clock: C) -> SinkResult<Self> {
        let paths = StreamPaths::from_log_path(log_file_path)?;
        let loaded = policy::load(paths.dir());

        info!(
            active = %paths.active_path().display(),
            policy = ?loaded.policy,
            degraded = loaded.is_degraded(),
            "Opened log stream"
        );

        Ok(Self::from_parts(paths, loaded.policy, loaded.source, clock))
    }

    /// Like [`FileLogSink::with_policy`], reading the time from `clock`.
    pub fn with_policy_and_clock(
        log_file_path: impl AsRef<Path>,
        policy: StreamPolicy,
        clock: C,
    ) -> SinkResult<Self> {
        let paths = StreamPaths::from_log_path(log_file_path)?;
        Ok(Self::from_parts(paths, policy, PolicySource::Explicit, clock))
    }

    fn from_parts(
        paths: StreamPaths,
        policy: StreamPolicy,
        policy_source: PolicySource,
        clock: C,
    ) -> Self {
        Self {
            paths,
            policy,
            policy_source,
            clock,
            sync_mode: SyncMode::default(),
            last_sync: None,
        }
    }

    /// Set the fsync behaviour for appends.
    pub fn with_sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }

    /// The effective policy.
    pub fn policy(&self) -> &StreamPolicy {
        &self.policy
    }

    /// How the effective policy was obtained.
    pub fn policy_source(&self) -> &PolicySource {
        &self.policy_source
    }

    /// The stream's directory, base name, and active path.
    pub fn paths(&self) -> &StreamPaths {
        &self.paths
    }

    /// Whether the active file currently exists.
    pub fn active_state(&self) -> ActiveFileState {
        if self.paths.active_path().is_file() {
            ActiveFileState::Active
        } else {
            ActiveFileState::Absent
        }
    }

    /// Decide whether the active file must be rolled over before the next
    /// append.
    ///
    /// Thresholds are checked in order: size, age, sibling count. The
    /// directory is only listed when size and age are both under threshold.
    pub fn should_rollover(&self) -> SinkResult<Option<RolloverReason>> {
        let active = self.paths.active_path();
        let metadata = match fs::metadata(active) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SinkError::Inspect {
                    path: active.to_path_buf(),
                    source,
                })
            }
        };

        let len = metadata.len();
        if len >= self.policy.max_size_bytes() {
            return Ok(Some(RolloverReason::Size { len }));
        }

        // Not every platform/filesystem reports a birth time.
        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map_err(|source| SinkError::Inspect {
                path: active.to_path_buf(),
                source,
            })?;
        let days = age_in_days(self.clock.now(), DateTime::<Utc>::from(created));
        if days >= self.policy.max_age_days() as f64 {
            return Ok(Some(RolloverReason::Age { days }));
        }

        let count = self
            .paths
            .count_siblings()
            .map_err(|source| SinkError::Inspect {
                path: self.paths.dir().to_path_buf(),
                source,
            })?;
        if count >= self.policy.max_file_count() {
            return Ok(Some(RolloverReason::SiblingCount { count }));
        }

        Ok(None)
    }

    /// Rename the active file to its archival name for the current instant.
    ///
    /// Fails if an archive with that name already exists (two rollovers in
    /// the same second) rather than overwriting it.
    fn rollover(&self, reason: RolloverReason) -> SinkResult<PathBuf> {
        let from = self.paths.active_path().to_path_buf();
        let to = self.paths.archive_path(self.clock.now());

        let rollover_error = |source| SinkError::Rollover {
            from: from.clone(),
            to: to.clone(),
            source,
        };

        if to.try_exists().map_err(rollover_error)? {
            return Err(rollover_error(std::io::Error::new(
                ErrorKind::AlreadyExists,
                "archive file already exists",
            )));
        }

        fs::rename(&from, &to).map_err(rollover_error)?;

        info!(
            from = %from.display(),
            to = %to.display(),
            ?reason,
            "Rolled over log file"
        );

        Ok(to)
    }

    /// Append one line plus a newline to the active file, creating it if
    /// needed.
    fn append(&mut self, line: &str) -> SinkResult<()> {
        let path = self.paths.active_path();
        let append_error = |source| SinkError::Append {
            path: path.to_path_buf(),
            source,
        };

        let mut buffer = String::with_capacity(line.len() + 1);
        buffer.push_str(line);
        buffer.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(append_error)?;
        file.write_all(buffer.as_bytes()).map_err(append_error)?;

        let sync_now = match &self.sync_mode {
            SyncMode::Fsync => true,
            SyncMode::Periodic(interval) => self
                .last_sync
                .map_or(true, |last| last.elapsed() >= *interval),
            SyncMode::Async => false,
        };
        if sync_now {
            file.sync_all().map_err(append_error)?;
            self.last_sync = Some(Instant::now());
        }

        debug!(path = %path.display(), bytes = buffer.len(), "Appended log record");
        Ok(())
    }

    /// Delete the oldest siblings until at most `retention_file_count`
    /// remain.
    ///
    /// Best effort: every failure is logged, recorded in `report`, and the
    /// remaining candidates are still attempted.
    pub fn cleanup_old_logs(&self, report: &mut WriteReport) {
        self.cleanup_with(report, |path| fs::remove_file(path));
    }

    /// Retention pass with the deletion step supplied by the caller.
    fn cleanup_with<F>(&self, report: &mut WriteReport, mut remove: F)
    where
        F: FnMut(&Path) -> std::io::Result<()>,
    {
        let siblings = match self.paths.list_siblings() {
            Ok(siblings) => siblings,
            Err(error) => {
                warn!(
                    dir = %self.paths.dir().display(),
                    %error,
                    "Failed to list log files for cleanup"
                );
                report.cleanup_failures.push(CleanupFailure {
                    path: self.paths.dir().to_path_buf(),
                    step: CleanupStep::List,
                    error,
                });
                return;
            }
        };

        let retention = self.policy.retention_file_count();
        if siblings.len() <= retention {
            return;
        }

        let excess = siblings.len() - retention;
        for sibling in siblings.into_iter().take(excess) {
            match remove(&sibling.path) {
                Ok(()) => {
                    debug!(path = %sibling.path.display(), "Deleted old log file");
                    report.removed.push(sibling.path);
                }
                Err(error) if error.kind() == ErrorKind::NotFound => {
                    debug!(path = %sibling.path.display(), "Old log file already gone");
                }
                Err(error) => {
                    warn!(
                        path = %sibling.path.display(),
                        %error,
                        "Failed to delete old log file"
                    );
                    report.cleanup_failures.push(CleanupFailure {
                        path: sibling.path,
                        step: CleanupStep::Remove,
                        error,
                    });
                }
            }
        }
    }
}

impl<C: Clock> LogSink for FileLogSink<C> {
    fn write(&mut self, record: &LogRecord) -> SinkResult<WriteReport> {
        let line = record.to_json_line()?;
        let mut report = WriteReport::default();

        if let Some(reason) = self.should_rollover()? {
            report.rolled_over_to = Some(self.rollover(reason)?);
        }

        self.append(&line)?;
        self.cleanup_old_logs(&mut report);

        Ok(report)
    }
}

/// Fractional days between `created` and `now`; negative if `created` lies in
/// the future.
fn age_in_days(now: DateTime<Utc>, created: DateTime<Utc>) -> f64 {
    (now - created).num_milliseconds() as f64 / MILLIS_PER_DAY
}
