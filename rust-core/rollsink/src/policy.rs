// SPDX-License-Identifier: PMPL-1.0-or-later
//
// rollsink - Stream policy
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Thresholds for one log stream, read once when the sink is opened. Defaults
// can be overridden by a `ModuleConfig.json` placed in the stream directory:
//
// ```json
// {
//   "Logging": {
//     "FileBackend": {
//       "MaxSizeMB": 50,
//       "MaxFileCount": 50,
//       "MaxAgeDays": 30,
//       "RetentionFileCount": 500
//     }
//   }
// }
// ```
//
// Every field is optional. A field that is missing, not an integer, or not
// positive keeps its default. A document that is not a JSON object at all is
// ignored as a whole, with a warning.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::PolicyError;

/// Name of the configuration resource looked up in the stream directory.
pub const CONFIG_FILE_NAME: &str = "ModuleConfig.json";

/// Default size threshold in megabytes.
pub const DEFAULT_MAX_SIZE_MB: u64 = 50;

/// Default sibling-count threshold that forces a rollover.
pub const DEFAULT_MAX_FILE_COUNT: usize = 50;

/// Default age threshold in days.
pub const DEFAULT_MAX_AGE_DAYS: u64 = 30;

/// Default number of sibling files kept by retention cleanup.
pub const DEFAULT_RETENTION_FILE_COUNT: usize = 500;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Rollover and retention thresholds for one log stream.
///
/// All four values are positive. The struct is a plain value: once a sink
/// has been opened with it, it never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamPolicy {
    #[serde(rename = "MaxSizeMB")]
    max_size_mb: u64,
    max_file_count: usize,
    max_age_days: u64,
    retention_file_count: usize,
}

impl Default for StreamPolicy {
    /// 50 MB, 50 files, 30 days, 500 retained files.
    fn default() -> Self {
        Self {
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            max_file_count: DEFAULT_MAX_FILE_COUNT,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            retention_file_count: DEFAULT_RETENTION_FILE_COUNT,
        }
    }
}

impl StreamPolicy {
    /// Size threshold in megabytes.
    pub fn max_size_mb(&self) -> u64 {
        self.max_size_mb
    }

    /// Size threshold in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Sibling-count threshold that forces a rollover.
    pub fn max_file_count(&self) -> usize {
        self.max_file_count
    }

    /// Age threshold in days.
    pub fn max_age_days(&self) -> u64 {
        self.max_age_days
    }

    /// Number of sibling files retention cleanup keeps.
    pub fn retention_file_count(&self) -> usize {
        self.retention_file_count
    }

    /// Set the size threshold. Zero is raised to 1.
    pub fn with_max_size_mb(mut self, max_size_mb: u64) -> Self {
        self.max_size_mb = max_size_mb.max(1);
        self
    }

    /// Set the sibling-count threshold. Zero is raised to 1.
    pub fn with_max_file_count(mut self, max_file_count: usize) -> Self {
        self.max_file_count = max_file_count.max(1);
        self
    }

    /// Set the age threshold. Zero is raised to 1.
    pub fn with_max_age_days(mut self, max_age_days: u64) -> Self {
        self.max_age_days = max_age_days.max(1);
        self
    }

    /// Set the retention count. Zero is raised to 1.
    pub fn with_retention_file_count(mut self, retention_file_count: usize) -> Self {
        self.retention_file_count = retention_file_count.max(1);
        self
    }

    /// Apply the `Logging.FileBackend` section of a parsed configuration
    /// document on top of `self`, field by field.
    pub fn overlay(mut self, root: &Map<String, Value>) -> Self {
        let Some(section) = root
            .get("Logging")
            .and_then(|logging| logging.get("FileBackend"))
            .and_then(Value::as_object)
        else {
            return self;
        };

        if let Some(value) = positive_field(section, "MaxSizeMB") {
            self.max_size_mb = value;
        }
        if let Some(value) = positive_field(section, "MaxFileCount") {
            self.max_file_count = value as usize;
        }
        if let Some(value) = positive_field(section, "MaxAgeDays") {
            self.max_age_days = value;
        }
        if let Some(value) = positive_field(section, "RetentionFileCount") {
            self.retention_file_count = value as usize;
        }

        self
    }
}

/// Read a field as a positive integer no larger than `u32::MAX`.
fn positive_field(section: &Map<String, Value>, key: &str) -> Option<u64> {
    section
        .get(key)
        .and_then(Value::as_u64)
        .filter(|value| (1..=u64::from(u32::MAX)).contains(value))
}

/// Parse a configuration document into a policy, starting from defaults.
///
/// Fails only when the text is not a JSON object.
pub fn parse(text: &str) -> Result<StreamPolicy, serde_json::Error> {
    let root: Map<String, Value> = serde_json::from_str(text)?;
    Ok(StreamPolicy::default().overlay(&root))
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Where a loaded policy came from.
#[derive(Debug)]
pub enum PolicySource {
    /// No configuration resource was present.
    Defaults {
        /// The path that was checked.
        path: PathBuf,
    },

    /// The configuration resource was read and applied.
    File {
        /// The configuration file.
        path: PathBuf,
    },

    /// The configuration resource exists but was ignored; defaults are in
    /// effect.
    Degraded {
        /// Why the resource was ignored.
        error: PolicyError,
    },

    /// The policy was supplied by the caller; no resource was consulted.
    Explicit,
}

/// A policy together with the outcome of loading it.
#[derive(Debug)]
pub struct LoadedPolicy {
    /// The effective policy.
    pub policy: StreamPolicy,

    /// How `policy` was obtained.
    pub source: PolicySource,
}

impl LoadedPolicy {
    /// Returns `true` if a configuration resource was present but unusable.
    pub fn is_degraded(&self) -> bool {
        matches!(self.source, PolicySource::Degraded { .. })
    }
}

/// Path of the configuration resource for a stream directory.
pub fn config_path(stream_dir: &Path) -> PathBuf {
    stream_dir.join(CONFIG_FILE_NAME)
}

/// Load the policy for a stream directory.
///
/// Never fails: a missing resource yields defaults, and an unreadable or
/// malformed one yields defaults plus a warning on the diagnostic channel.
pub fn load(stream_dir: &Path) -> LoadedPolicy {
    let path = config_path(stream_dir);

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(source) if source.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No stream configuration, using defaults");
            return LoadedPolicy {
                policy: StreamPolicy::default(),
                source: PolicySource::Defaults { path },
            };
        }
        Err(source) => {
            return degraded(PolicyError::Read { path, source });
        }
    };

    match parse(&text) {
        Ok(policy) => {
            debug!(path = %path.display(), ?policy, "Loaded stream configuration");
            LoadedPolicy {
                policy,
                source: PolicySource::File { path },
            }
        }
        Err(source) => degraded(PolicyError::Parse { path, source }),
    }
}

fn degraded(error: PolicyError) -> LoadedPolicy {
    warn!(%error, "Failed to load file backend config, using defaults");
    LoadedPolicy {
        policy: StreamPolicy::default(),
        source: PolicySource::Degraded { error },
    }
}
