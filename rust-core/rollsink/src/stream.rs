// SPDX-License-Identifier: PMPL-1.0-or-later
//
// rollsink - Stream naming and sibling discovery
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// A stream is a directory plus a base file name. The active file is
// `<dir>/<base>`; rollover renames it to `<dir>/<base>.<yyyyMMddHHmmss>` (UTC).
// Every regular file in the directory whose name starts with the base name is
// a sibling: the active file, its archives, and anything else sharing the
// prefix. Sibling counts drive both rollover and retention.

use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{is_separator, Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use crate::error::{SinkError, SinkResult};

/// `chrono` format of the archival suffix.
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Width of a formatted archival suffix.
pub const ARCHIVE_TIMESTAMP_LEN: usize = 14;

/// A file in the stream directory that shares the stream's base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingFile {
    /// Full path to the file.
    pub path: PathBuf,

    /// Size in bytes when listed.
    pub len: u64,

    /// Last-modified time when listed.
    pub modified: SystemTime,
}

/// The directory and base name identifying one log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPaths {
    dir: PathBuf,
    base_name: String,
    active_path: PathBuf,
}

impl StreamPaths {
    /// Split a log file path into its stream directory and base name.
    ///
    /// Fails when the path has no directory component (`app.log`), ends in a
    /// separator (`logs/`), or has no usable file name (`/`, `logs/.`,
    /// `logs/..`).
    pub fn from_log_path(log_file_path: impl AsRef<Path>) -> SinkResult<Self> {
        let path = log_file_path.as_ref();
        let invalid = |reason| SinkError::Configuration {
            path: path.to_path_buf(),
            reason,
        };

        // `Path::file_name` normalizes a trailing `.` away, so inspect the
        // raw last segment.
        let last_segment = path
            .as_os_str()
            .as_encoded_bytes()
            .rsplit(|&byte| byte.is_ascii() && is_separator(byte as char))
            .next()
            .unwrap_or_default();
        match last_segment {
            b"" if !path.as_os_str().is_empty() => {
                return Err(invalid("path ends with a separator"))
            }
            b"." => return Err(invalid("path ends with a current-directory component")),
            _ => {}
        }

        let base_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| invalid("missing or non UTF-8 base file name"))?;

        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| invalid("missing directory"))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            base_name: base_name.to_string(),
            active_path: path.to_path_buf(),
        })
    }

    /// The stream directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The base file name shared by all siblings.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Path of the active file.
    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    /// File name an archive created at `at` receives.
    ///
    /// Format: `app.log.20261018093012`
    pub fn archive_name(&self, at: DateTime<Utc>) -> String {
        format!("{}.{}", self.base_name, at.format(ARCHIVE_TIMESTAMP_FORMAT))
    }

    /// Full path an archive created at `at` receives.
    pub fn archive_path(&self, at: DateTime<Utc>) -> PathBuf {
        self.dir.join(self.archive_name(at))
    }

    /// Parse the rollover instant out of an archival file name.
    ///
    /// Returns `None` for the active file and for any sibling that merely
    /// shares the prefix.
    pub fn parse_archive_name(&self, file_name: &str) -> Option<DateTime<Utc>> {
        let suffix = file_name
            .strip_prefix(self.base_name.as_str())?
            .strip_prefix('.')?;
        if suffix.len() != ARCHIVE_TIMESTAMP_LEN || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        NaiveDateTime::parse_from_str(suffix, ARCHIVE_TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Returns `true` if `file_name` belongs to this stream.
    pub fn is_sibling_name(&self, file_name: &OsStr) -> bool {
        file_name
            .as_encoded_bytes()
            .starts_with(self.base_name.as_bytes())
    }

    /// List all sibling files, ordered oldest first by last-modified time.
    ///
    /// On equal timestamps the active file sorts last and other files by
    /// path. Entries that disappear while the directory is being read are
    /// skipped.
    pub fn list_siblings(&self) -> std::io::Result<Vec<SiblingFile>> {
        let mut siblings = Vec::new();

        for dir_entry in fs::read_dir(&self.dir)? {
            let dir_entry = dir_entry?;
            if !self.is_sibling_name(&dir_entry.file_name()) {
                continue;
            }

            let metadata = match dir_entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            if !metadata.is_file() {
                continue;
            }

            siblings.push(SiblingFile {
                path: dir_entry.path(),
                len: metadata.len(),
                modified: metadata.modified()?,
            });
        }

        // Equal mtimes (coarse timestamp resolution) must never put the
        // active file ahead of an archive.
        let base = OsStr::new(&self.base_name);
        let is_active = |sibling: &SiblingFile| sibling.path.file_name() == Some(base);
        siblings.sort_by(|a, b| {
            a.modified
                .cmp(&b.modified)
                .then_with(|| is_active(a).cmp(&is_active(b)))
                .then_with(|| a.path.cmp(&b.path))
        });

        debug!(
            count = siblings.len(),
            dir = %self.dir.display(),
            base = %self.base_name,
            "Listed stream siblings"
        );

        Ok(siblings)
    }

    /// Count sibling files without reading their timestamps.
    pub fn count_siblings(&self) -> std::io::Result<usize> {
        let mut count = 0;
        for dir_entry in fs::read_dir(&self.dir)? {
            let dir_entry = dir_entry?;
            if !self.is_sibling_name(&dir_entry.file_name()) {
                continue;
            }
            match dir_entry.file_type() {
                Ok(file_type) if file_type.is_file() => count += 1,
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(count)
    }
}
