// SPDX-License-Identifier: PMPL-1.0-or-later
//
// rollsink - Error types
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Two tiers. `SinkError` is fatal: a malformed stream path at construction,
// or a rollover/append failure during `write`. `PolicyError` only ever
// describes a degraded configuration load and is carried inside
// `PolicySource::Degraded`, never returned to the caller of `write`.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors surfaced by a log sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The stream path cannot be split into a directory and a base name.
    #[error("invalid log stream path {path:?}: {reason}")]
    Configuration {
        /// The path given at construction.
        path: PathBuf,
        /// Which component was missing.
        reason: &'static str,
    },

    /// Renaming the active file to its archival name failed.
    #[error("failed to roll over {from:?} to {to:?}: {source}")]
    Rollover {
        /// The active file.
        from: PathBuf,
        /// The archival name the file was being moved to.
        to: PathBuf,
        /// The underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// Appending the serialized record to the active file failed.
    #[error("failed to append to {path:?}: {source}")]
    Append {
        /// The active file.
        path: PathBuf,
        /// The underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// Reading metadata or listing the stream directory before an append
    /// failed, so the rollover decision could not be made.
    #[error("failed to inspect {path:?}: {source}")]
    Inspect {
        /// The file or directory being inspected.
        path: PathBuf,
        /// The underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// The record could not be serialized to JSON.
    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Convenience type alias for sink results.
pub type SinkResult<T> = Result<T, SinkError>;

/// Reasons a configuration resource was ignored in favour of defaults.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The configuration file exists but could not be read.
    #[error("failed to read {path:?}: {source}")]
    Read {
        /// The configuration file.
        path: PathBuf,
        /// The underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON.
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        /// The configuration file.
        path: PathBuf,
        /// The JSON parser error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_configuration() {
        let error = SinkError::Configuration {
            path: PathBuf::from("app.log"),
            reason: "missing directory",
        };
        let message = format!("{error}");
        assert!(message.contains("app.log"));
        assert!(message.contains("missing directory"));
    }

    #[test]
    fn test_error_display_rollover() {
        let error = SinkError::Rollover {
            from: PathBuf::from("/var/log/app.log"),
            to: PathBuf::from("/var/log/app.log.20261018093012"),
            source: std::io::Error::new(std::io::ErrorKind::AlreadyExists, "target exists"),
        };
        let message = format!("{error}");
        assert!(message.contains("20261018093012"));
        assert!(message.contains("target exists"));
    }

    #[test]
    fn test_error_source_is_preserved() {
        use std::error::Error as _;

        let error = SinkError::Append {
            path: PathBuf::from("/var/log/app.log"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let source = error.source().expect("append error carries its io source");
        assert!(source.to_string().contains("denied"));
    }

    #[test]
    fn test_policy_error_display_parse() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error = PolicyError::Parse {
            path: PathBuf::from("/var/log/ModuleConfig.json"),
            source,
        };
        assert!(error.to_string().contains("ModuleConfig.json"));
    }
}
