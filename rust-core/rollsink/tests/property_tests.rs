// SPDX-License-Identifier: PMPL-1.0-or-later
//! Property-based tests for rollover, retention and configuration overlay

use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rollsink::{policy, FileLogSink, FixedClock, LogRecord, LogSink, StreamPolicy};
use tempfile::TempDir;

/// Generate arbitrary message payloads, including JSON-hostile characters
fn arb_message() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 \"\\\\\n\t{}:,]{0,40}"
}

/// Generate a config field value: either a usable integer or something that
/// must be ignored
fn arb_field() -> impl Strategy<Value = (serde_json::Value, Option<u64>)> {
    prop_oneof![
        (1u64..10_000).prop_map(|n| (serde_json::json!(n), Some(n))),
        Just((serde_json::json!(0), None)),
        Just((serde_json::json!(-5), None)),
        Just((serde_json::json!("12"), None)),
        Just((serde_json::json!(2.5), None)),
        Just((serde_json::Value::Null, None)),
    ]
}

fn messages(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| LogRecord::from_json_line(line).unwrap().message)
        .collect()
}

fn create_aged(path: &Path, age_secs: u64) {
    File::create(path)
        .unwrap()
        .set_times(
            FileTimes::new().set_modified(SystemTime::now() - Duration::from_secs(age_secs)),
        )
        .unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_records_survive_rollover_in_order(
        batch in prop::collection::vec(arb_message(), 1..25),
        max_file_count in 1usize..5
    ) {
        let dir = TempDir::new().unwrap();
        let active = dir.path().join("app.log");
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap());
        let policy = StreamPolicy::default().with_max_file_count(max_file_count);
        let mut sink = FileLogSink::with_policy_and_clock(&active, policy, clock.clone()).unwrap();

        for message in &batch {
            sink.write(&LogRecord::new("Info", message.as_str())).unwrap();
            clock.advance(chrono::Duration::seconds(1));
        }

        // Archive suffixes sort chronologically; the active file comes last.
        let mut archives: Vec<PathBuf> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path != &active)
            .collect();
        archives.sort();

        let mut seen = Vec::new();
        for archive in &archives {
            seen.extend(messages(archive));
        }
        seen.extend(messages(&active));

        prop_assert_eq!(seen, batch);
    }

    #[test]
    fn test_retention_removes_exactly_the_oldest(
        archive_count in 0usize..8,
        retention in 1usize..6
    ) {
        let dir = TempDir::new().unwrap();

        // Archive i is (archive_count - i) * 60 seconds old: lower index is older.
        let archives: Vec<PathBuf> = (0..archive_count)
            .map(|i| {
                let path = dir.path().join(format!("app.log.2026010100{i:04}"));
                create_aged(&path, ((archive_count - i) * 60) as u64);
                path
            })
            .collect();

        let policy = StreamPolicy::default().with_retention_file_count(retention);
        let mut sink = FileLogSink::with_policy(dir.path().join("app.log"), policy).unwrap();
        let report = sink.write(&LogRecord::new("Info", "trigger")).unwrap();

        let total = archive_count + 1;
        let expected_removed = total.saturating_sub(retention);

        prop_assert_eq!(&report.removed[..], &archives[..expected_removed]);
        prop_assert!(!report.is_degraded());
        prop_assert_eq!(sink.paths().count_siblings().unwrap(), total.min(retention));
        for survivor in &archives[expected_removed..] {
            prop_assert!(survivor.exists());
        }
        prop_assert!(sink.paths().active_path().exists());
    }

    #[test]
    fn test_wire_line_is_single_line_with_fixed_fields(
        level in arb_message(),
        message in arb_message(),
        context in arb_message(),
        stack_trace in arb_message()
    ) {
        let line = LogRecord::new(level, message)
            .with_context(context)
            .with_stack_trace(stack_trace)
            .to_json_line()
            .unwrap();

        prop_assert!(!line.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        prop_assert_eq!(
            keys,
            ["Context", "ErrorType", "FunctionName", "LogStackTrace", "Message", "Timestamp"]
        );
    }

    #[test]
    fn test_config_fields_override_independently(
        size in arb_field(),
        count in arb_field(),
        age in arb_field(),
        retention in arb_field()
    ) {
        let document = serde_json::json!({
            "Logging": {
                "FileBackend": {
                    "MaxSizeMB": size.0,
                    "MaxFileCount": count.0,
                    "MaxAgeDays": age.0,
                    "RetentionFileCount": retention.0,
                }
            }
        });
        let parsed = policy::parse(&document.to_string()).unwrap();
        let defaults = StreamPolicy::default();

        prop_assert_eq!(parsed.max_size_mb(), size.1.unwrap_or(defaults.max_size_mb()));
        prop_assert_eq!(
            parsed.max_file_count() as u64,
            count.1.unwrap_or(defaults.max_file_count() as u64)
        );
        prop_assert_eq!(parsed.max_age_days(), age.1.unwrap_or(defaults.max_age_days()));
        prop_assert_eq!(
            parsed.retention_file_count() as u64,
            retention.1.unwrap_or(defaults.retention_file_count() as u64)
        );
    }
}
