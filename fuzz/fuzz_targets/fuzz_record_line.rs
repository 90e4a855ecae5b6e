// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for JSON-lines record encoding

#![no_main]

use libfuzzer_sys::fuzz_target;
use rollsink::LogRecord;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    let _ = LogRecord::from_json_line(&text);

    // Any payload must encode to exactly one line.
    let line = LogRecord::new("Info", text.as_ref())
        .with_context(text.as_ref())
        .to_json_line()
        .expect("records always serialize");
    assert!(!line.contains('\n'));
});
