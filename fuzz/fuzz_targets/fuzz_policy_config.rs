// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for ModuleConfig.json parsing

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Whatever the document holds, an accepted policy must be usable.
        if let Ok(policy) = rollsink::policy::parse(text) {
            assert!(policy.max_size_mb() >= 1);
            assert!(policy.max_file_count() >= 1);
            assert!(policy.max_age_days() >= 1);
            assert!(policy.retention_file_count() >= 1);
        }
    }
});
