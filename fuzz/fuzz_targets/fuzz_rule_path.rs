//! Fuzz target for rule path parsing and resolution.
//!
//! The first line of input is the path, the rest an event. Parsing must
//! round-trip through Display and resolution must never panic.

#![no_main]

use es_scrub::RulePath;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (path_text, event_text) = text.split_once('\n').unwrap_or((text, "{}"));

    let Ok(path) = RulePath::parse(path_text) else {
        return;
    };
    assert_eq!(path.to_string(), path_text);

    if let Ok(mut event) = serde_json::from_str::<Value>(event_text) {
        for target in path.targets(&mut event) {
            if target.is_err() {
                break;
            }
        }
    }
});
