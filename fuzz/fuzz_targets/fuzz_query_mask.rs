//! Fuzz target for the query string mask.

#![no_main]

use es_scrub::{scrub_query_string, KeySelection};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data).into_owned();

    for keys in [KeySelection::All, KeySelection::named(["code", "state"])] {
        // Any text is a valid query string; only the result shape matters.
        let mask = scrub_query_string(keys);
        let _ = mask.apply(Value::String(text.clone()));
    }
});
