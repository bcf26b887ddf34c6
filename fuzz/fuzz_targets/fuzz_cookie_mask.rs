//! Fuzz target for the cookie mask.
//!
//! Arbitrary header text must either scrub or fail with a mask error,
//! never panic, and scrubbing twice must be stable.

#![no_main]

use es_scrub::{scrub_cookies, KeySelection};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for keys in [KeySelection::All, KeySelection::named(["session", "a"])] {
        let mask = scrub_cookies(keys);
        if let Ok(once) = mask.apply(Value::String(text.to_string())) {
            let twice = mask.apply(once.clone());
            assert_eq!(twice.ok(), Some(once));
        }
    }
});
