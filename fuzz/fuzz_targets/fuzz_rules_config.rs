//! Fuzz target for rules file parsing, validation and building.

#![no_main]

use es_config::{validate_rules, RulesFile, RulesFormat};
use es_scrub::ExternalRegistry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for format in [RulesFormat::Json, RulesFormat::Toml] {
        let Ok(file) = RulesFile::parse(text, format) else {
            continue;
        };
        if validate_rules(&file).is_ok() {
            let _ = file.build(&ExternalRegistry::default());
        }
    }
});
