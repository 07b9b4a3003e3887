//! Fuzz harness for driver configuration files
//!
//! Arbitrary text is parsed as YAML and as JSON. Parsing and validation may
//! fail but must not panic; a config that validates must survive a
//! serialize/parse cycle unchanged.

#![no_main]

use libfuzzer_sys::fuzz_target;
use skipdict_config::{ConfigFormat, DriverConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    for format in [ConfigFormat::Yaml, ConfigFormat::Json] {
        let Ok(config) = DriverConfig::from_str_as(input, format) else {
            continue;
        };
        if config.validate().is_err() {
            continue;
        }
        let text = config.to_string_as(format).unwrap();
        let back = DriverConfig::from_str_as(&text, format).unwrap();
        assert_eq!(back, config);
    }
});
