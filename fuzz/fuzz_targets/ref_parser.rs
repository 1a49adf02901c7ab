#![no_main]

use libfuzzer_sys::fuzz_target;
use perfbound::budget::parse_ref;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Malformed pairs are dropped, never rejected
        let params = parse_ref(input);
        assert!(params.keys().all(|k| !k.is_empty()));
    }
});
