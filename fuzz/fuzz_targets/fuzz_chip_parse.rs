#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = std::str::from_utf8(data) {
        // Chip identifier parsing must reject garbage without panicking
        let _ = value.parse::<flashprep::Chip>();
    }
});
