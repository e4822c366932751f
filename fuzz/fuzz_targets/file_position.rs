#![no_main]

use deoptscope::history_uri::file_position_from_uri;
use deoptscope::position::FilePosition;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let _ = input.parse::<FilePosition>();
        let _ = file_position_from_uri(input);
    }
});
