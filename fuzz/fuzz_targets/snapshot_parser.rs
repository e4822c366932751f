#![no_main]

use deoptscope::history::FunctionHistory;
use deoptscope::log::Log;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Decoding must reject bad snapshots with an error, never a panic
        if let Ok(log) = Log::from_json_str(input) {
            for entry in log.functions() {
                let _ = entry.current_state();
                if let Ok(history) = FunctionHistory::new(&log, entry) {
                    let _ = history.to_html();
                }
            }
            for ic in log.ics() {
                let _ = ic.label();
                let _ = log.function_reference_for_ic(ic);
            }
        }
    }
});
