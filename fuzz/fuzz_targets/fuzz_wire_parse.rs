#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Indicator frames are arbitrary line noise in the worst case; the
    // parser must never panic and must only ever return finite numbers.
    if let Some(kg) = weigh_hardware::wire::parse_last_decimal(data) {
        assert!(kg.is_finite());
    }
    let _ = weigh_hardware::wire::latest_weight(data.lines());
});
