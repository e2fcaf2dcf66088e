#![no_main]

use libfuzzer_sys::fuzz_target;

use polis_governance::{ParameterChange, TreasurySpend};

// Execution-data decoders are exact-length: anything they accept must
// re-encode to the same bytes.
fuzz_target!(|data: &[u8]| {
    if let Ok(change) = ParameterChange::decode(data) {
        let encoded = change.encode().expect("decoded key fits a u8 length");
        assert_eq!(encoded, data);
    }
    if let Ok(spend) = TreasurySpend::decode(data) {
        let encoded = spend.encode().expect("decoded recipient fits a u8 length");
        assert_eq!(encoded, data);
    }
});
