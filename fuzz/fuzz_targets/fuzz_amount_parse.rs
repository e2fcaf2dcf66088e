#![no_main]

use libfuzzer_sys::fuzz_target;

use polis_monetary::DenominationTable;

// Parsing user-supplied amounts in every denomination must never panic,
// and an accepted amount must format back to a parseable string.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let table = DenominationTable::standard();
    for denom in table.entries() {
        if let Ok(raw) = denom.parse(text) {
            if let Ok(formatted) = denom.format(raw) {
                if !formatted.approximate {
                    assert_eq!(denom.parse(&formatted.text).ok(), Some(raw));
                }
            }
        }
    }
});
