#![no_main]

use libfuzzer_sys::fuzz_target;

use polis_settlement::{verify_multisig, AggregatedSignature, Escrow, MultisigPolicy};

// Settlement decoders must never panic and must round-trip what they accept.
fuzz_target!(|data: &[u8]| {
    let policy = MultisigPolicy::from_bytes(data);
    if let Ok(p) = &policy {
        assert_eq!(p.to_bytes(), data);
    }

    let aggregated = AggregatedSignature::from_bytes(data);
    if let Ok(a) = &aggregated {
        assert_eq!(a.to_bytes(), data);
    }

    if let Ok(e) = Escrow::from_bytes(data) {
        assert_eq!(e.to_bytes().expect("decoded escrow re-encodes"), data);
    }

    // Split the input into a policy and a signature set and verify one
    // against the other; only the result matters, never a panic.
    if data.len() > 2 {
        let (head, tail) = data.split_at(data.len() / 2);
        if let (Ok(p), Ok(a)) = (MultisigPolicy::from_bytes(head), AggregatedSignature::from_bytes(tail)) {
            let _ = verify_multisig(&p, head, &a);
        }
    }
});
