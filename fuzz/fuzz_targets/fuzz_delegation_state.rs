#![no_main]

use libfuzzer_sys::fuzz_target;

use polis_governance::DelegationSystem;

// Restoring persisted delegation state from arbitrary bytes must not panic.
fuzz_target!(|data: &[u8]| {
    if let Ok(system) = DelegationSystem::load_state(data) {
        let _ = system.save_state();
    }
});
