#![no_main]

use libfuzzer_sys::fuzz_target;

use polis_crypto::Bip340Verifier;
use polis_governance::{GovernanceConfig, Polis};
use polis_rpc::{Dispatcher, RpcConfig};

// Every input yields a well-formed JSON-RPC response.
fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(mut polis) = Polis::new(GovernanceConfig::default(), Box::new(Bip340Verifier)) else {
        return;
    };
    let Ok(mut dispatcher) = Dispatcher::new(RpcConfig::default()) else {
        return;
    };
    let response = dispatcher.handle_str(&mut polis, raw);
    let value: serde_json::Value = serde_json::from_str(&response).expect("response is JSON");
    assert_eq!(value["jsonrpc"], "2.0");
    assert!(value.get("result").is_some() != value.get("error").is_some());
});
