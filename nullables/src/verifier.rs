//! Nullable signature verifier.

use polis_crypto::SignatureVerifier;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A verifier with a fixed answer.
///
/// Counts how often it was asked, through a handle that survives boxing.
pub struct NullVerifier {
    accept: bool,
    calls: Arc<AtomicUsize>,
}

impl NullVerifier {
    /// Accepts every signature of the right shape.
    pub fn accepting() -> Self {
        Self {
            accept: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Rejects every signature.
    pub fn rejecting() -> Self {
        Self {
            accept: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared call counter.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl SignatureVerifier for NullVerifier {
    fn verify(&self, _message: &[u8], _signature: &[u8], _public_key: &[u8]) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.accept
    }

    fn name(&self) -> &str {
        "null-verifier"
    }
}
