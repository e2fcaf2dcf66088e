//! Signature verification capability handed to governance at startup.

use crate::schnorr::schnorr_verify;

/// Verifies ballot signatures.
///
/// Created once by the embedding and owned by the voting system, so that no
/// process-wide verification context exists.
pub trait SignatureVerifier: Send + Sync {
    /// Verify `signature` over `message` for `public_key`.
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

/// BIP-340 Schnorr verifier: SHA-256 of the message, x-only public key.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bip340Verifier;

impl SignatureVerifier for Bip340Verifier {
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        schnorr_verify(message, signature, public_key)
    }

    fn name(&self) -> &str {
        "bip340-schnorr"
    }
}
