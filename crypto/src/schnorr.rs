//! BIP-340 Schnorr signatures over secp256k1.
//!
//! Messages are hashed with SHA-256 before signing; the 32-byte digest is
//! the BIP-340 message. Public keys are 32-byte x-only keys.

use crate::error::CryptoError;
use k256::ecdsa::signature::{Signer, Verifier};
use k256::schnorr::{Signature, SigningKey, VerifyingKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A 32-byte secp256k1 secret scalar.
///
/// This type intentionally does not implement `Debug`, `Serialize`, or `Clone`
/// to prevent accidental exposure. Key bytes are zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(pub [u8; 32]);

impl SecretKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Derive the x-only public key for a secret.
pub fn schnorr_public_key(secret: &SecretKey) -> Result<[u8; 32], CryptoError> {
    let signing_key =
        SigningKey::from_bytes(&secret.0).map_err(|_| CryptoError::InvalidSecretKey)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&signing_key.verifying_key().to_bytes());
    Ok(out)
}

/// Sign `message` (SHA-256 is applied internally).
pub fn schnorr_sign(message: &[u8], secret: &SecretKey) -> Result<[u8; 64], CryptoError> {
    let signing_key =
        SigningKey::from_bytes(&secret.0).map_err(|_| CryptoError::InvalidSecretKey)?;
    let signature: Signature = signing_key
        .try_sign(message)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    Ok(signature.to_bytes())
}

/// Verify a 64-byte signature over `message` against a 32-byte x-only key.
///
/// Returns `false` for malformed keys or signatures rather than erroring.
pub fn schnorr_verify(message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    let Ok(sig) = Signature::try_from(signature) else {
        return false;
    };
    verifying_key.verify(message, &sig).is_ok()
}
