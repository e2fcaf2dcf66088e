//! secp256k1 ECDSA with 33-byte compressed keys and 64-byte compact signatures.
//!
//! Used by settlement multisig and escrow arbitration. Signing is RFC 6979
//! deterministic over SHA-256 and always produces low-S signatures.

use crate::error::CryptoError;
use crate::schnorr::SecretKey;
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use polis_types::CompressedPubKey;

/// Derive the compressed public key for a secret.
pub fn ecdsa_public_key(secret: &SecretKey) -> Result<CompressedPubKey, CryptoError> {
    let signing_key =
        SigningKey::from_slice(&secret.0).map_err(|_| CryptoError::InvalidSecretKey)?;
    let point = signing_key.verifying_key().to_encoded_point(true);
    CompressedPubKey::from_slice(point.as_bytes()).map_err(|_| CryptoError::InvalidPublicKey)
}

/// Sign `message` (SHA-256 is applied internally).
pub fn ecdsa_sign(message: &[u8], secret: &SecretKey) -> Result<[u8; 64], CryptoError> {
    let signing_key =
        SigningKey::from_slice(&secret.0).map_err(|_| CryptoError::InvalidSecretKey)?;
    let signature: Signature = signing_key
        .try_sign(message)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    let mut out = [0u8; 64];
    out.copy_from_slice(&signature.to_bytes());
    Ok(out)
}

/// Whether the bytes decode to a point on the curve.
pub fn is_valid_public_key(public_key: &CompressedPubKey) -> bool {
    VerifyingKey::from_sec1_bytes(public_key.as_bytes()).is_ok()
}

/// Verify a compact signature over `message`.
pub fn ecdsa_verify(message: &[u8], signature: &[u8], public_key: &CompressedPubKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(public_key.as_bytes()) else {
        return false;
    };
    let Ok(sig) = Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify(message, &sig).is_ok()
}
