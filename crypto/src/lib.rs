//! Cryptographic primitives for Polis.
//!
//! - **BIP-340 Schnorr** over secp256k1 for governance ballots (x-only keys)
//! - **ECDSA** over secp256k1 for settlement multisig (compressed keys)
//! - **SHA-256** for signature digests, hash-locks and policy ids
//! - **FNV-1a 64** for the monetary consistency hash (not a commitment)

pub mod ecdsa;
pub mod error;
pub mod hash;
pub mod schnorr;
pub mod verifier;

pub use ecdsa::{ecdsa_public_key, ecdsa_sign, ecdsa_verify, is_valid_public_key};
pub use error::CryptoError;
pub use hash::{fnv1a_64, sha256, sha256_multi};
pub use schnorr::{schnorr_public_key, schnorr_sign, schnorr_verify, SecretKey};
pub use verifier::{Bip340Verifier, SignatureVerifier};
