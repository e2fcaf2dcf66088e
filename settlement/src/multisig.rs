//! M-of-N multisig over compressed secp256k1 keys.
//!
//! Policy wire format: `[M u8][N u8][N × 33 key bytes]`.
//! Aggregated signature wire format: `[count u8][count × (index u8, 64 sig bytes)]`.

use std::collections::HashSet;

use polis_crypto::{ecdsa_verify, is_valid_public_key, sha256};
use polis_types::CompressedPubKey;

use crate::error::SettlementError;

/// Upper bound on keys per policy.
pub const MAX_KEYS: usize = 15;

const SIG_LEN: usize = 64;
const ENTRY_LEN: usize = 1 + SIG_LEN;

/// A validated M-of-N signing policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultisigPolicy {
    threshold: u8,
    keys: Vec<CompressedPubKey>,
}

impl MultisigPolicy {
    /// Requires `1 <= threshold <= keys.len() <= 15`, distinct keys, and every
    /// key on the curve.
    pub fn new(threshold: usize, keys: Vec<CompressedPubKey>) -> Result<Self, SettlementError> {
        if keys.len() > MAX_KEYS {
            return Err(SettlementError::TooManyKeys(keys.len()));
        }
        if threshold == 0 || threshold > keys.len() {
            return Err(SettlementError::InvalidThreshold {
                threshold,
                keys: keys.len(),
            });
        }
        let mut seen = HashSet::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            if !seen.insert(key) {
                return Err(SettlementError::DuplicateKey(i));
            }
            if !is_valid_public_key(key) {
                return Err(SettlementError::InvalidKey(i));
            }
        }
        // Both fit: threshold <= keys.len() <= MAX_KEYS.
        let threshold = u8::try_from(threshold).map_err(|_| SettlementError::TooManyKeys(threshold))?;
        Ok(Self { threshold, keys })
    }

    pub fn threshold(&self) -> usize {
        usize::from(self.threshold)
    }

    pub fn keys(&self) -> &[CompressedPubKey] {
        &self.keys
    }

    pub fn key(&self, index: u8) -> Option<&CompressedPubKey> {
        self.keys.get(usize::from(index))
    }

    pub fn encoded_len(&self) -> usize {
        2 + self.keys.len() * CompressedPubKey::LEN
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.push(self.threshold);
        // keys.len() <= MAX_KEYS
        out.push(self.keys.len() as u8);
        for key in &self.keys {
            out.extend_from_slice(key.as_bytes());
        }
        out
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, SettlementError> {
        let [m, n, rest @ ..] = data else {
            return Err(SettlementError::Length {
                expected: 2,
                got: data.len(),
            });
        };
        let n = usize::from(*n);
        if n > MAX_KEYS {
            return Err(SettlementError::TooManyKeys(n));
        }
        let expected = 2 + n * CompressedPubKey::LEN;
        if data.len() != expected {
            return Err(SettlementError::Length {
                expected,
                got: data.len(),
            });
        }
        let keys = rest
            .chunks_exact(CompressedPubKey::LEN)
            .map(CompressedPubKey::from_slice)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SettlementError::Malformed(e.to_string()))?;
        Self::new(usize::from(*m), keys)
    }

    /// SHA-256 of the wire encoding.
    pub fn policy_id(&self) -> [u8; 32] {
        sha256(&self.to_bytes())
    }
}

/// Signatures collected from a subset of a policy's keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregatedSignature {
    entries: Vec<(u8, [u8; SIG_LEN])>,
}

impl AggregatedSignature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the signature made by key `index`. Ordering is preserved on the wire.
    pub fn push(&mut self, index: u8, signature: [u8; SIG_LEN]) -> Result<(), SettlementError> {
        if self.entries.len() >= usize::from(u8::MAX) {
            return Err(SettlementError::TooManySignatures(self.entries.len() + 1));
        }
        self.entries.push((index, signature));
        Ok(())
    }

    pub fn entries(&self) -> &[(u8, [u8; SIG_LEN])] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.entries.len() * ENTRY_LEN);
        // push() caps the count at u8::MAX
        out.push(self.entries.len() as u8);
        for (index, sig) in &self.entries {
            out.push(*index);
            out.extend_from_slice(sig);
        }
        out
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, SettlementError> {
        let (&count, rest) = data.split_first().ok_or(SettlementError::Length {
            expected: 1,
            got: 0,
        })?;
        let expected = 1 + usize::from(count) * ENTRY_LEN;
        if data.len() != expected {
            return Err(SettlementError::Length {
                expected,
                got: data.len(),
            });
        }
        let mut entries = Vec::with_capacity(usize::from(count));
        for chunk in rest.chunks_exact(ENTRY_LEN) {
            let mut sig = [0u8; SIG_LEN];
            sig.copy_from_slice(&chunk[1..]);
            entries.push((chunk[0], sig));
        }
        Ok(Self { entries })
    }
}

/// Check an aggregated signature against a policy.
///
/// Every entry must name a distinct in-range key and carry a valid ECDSA
/// signature over SHA-256(`message`); at least `threshold` entries are needed.
pub fn verify_multisig(
    policy: &MultisigPolicy,
    message: &[u8],
    aggregated: &AggregatedSignature,
) -> Result<(), SettlementError> {
    let mut seen = HashSet::with_capacity(aggregated.len());
    for (index, sig) in aggregated.entries() {
        let key = policy.key(*index).ok_or(SettlementError::IndexOutOfRange {
            index: *index,
            keys: policy.keys().len(),
        })?;
        if !seen.insert(*index) {
            return Err(SettlementError::DuplicateIndex(*index));
        }
        if !ecdsa_verify(message, sig, key) {
            return Err(SettlementError::InvalidSignature(*index));
        }
    }
    if seen.len() < policy.threshold() {
        return Err(SettlementError::BelowThreshold {
            valid: seen.len(),
            threshold: policy.threshold(),
        });
    }
    tracing::debug!(signers = seen.len(), threshold = policy.threshold(), "multisig verified");
    Ok(())
}
