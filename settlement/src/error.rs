use polis_types::BlockHeight;
use thiserror::Error;

use crate::escrow::EscrowState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettlementError {
    // ── Multisig ────────────────────────────────────────────────────────
    #[error("threshold {threshold} invalid for {keys} keys")]
    InvalidThreshold { threshold: usize, keys: usize },

    #[error("policy has {0} keys, at most 15 allowed")]
    TooManyKeys(usize),

    #[error("key {0} appears more than once")]
    DuplicateKey(usize),

    #[error("key {0} is not a valid secp256k1 point")]
    InvalidKey(usize),

    #[error("signer index {index} out of range for {keys} keys")]
    IndexOutOfRange { index: u8, keys: usize },

    #[error("signer index {0} repeated")]
    DuplicateIndex(u8),

    #[error("signature from key {0} does not verify")]
    InvalidSignature(u8),

    #[error("{valid} signatures, {threshold} required")]
    BelowThreshold { valid: usize, threshold: usize },

    #[error("too many signatures: {0}")]
    TooManySignatures(usize),

    // ── Wire formats ────────────────────────────────────────────────────
    #[error("expected {expected} bytes, got {got}")]
    Length { expected: usize, got: usize },

    #[error("malformed encoding: {0}")]
    Malformed(String),

    // ── Escrow ──────────────────────────────────────────────────────────
    #[error("amount must be positive")]
    ZeroAmount,

    #[error("address must not be empty")]
    EmptyAddress,

    #[error("address longer than 255 bytes: {0}")]
    AddressTooLong(usize),

    #[error("escrow {0} not found")]
    EscrowNotFound(u64),

    #[error("escrow {0} already exists")]
    EscrowExists(u64),

    #[error("escrow {id} is {state:?}, not funded")]
    NotFunded { id: u64, state: EscrowState },

    #[error("release condition not met: {0}")]
    ConditionNotMet(String),

    #[error("refund not possible before block {refund_after}")]
    RefundTooEarly { refund_after: BlockHeight },

    #[error("escrow id space exhausted")]
    IdOverflow,
}
