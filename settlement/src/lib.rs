//! Settlement primitives for Polis.
//!
//! - **Multisig**: M-of-N policies over compressed secp256k1 keys, with a
//!   compact wire format and an aggregated signature set
//! - **Escrow**: funds locked until a time lock, hash lock or arbiter
//!   signature releases them, refundable to the depositor after a deadline
//!
//! Every wire format here decodes exact lengths only and re-encodes
//! byte-identically.

pub mod error;
pub mod escrow;
pub mod multisig;

pub use error::SettlementError;
pub use escrow::{Escrow, EscrowBook, EscrowCondition, EscrowState, ReleaseWitness};
pub use multisig::{verify_multisig, AggregatedSignature, MultisigPolicy, MAX_KEYS};
