//! Fundamental types for the Polis chain.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! governance addresses, compressed settlement keys, the three native asset
//! identifiers, and block heights.

pub mod address;
pub mod asset;
pub mod error;
pub mod keys;

pub use address::Address;
pub use asset::AssetId;
pub use error::TypesError;
pub use keys::CompressedPubKey;

/// Block height. Governance measures every period and delay in blocks.
pub type BlockHeight = u64;
