//! Monetary unit system for the Polis chain.
//!
//! Three native assets in fixed integer ratio:
//! `1 TALANTON = 6000 DRACHMA = 36000 OBOLOS`.
//!
//! Every financial quantity is a raw `u64` in minor units (`10^8` per token),
//! and every operation on one is checked: overflow, underflow and division by
//! zero surface as [`ArithError`] instead of wrapping.

pub mod denomination;
pub mod error;
pub mod safe_arith;
pub mod spec;
pub mod units;

pub use denomination::{Denomination, DenominationTable, FormattedAmount};
pub use error::{ArithError, MonetaryError};
pub use spec::{
    monetary_spec_hash, monetary_spec_hash_hex, monetary_spec_payload,
    validate_monetary_invariants, MonetarySpec,
};
pub use units::{convert, RoundingMode, DR_PER_TAL, OB_PER_DR, OB_PER_TAL};
