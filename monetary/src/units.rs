//! Fixed-ratio conversions between TALANTON, DRACHMA and OBOLOS.
//!
//! All conversions operate on raw minor units. Upward conversions
//! (TAL→DR, DR→OB, TAL→OB) multiply and can only overflow; downward
//! conversions divide and take a [`RoundingMode`].

use crate::error::ArithError;
use crate::safe_arith;
use polis_types::AssetId;
use serde::{Deserialize, Serialize};

pub const DR_PER_TAL: u64 = 6000;
pub const OB_PER_DR: u64 = 6;
pub const OB_PER_TAL: u64 = 36000;

const _: () = assert!(DR_PER_TAL * OB_PER_DR == OB_PER_TAL);

/// How a downward conversion treats the remainder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundingMode {
    /// Truncate toward zero.
    #[default]
    Floor,
    /// Round half to even: compare the doubled remainder with the divisor.
    Bankers,
}

/// Divide `n` by `d` under the given rounding mode.
pub fn divide_rounded(n: u64, d: u64, mode: RoundingMode) -> Result<u64, ArithError> {
    let q = safe_arith::div(n, d)?;
    if mode == RoundingMode::Floor {
        return Ok(q);
    }
    let doubled = u128::from(n % d) * 2;
    let d = u128::from(d);
    if doubled > d || (doubled == d && q % 2 == 1) {
        safe_arith::add(q, 1)
    } else {
        Ok(q)
    }
}

pub fn tal_to_dr(tal: u64) -> Result<u64, ArithError> {
    safe_arith::mul(tal, DR_PER_TAL)
}

pub fn dr_to_ob(dr: u64) -> Result<u64, ArithError> {
    safe_arith::mul(dr, OB_PER_DR)
}

pub fn tal_to_ob(tal: u64) -> Result<u64, ArithError> {
    safe_arith::mul(tal, OB_PER_TAL)
}

pub fn dr_to_tal(dr: u64, mode: RoundingMode) -> Result<u64, ArithError> {
    divide_rounded(dr, DR_PER_TAL, mode)
}

pub fn ob_to_dr(ob: u64, mode: RoundingMode) -> Result<u64, ArithError> {
    divide_rounded(ob, OB_PER_DR, mode)
}

pub fn ob_to_tal(ob: u64, mode: RoundingMode) -> Result<u64, ArithError> {
    divide_rounded(ob, OB_PER_TAL, mode)
}

/// Obols per one unit of `asset`.
fn obols_per(asset: AssetId) -> u64 {
    match asset {
        AssetId::Talanton => OB_PER_TAL,
        AssetId::Drachma => OB_PER_DR,
        AssetId::Obolos => 1,
    }
}

/// Convert a raw amount of `from` into raw units of `to`.
pub fn convert(
    amount: u64,
    from: AssetId,
    to: AssetId,
    mode: RoundingMode,
) -> Result<u64, ArithError> {
    let (from_ob, to_ob) = (obols_per(from), obols_per(to));
    if from_ob >= to_ob {
        safe_arith::mul(amount, from_ob / to_ob)
    } else {
        divide_rounded(amount, to_ob / from_ob, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polis_types::asset::BASE_UNIT;

    #[test]
    fn one_talanton_in_drachma_and_back() {
        let dr = tal_to_dr(BASE_UNIT).unwrap();
        assert_eq!(dr, 6000 * BASE_UNIT);
        assert_eq!(dr_to_tal(dr, RoundingMode::Floor).unwrap(), BASE_UNIT);
    }

    #[test]
    fn upward_conversions_overflow() {
        assert_eq!(tal_to_dr(u64::MAX), Err(ArithError::Overflow));
        assert_eq!(tal_to_ob(u64::MAX / 1000), Err(ArithError::Overflow));
        assert_eq!(dr_to_ob(u64::MAX / 2), Err(ArithError::Overflow));
    }

    #[test]
    fn bankers_rounding() {
        // 15 / 6 = 2.5 -> 2 (even), 21 / 6 = 3.5 -> 4 (even)
        assert_eq!(ob_to_dr(15, RoundingMode::Bankers).unwrap(), 2);
        assert_eq!(ob_to_dr(21, RoundingMode::Bankers).unwrap(), 4);
        // 16 / 6 = 2.67 -> 3, 13 / 6 = 2.17 -> 2
        assert_eq!(ob_to_dr(16, RoundingMode::Bankers).unwrap(), 3);
        assert_eq!(ob_to_dr(13, RoundingMode::Bankers).unwrap(), 2);
        assert_eq!(ob_to_dr(16, RoundingMode::Floor).unwrap(), 2);
    }

    #[test]
    fn bankers_near_max() {
        assert!(divide_rounded(u64::MAX, 2, RoundingMode::Bankers).is_ok());
        assert_eq!(divide_rounded(1, 0, RoundingMode::Bankers), Err(ArithError::DivByZero));
    }

    #[test]
    fn general_convert_matches_specific() {
        let mode = RoundingMode::Floor;
        assert_eq!(convert(7, AssetId::Talanton, AssetId::Obolos, mode), tal_to_ob(7));
        assert_eq!(convert(72_001, AssetId::Obolos, AssetId::Talanton, mode), Ok(2));
        assert_eq!(convert(13, AssetId::Drachma, AssetId::Drachma, mode), Ok(13));
        assert_eq!(convert(12_000, AssetId::Drachma, AssetId::Talanton, mode), Ok(2));
    }
}
