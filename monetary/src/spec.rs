//! The monetary spec hash: a stable fingerprint of decimals and ratios.
//!
//! Clients compare the hash at startup to confirm that they and the node agree
//! on the unit system. FNV-1a is a consistency check, not a commitment.

use crate::denomination::{Denomination, DenominationTable};
use crate::units::{DR_PER_TAL, OB_PER_DR, OB_PER_TAL};
use polis_crypto::fnv1a_64;
use polis_types::AssetId;
use serde::Serialize;

/// The canonical ASCII payload that the spec hash covers.
pub fn monetary_spec_payload() -> String {
    format!(
        "TAL_DECIMALS={};DR_DECIMALS={};OB_DECIMALS={};RATIO_DR_PER_TAL={};RATIO_OB_PER_DR={};RATIO_OB_PER_TAL={}",
        AssetId::Talanton.decimals(),
        AssetId::Drachma.decimals(),
        AssetId::Obolos.decimals(),
        DR_PER_TAL,
        OB_PER_DR,
        OB_PER_TAL,
    )
}

/// FNV-1a 64 of [`monetary_spec_payload`].
pub fn monetary_spec_hash() -> u64 {
    fnv1a_64(monetary_spec_payload().as_bytes())
}

/// The spec hash as 16 lower-case hex characters.
pub fn monetary_spec_hash_hex() -> String {
    format!("{:016x}", monetary_spec_hash())
}

/// `DR_PER_TAL * OB_PER_DR == OB_PER_TAL` and all base units equal.
pub fn validate_monetary_invariants() -> bool {
    let ratios_agree = DR_PER_TAL.checked_mul(OB_PER_DR) == Some(OB_PER_TAL);
    let base = AssetId::Talanton.base_unit();
    let bases_agree = AssetId::ALL.iter().all(|a| a.base_unit() == base);
    ratios_agree && bases_agree
}

#[derive(Clone, Debug, Serialize)]
pub struct Ratios {
    pub dr_per_tal: u64,
    pub ob_per_dr: u64,
    pub ob_per_tal: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct UnitEntry {
    pub asset: &'static str,
    pub symbol: &'static str,
    pub base_unit: u64,
    pub decimals: u32,
}

/// Everything a client needs to check agreement with the node.
#[derive(Clone, Debug, Serialize)]
pub struct MonetarySpec {
    pub spec_hash: String,
    pub payload: String,
    pub ratios: Ratios,
    pub decimals: Vec<(String, u32)>,
    pub unit_table: Vec<UnitEntry>,
    pub denominations: Vec<Denomination>,
}

impl MonetarySpec {
    pub fn current(table: &DenominationTable) -> Self {
        Self {
            spec_hash: monetary_spec_hash_hex(),
            payload: monetary_spec_payload(),
            ratios: Ratios {
                dr_per_tal: DR_PER_TAL,
                ob_per_dr: OB_PER_DR,
                ob_per_tal: OB_PER_TAL,
            },
            decimals: AssetId::ALL
                .iter()
                .map(|a| (a.symbol().to_string(), a.decimals()))
                .collect(),
            unit_table: AssetId::ALL
                .iter()
                .map(|a| UnitEntry {
                    asset: a.name(),
                    symbol: a.symbol(),
                    base_unit: a.base_unit(),
                    decimals: a.decimals(),
                })
                .collect(),
            denominations: table.entries().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_exact() {
        assert_eq!(
            monetary_spec_payload(),
            "TAL_DECIMALS=8;DR_DECIMALS=8;OB_DECIMALS=8;RATIO_DR_PER_TAL=6000;RATIO_OB_PER_DR=6;RATIO_OB_PER_TAL=36000"
        );
    }

    #[test]
    fn hash_is_stable_hex() {
        let hex = monetary_spec_hash_hex();
        assert_eq!(hex.len(), 16);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hex, monetary_spec_hash_hex());
        assert_eq!(u64::from_str_radix(&hex, 16).unwrap(), monetary_spec_hash());
    }

    #[test]
    fn invariants_hold() {
        assert!(validate_monetary_invariants());
    }

    #[test]
    fn spec_summary_serializes() {
        let spec = MonetarySpec::current(&DenominationTable::standard());
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["ratios"]["ob_per_tal"], 36000);
        assert_eq!(json["unit_table"].as_array().unwrap().len(), 3);
        assert_eq!(json["spec_hash"], monetary_spec_hash_hex());
    }
}
