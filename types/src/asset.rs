//! The three native assets.
//!
//! 1 TALANTON = 6000 DRACHMA = 36000 OBOLOS. Every asset is stored in raw
//! minor units with the same scale (`10^8` raw per whole token).

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw minor units per whole token, identical for all three assets.
pub const BASE_UNIT: u64 = 100_000_000;

/// Decimal places of the raw representation.
pub const DECIMALS: u32 = 8;

/// Closed set of native assets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssetId {
    Talanton,
    Drachma,
    Obolos,
}

impl AssetId {
    pub const ALL: [AssetId; 3] = [AssetId::Talanton, AssetId::Drachma, AssetId::Obolos];

    /// Ticker symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Talanton => "TAL",
            Self::Drachma => "DR",
            Self::Obolos => "OB",
        }
    }

    /// Upper-case asset name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Talanton => "TALANTON",
            Self::Drachma => "DRACHMA",
            Self::Obolos => "OBOLOS",
        }
    }

    pub fn base_unit(&self) -> u64 {
        BASE_UNIT
    }

    pub fn decimals(&self) -> u32 {
        DECIMALS
    }

    /// Single-byte tag used by settlement wire formats.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Talanton => 0,
            Self::Drachma => 1,
            Self::Obolos => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Talanton),
            1 => Some(Self::Drachma),
            2 => Some(Self::Obolos),
            _ => None,
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssetId {
    type Err = TypesError;

    /// Accepts either the name or the symbol, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|a| a.name() == upper || a.symbol() == upper)
            .ok_or_else(|| TypesError::UnknownAsset(s.to_string()))
    }
}
