//! Display denominations: rendering and parsing raw amounts in named units.
//!
//! One unit of a denomination is worth `numerator / denominator` whole tokens
//! of its asset. Formatting computes
//! `raw * denominator * 10^decimals / (base_unit * numerator)` and flags the
//! result as approximate when that division is inexact. Parsing is the exact
//! inverse and refuses anything that would not land on a whole raw unit.

use crate::error::MonetaryError;
use polis_types::AssetId;
use serde::Serialize;
use std::fmt;

/// A named display unit for one asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Denomination {
    pub asset: AssetId,
    pub name: &'static str,
    pub numerator: u64,
    pub denominator: u64,
    pub allowed_decimals: u32,
    pub allow_input: bool,
    pub approximate_display: bool,
    pub aliases: &'static [&'static str],
}

/// A rendered amount. `approximate` is set when the conversion was inexact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormattedAmount {
    pub text: String,
    pub approximate: bool,
}

impl fmt::Display for FormattedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.approximate {
            write!(f, "~{}", self.text)
        } else {
            f.write_str(&self.text)
        }
    }
}

impl Denomination {
    /// Whether `name` matches this denomination's name or an alias.
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    fn scale(&self) -> u128 {
        10u128.pow(self.allowed_decimals)
    }

    /// Render a raw amount in this denomination.
    pub fn format(&self, raw: u64) -> Result<FormattedAmount, MonetaryError> {
        let scale = self.scale();
        let num = u128::from(raw)
            .checked_mul(u128::from(self.denominator))
            .and_then(|v| v.checked_mul(scale))
            .ok_or(crate::ArithError::Overflow)?;
        let den = u128::from(self.asset.base_unit()) * u128::from(self.numerator);
        if den == 0 {
            return Err(crate::ArithError::DivByZero.into());
        }
        let value = num / den;
        let approximate = num % den != 0;
        Ok(FormattedAmount {
            text: render_fixed(value, scale, self.allowed_decimals),
            approximate,
        })
    }

    /// Parse a decimal string in this denomination into raw units.
    pub fn parse(&self, text: &str) -> Result<u64, MonetaryError> {
        if !self.allow_input {
            return Err(MonetaryError::InputNotAllowed(self.name.to_string()));
        }
        let text = text.trim();
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, f),
            None => (text, ""),
        };
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
            || (text.ends_with('.') && frac_part.is_empty())
        {
            return Err(MonetaryError::Malformed(text.to_string()));
        }
        if frac_part.len() > self.allowed_decimals as usize {
            return Err(MonetaryError::TooManyDecimals {
                got: frac_part.len(),
                allowed: self.allowed_decimals,
            });
        }

        let overflow = || MonetaryError::from(crate::ArithError::Overflow);
        let int_value: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let frac_value: u128 = if frac_part.is_empty() {
            0
        } else {
            let pad = 10u128.pow(self.allowed_decimals - frac_part.len() as u32);
            frac_part.parse::<u128>().map_err(|_| overflow())? * pad
        };
        let value = int_value
            .checked_mul(self.scale())
            .and_then(|v| v.checked_add(frac_value))
            .ok_or_else(overflow)?;

        let raw_num = value
            .checked_mul(u128::from(self.asset.base_unit()))
            .and_then(|v| v.checked_mul(u128::from(self.numerator)))
            .ok_or_else(overflow)?;
        let raw_den = u128::from(self.denominator) * self.scale();
        if raw_den == 0 {
            return Err(crate::ArithError::DivByZero.into());
        }
        if raw_num % raw_den != 0 {
            return Err(MonetaryError::NotRepresentable(text.to_string()));
        }
        u64::try_from(raw_num / raw_den).map_err(|_| overflow())
    }
}

/// Render `value / scale` with trailing fractional zeros removed.
fn render_fixed(value: u128, scale: u128, decimals: u32) -> String {
    let int = value / scale;
    let frac = value % scale;
    if decimals == 0 || frac == 0 {
        return int.to_string();
    }
    let digits = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", int, digits.trim_end_matches('0'))
}

#[allow(clippy::too_many_arguments)]
const fn d(
    asset: AssetId,
    name: &'static str,
    numerator: u64,
    denominator: u64,
    allowed_decimals: u32,
    allow_input: bool,
    approximate_display: bool,
    aliases: &'static [&'static str],
) -> Denomination {
    Denomination {
        asset,
        name,
        numerator,
        denominator,
        allowed_decimals,
        allow_input,
        approximate_display,
        aliases,
    }
}

/// The set of denominations known to the chain.
#[derive(Clone, Debug, Serialize)]
pub struct DenominationTable {
    entries: Vec<Denomination>,
}

impl DenominationTable {
    pub fn new(entries: Vec<Denomination>) -> Self {
        Self { entries }
    }

    /// The chain's standard units.
    pub fn standard() -> Self {
        Self::new(vec![
            d(AssetId::Talanton, "talanton", 1, 1, 8, true, false, &["tal", "talent"]),
            d(AssetId::Talanton, "mina", 1, 60, 6, true, true, &["minae"]),
            d(AssetId::Drachma, "drachma", 1, 1, 8, true, false, &["dr", "drachmae"]),
            d(AssetId::Drachma, "obol", 1, 6, 8, false, true, &["obols"]),
            d(AssetId::Drachma, "tetradrachm", 4, 1, 8, true, false, &["tetra"]),
            d(AssetId::Drachma, "mina", 100, 1, 8, true, false, &["minae"]),
            d(AssetId::Obolos, "obolos", 1, 1, 8, true, false, &["ob", "obol"]),
            d(AssetId::Obolos, "chalkous", 1, 8, 8, false, true, &["chalkoi"]),
        ])
    }

    pub fn entries(&self) -> &[Denomination] {
        &self.entries
    }

    pub fn for_asset(&self, asset: AssetId) -> impl Iterator<Item = &Denomination> {
        self.entries.iter().filter(move |d| d.asset == asset)
    }

    /// Find a denomination of `asset` by name or alias (case-insensitive).
    pub fn find(&self, asset: AssetId, name: &str) -> Result<&Denomination, MonetaryError> {
        self.for_asset(asset)
            .find(|d| d.matches(name))
            .ok_or_else(|| MonetaryError::UnknownDenomination {
                asset: asset.name().to_string(),
                name: name.to_string(),
            })
    }

    /// The 1:1 denomination of `asset`.
    pub fn base(&self, asset: AssetId) -> Option<&Denomination> {
        self.for_asset(asset)
            .find(|d| d.numerator == 1 && d.denominator == 1)
    }
}

impl Default for DenominationTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polis_types::asset::BASE_UNIT;

    fn table() -> DenominationTable {
        DenominationTable::standard()
    }

    #[test]
    fn drachma_parse_and_format() {
        let t = table();
        let dr = t.base(AssetId::Drachma).unwrap();
        let raw = dr.parse("1.23456789").unwrap();
        assert_eq!(raw, 123_456_789);
        let out = dr.format(raw).unwrap();
        assert_eq!(out.text, "1.23456789");
        assert!(!out.approximate);
    }

    #[test]
    fn trailing_zeros_normalised() {
        let dr = table().base(AssetId::Drachma).cloned().unwrap();
        let raw = dr.parse("2.50").unwrap();
        assert_eq!(dr.format(raw).unwrap().text, "2.5");
        assert_eq!(dr.format(BASE_UNIT).unwrap().text, "1");
        assert_eq!(dr.format(0).unwrap().text, "0");
    }

    #[test]
    fn sub_denomination_formats_exactly() {
        let t = table();
        let obol = t.find(AssetId::Drachma, "OBOL").unwrap();
        let out = obol.format(BASE_UNIT).unwrap();
        assert_eq!(out.text, "6");
        assert!(!out.approximate);
    }

    #[test]
    fn inexact_format_flagged() {
        let t = table();
        let tetra = t.find(AssetId::Drachma, "tetra").unwrap();
        assert_eq!(tetra.format(BASE_UNIT).unwrap().text, "0.25");
        let odd = tetra.format(3).unwrap();
        assert!(odd.approximate);
        assert_eq!(odd.to_string(), "~0");
    }

    #[test]
    fn input_disallowed() {
        let t = table();
        let obol = t.find(AssetId::Drachma, "obol").unwrap();
        assert_eq!(
            obol.parse("1"),
            Err(MonetaryError::InputNotAllowed("obol".to_string()))
        );
    }

    #[test]
    fn unrepresentable_rejected() {
        let t = table();
        let mina = t.find(AssetId::Talanton, "mina").unwrap();
        assert!(matches!(mina.parse("1"), Err(MonetaryError::NotRepresentable(_))));
        // 3 minae = 1/20 talent = 5_000_000 raw
        assert_eq!(mina.parse("3").unwrap(), 5_000_000);
    }

    #[test]
    fn malformed_inputs() {
        let dr = table().base(AssetId::Drachma).cloned().unwrap();
        for bad in ["", ".", "1.", "-1", "1.2.3", "abc", "1e5"] {
            assert!(dr.parse(bad).is_err(), "{bad:?} should be rejected");
        }
        assert_eq!(dr.parse(".5").unwrap(), 50_000_000);
        assert!(matches!(
            dr.parse("1.123456789"),
            Err(MonetaryError::TooManyDecimals { got: 9, allowed: 8 })
        ));
    }

    #[test]
    fn parse_overflow() {
        let dr = table().base(AssetId::Drachma).cloned().unwrap();
        assert!(dr.parse("184467440737.09551616").is_err());
        assert_eq!(dr.parse("184467440737.09551615").unwrap(), u64::MAX);
    }

    #[test]
    fn unknown_denomination() {
        assert!(table().find(AssetId::Obolos, "mina").is_err());
    }
}
