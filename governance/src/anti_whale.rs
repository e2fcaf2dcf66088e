//! Anti-plutocracy scaling of voting power.

use polis_monetary::safe_arith::isqrt;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntiWhaleConfig {
    #[serde(default = "default_true")]
    pub quadratic_enabled: bool,
    /// 0 disables the cap.
    #[serde(default)]
    pub max_cap: u64,
    #[serde(default = "default_whale_threshold_bps")]
    pub whale_threshold_bps: u64,
}

fn default_true() -> bool {
    true
}

fn default_whale_threshold_bps() -> u64 {
    1000
}

impl Default for AntiWhaleConfig {
    fn default() -> Self {
        Self {
            quadratic_enabled: true,
            max_cap: 0,
            whale_threshold_bps: default_whale_threshold_bps(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AntiWhaleGuard {
    config: AntiWhaleConfig,
}

impl AntiWhaleGuard {
    pub fn new(config: AntiWhaleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AntiWhaleConfig {
        &self.config
    }

    /// Scaled power: `isqrt(raw)` when quadratic, then capped.
    ///
    /// `_total_supply` is part of the ballot context but does not affect the
    /// current scaling rule.
    pub fn effective_power(&self, raw: u64, _total_supply: u64) -> u64 {
        let mut p = if self.config.quadratic_enabled {
            isqrt(raw)
        } else {
            raw
        };
        if self.config.max_cap > 0 && p > self.config.max_cap {
            p = self.config.max_cap;
        }
        p
    }

    /// `raw * 10000 > total_supply * whale_threshold_bps`, both sides saturating.
    pub fn is_whale(&self, raw: u64, total_supply: u64) -> bool {
        raw.saturating_mul(10_000) > total_supply.saturating_mul(self.config.whale_threshold_bps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_then_cap() {
        let guard = AntiWhaleGuard::default();
        assert_eq!(guard.effective_power(10_000, 0), 100);
        assert_eq!(guard.effective_power(99, 0), 9);

        let capped = AntiWhaleGuard::new(AntiWhaleConfig {
            quadratic_enabled: true,
            max_cap: 50,
            whale_threshold_bps: 1000,
        });
        assert_eq!(capped.effective_power(10_000, 0), 50);

        let linear = AntiWhaleGuard::new(AntiWhaleConfig {
            quadratic_enabled: false,
            max_cap: 0,
            whale_threshold_bps: 1000,
        });
        assert_eq!(linear.effective_power(10_000, 0), 10_000);
    }

    #[test]
    fn whale_detection() {
        let guard = AntiWhaleGuard::default();
        // 10% threshold
        assert!(!guard.is_whale(100, 1000));
        assert!(guard.is_whale(101, 1000));
        assert!(guard.is_whale(1, 0));
    }

    #[test]
    fn whale_detection_saturates() {
        let guard = AntiWhaleGuard::default();
        // Both sides saturate to u64::MAX, so neither is strictly greater.
        assert!(!guard.is_whale(u64::MAX, u64::MAX));
        assert!(guard.is_whale(u64::MAX, 1));
    }
}
