//! Governance configuration with TOML support.
//!
//! Every field has a serde default, so an empty document yields the
//! standard chain parameters.

use serde::{Deserialize, Serialize};

use crate::anti_whale::AntiWhaleConfig;
use crate::boule::BouleConfig;
use crate::error::GovernanceError;
use crate::ostracism::OstracismConfig;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default)]
    pub voting: VotingConfig,
    #[serde(default)]
    pub staking: StakingConfig,
    #[serde(default)]
    pub anti_whale: AntiWhaleConfig,
    #[serde(default)]
    pub boule: BouleConfig,
    #[serde(default)]
    pub ostracism: OstracismConfig,
    #[serde(default)]
    pub delegation: DelegationConfig,
    #[serde(default)]
    pub treasury: TreasuryConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingConfig {
    /// Blocks between creation and the start of voting.
    #[serde(default = "default_voting_delay")]
    pub voting_delay: u64,
    #[serde(default = "default_voting_period")]
    pub voting_period: u64,
    #[serde(default)]
    pub default_quorum: u64,
    /// Percent.
    #[serde(default = "default_threshold")]
    pub default_threshold: u64,
    /// Percent, for CONSTITUTIONAL proposals.
    #[serde(default = "default_constitutional_threshold")]
    pub constitutional_threshold: u64,
    #[serde(default = "default_veto_threshold_bps")]
    pub veto_threshold_bps: u64,
    #[serde(default = "default_execution_delay")]
    pub execution_delay: u64,
    /// Untallied proposals read as expired this many blocks after voting ends.
    #[serde(default = "default_expiry_horizon")]
    pub expiry_horizon: u64,
    /// Attach the anti-whale guard to the voting system.
    #[serde(default = "default_true")]
    pub anti_whale_enabled: bool,
    /// Freeze voting power per proposal.
    #[serde(default = "default_true")]
    pub snapshots_enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingConfig {
    #[serde(default = "default_unstake_cooldown")]
    pub unstake_cooldown: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationConfig {
    #[serde(default = "default_max_delegatees")]
    pub max_delegatees: usize,
}

/// Genesis balances per treasury track.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryConfig {
    #[serde(default)]
    pub core_development: u64,
    #[serde(default)]
    pub grants: u64,
    #[serde(default)]
    pub operations: u64,
    #[serde(default)]
    pub emergency: u64,
    #[serde(default)]
    pub uncategorized: u64,
    #[serde(default)]
    pub reserve: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_voting_delay() -> u64 {
    100
}

fn default_voting_period() -> u64 {
    10_000
}

fn default_threshold() -> u64 {
    50
}

fn default_constitutional_threshold() -> u64 {
    66
}

fn default_veto_threshold_bps() -> u64 {
    3334
}

fn default_execution_delay() -> u64 {
    1000
}

fn default_expiry_horizon() -> u64 {
    100_000
}

fn default_true() -> bool {
    true
}

fn default_unstake_cooldown() -> u64 {
    1000
}

fn default_max_delegatees() -> usize {
    64
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            voting_delay: default_voting_delay(),
            voting_period: default_voting_period(),
            default_quorum: 0,
            default_threshold: default_threshold(),
            constitutional_threshold: default_constitutional_threshold(),
            veto_threshold_bps: default_veto_threshold_bps(),
            execution_delay: default_execution_delay(),
            expiry_horizon: default_expiry_horizon(),
            anti_whale_enabled: true,
            snapshots_enabled: true,
        }
    }
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            unstake_cooldown: default_unstake_cooldown(),
        }
    }
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            max_delegatees: default_max_delegatees(),
        }
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl GovernanceConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, GovernanceError> {
        let config: Self = toml::from_str(s).map_err(|e| GovernanceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, GovernanceError> {
        toml::to_string_pretty(self).map_err(|e| GovernanceError::Config(e.to_string()))
    }

    /// Reject combinations the voting system cannot run with.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        let v = &self.voting;
        if v.voting_period == 0 {
            return Err(GovernanceError::Config("voting_period must be > 0".into()));
        }
        for (name, pct) in [
            ("default_threshold", v.default_threshold),
            ("constitutional_threshold", v.constitutional_threshold),
        ] {
            if pct == 0 || pct > 100 {
                return Err(GovernanceError::Config(format!("{name} must be in 1..=100, got {pct}")));
            }
        }
        if v.veto_threshold_bps == 0 || v.veto_threshold_bps > 10_000 {
            return Err(GovernanceError::Config(format!(
                "veto_threshold_bps must be in 1..=10000, got {}",
                v.veto_threshold_bps
            )));
        }
        if self.anti_whale.whale_threshold_bps > 10_000 {
            return Err(GovernanceError::Config("whale_threshold_bps must be <= 10000".into()));
        }
        if self.delegation.max_delegatees == 0 {
            return Err(GovernanceError::Config("max_delegatees must be > 0".into()));
        }
        Ok(())
    }
}
