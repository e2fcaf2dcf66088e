//! Governable parameters.
//!
//! Executed PARAMETER_CHANGE proposals go through [`GovParams::update`].
//! [`ParamStore`] keeps each key's bounds and the full change history.

use crate::error::GovernanceError;
use polis_types::BlockHeight;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const VOTING_PERIOD: &str = "voting_period";
pub const DEFAULT_QUORUM: &str = "default_quorum";
pub const DEFAULT_THRESHOLD: &str = "default_threshold";
pub const VETO_THRESHOLD_BPS: &str = "veto_threshold_bps";
pub const EXECUTION_DELAY: &str = "execution_delay";

/// Parameter sink consumed by proposal execution.
pub trait GovParams {
    fn update(
        &mut self,
        key: &str,
        value: u64,
        proposal_id: u64,
        block: BlockHeight,
    ) -> Result<(), GovernanceError>;

    fn get(&self, key: &str) -> Option<u64>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct ParamEntry {
    value: u64,
    min: u64,
    max: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamChange {
    pub key: String,
    pub old_value: u64,
    pub new_value: u64,
    pub proposal_id: u64,
    pub block: BlockHeight,
}

#[derive(Clone, Debug, Default)]
pub struct ParamStore {
    entries: BTreeMap<String, ParamEntry>,
    history: Vec<ParamChange>,
}

impl ParamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register) a key with its inclusive bounds.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        value: u64,
        min: u64,
        max: u64,
    ) -> Result<(), GovernanceError> {
        let key = key.into();
        if value < min || value > max {
            return Err(GovernanceError::ParameterOutOfRange {
                key,
                value,
                min,
                max,
            });
        }
        self.entries.insert(key, ParamEntry { value, min, max });
        Ok(())
    }

    /// The voting parameters that the voting system re-reads after a change.
    pub fn with_voting_defaults(
        voting_period: u64,
        default_quorum: u64,
        default_threshold: u64,
        veto_threshold_bps: u64,
        execution_delay: u64,
    ) -> Result<Self, GovernanceError> {
        let mut store = Self::new();
        store.register(VOTING_PERIOD, voting_period, 1, 10_000_000)?;
        store.register(DEFAULT_QUORUM, default_quorum, 0, u64::MAX)?;
        store.register(DEFAULT_THRESHOLD, default_threshold, 1, 100)?;
        store.register(VETO_THRESHOLD_BPS, veto_threshold_bps, 1, 10_000)?;
        store.register(EXECUTION_DELAY, execution_delay, 0, 10_000_000)?;
        Ok(store)
    }

    pub fn bounds(&self, key: &str) -> Option<(u64, u64)> {
        self.entries.get(key).map(|e| (e.min, e.max))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn history(&self) -> &[ParamChange] {
        &self.history
    }
}

impl GovParams for ParamStore {
    fn update(
        &mut self,
        key: &str,
        value: u64,
        proposal_id: u64,
        block: BlockHeight,
    ) -> Result<(), GovernanceError> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| GovernanceError::UnknownParameter(key.to_string()))?;
        if value < entry.min || value > entry.max {
            return Err(GovernanceError::ParameterOutOfRange {
                key: key.to_string(),
                value,
                min: entry.min,
                max: entry.max,
            });
        }
        let old_value = std::mem::replace(&mut entry.value, value);
        self.history.push(ParamChange {
            key: key.to_string(),
            old_value,
            new_value: value,
            proposal_id,
            block,
        });
        tracing::info!(key, old_value, new_value = value, proposal_id, "parameter changed");
        Ok(())
    }

    fn get(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|e| e.value)
    }
}
