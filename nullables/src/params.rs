//! Nullable parameter sink.

use polis_governance::{GovParams, GovernanceError};
use std::collections::BTreeMap;

/// Accepts any key and records every update in order.
#[derive(Default)]
pub struct RecordingParams {
    values: BTreeMap<String, u64>,
    /// (key, value, proposal_id, block)
    pub updates: Vec<(String, u64, u64, u64)>,
    /// When set, every update fails with `UnknownParameter`.
    pub fail: bool,
}

impl RecordingParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl GovParams for RecordingParams {
    fn update(&mut self, key: &str, value: u64, proposal_id: u64, block: u64) -> Result<(), GovernanceError> {
        if self.fail {
            return Err(GovernanceError::UnknownParameter(key.to_string()));
        }
        self.values.insert(key.to_string(), value);
        self.updates.push((key.to_string(), value, proposal_id, block));
        Ok(())
    }

    fn get(&self, key: &str) -> Option<u64> {
        self.values.get(key).copied()
    }
}
