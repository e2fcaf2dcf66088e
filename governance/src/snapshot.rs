//! Per-proposal voting power snapshots.
//!
//! A snapshot is taken once, when the proposal is created, and is immutable
//! afterwards: stake acquired after that point does not count.

use crate::error::GovernanceError;
use polis_monetary::safe_arith;
use polis_types::{Address, BlockHeight};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub proposal_id: u64,
    pub block_height: BlockHeight,
    pub total_power: u64,
    /// Ordered entries, every power > 0.
    pub entries: Vec<(Address, u64)>,
    #[serde(skip)]
    index: HashMap<Address, u64>,
}

impl Snapshot {
    fn build(
        proposal_id: u64,
        block_height: BlockHeight,
        powers: Vec<(Address, u64)>,
    ) -> Result<Self, GovernanceError> {
        let entries: Vec<(Address, u64)> = powers.into_iter().filter(|(_, p)| *p > 0).collect();
        let total_power = safe_arith::sum(entries.iter().map(|(_, p)| *p))?;
        let index = entries.iter().cloned().collect();
        Ok(Self {
            proposal_id,
            block_height,
            total_power,
            entries,
            index,
        })
    }

    /// Frozen power of `address`, 0 if absent.
    pub fn power(&self, address: &Address) -> u64 {
        if self.index.is_empty() && !self.entries.is_empty() {
            // Deserialized without the index.
            return self
                .entries
                .iter()
                .find(|(a, _)| a == address)
                .map_or(0, |(_, p)| *p);
        }
        self.index.get(address).copied().unwrap_or(0)
    }
}

#[derive(Default)]
pub struct SnapshotRegistry {
    snapshots: HashMap<u64, Snapshot>,
}

impl SnapshotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze `powers` for `proposal_id`. Fails if one already exists or the
    /// total overflows.
    pub fn create(
        &mut self,
        proposal_id: u64,
        block: BlockHeight,
        powers: Vec<(Address, u64)>,
    ) -> Result<&Snapshot, GovernanceError> {
        if self.snapshots.contains_key(&proposal_id) {
            return Err(GovernanceError::SnapshotExists(proposal_id));
        }
        let snapshot = Snapshot::build(proposal_id, block, powers)?;
        tracing::debug!(
            proposal_id,
            block,
            voters = snapshot.entries.len(),
            total_power = snapshot.total_power,
            "snapshot taken"
        );
        Ok(self.snapshots.entry(proposal_id).or_insert(snapshot))
    }

    pub fn get(&self, proposal_id: u64) -> Option<&Snapshot> {
        self.snapshots.get(&proposal_id)
    }

    pub fn contains(&self, proposal_id: u64) -> bool {
        self.snapshots.contains_key(&proposal_id)
    }

    /// Power of `address` in the snapshot for `proposal_id`; 0 if either is missing.
    pub fn power(&self, proposal_id: u64, address: &Address) -> u64 {
        self.snapshots
            .get(&proposal_id)
            .map_or(0, |s| s.power(address))
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
