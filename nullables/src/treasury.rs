//! Nullable treasury.

use polis_governance::{GovernanceError, SpendRecord, Treasury, TreasuryTrack};
use polis_types::{Address, BlockHeight};

/// Records spends without tracking balances.
#[derive(Default)]
pub struct RecordingTreasury {
    pub spends: Vec<SpendRecord>,
    /// When set, every spend fails as if the track were empty.
    pub fail: bool,
}

impl RecordingTreasury {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            spends: Vec::new(),
            fail: true,
        }
    }
}

impl Treasury for RecordingTreasury {
    fn spend(
        &mut self,
        amount: u64,
        recipient: &Address,
        proposal_id: u64,
        track: TreasuryTrack,
        memo: &str,
        block: BlockHeight,
    ) -> Result<(), GovernanceError> {
        if self.fail {
            return Err(GovernanceError::InsufficientTreasury {
                track: track.to_string(),
                have: 0,
                need: amount,
            });
        }
        self.spends.push(SpendRecord {
            amount,
            recipient: recipient.clone(),
            proposal_id,
            track,
            memo: memo.to_string(),
            block,
        });
        Ok(())
    }

    fn balance(&self, _track: TreasuryTrack) -> u64 {
        0
    }
}
