//! Staking registry: locked tokens become governance voting power.
//!
//! Voting power is `staked_amount - pending_unstake`. Unstaking is a two-step
//! process (request, then claim after the cooldown) and at most one request
//! per address may be pending at a time.

use crate::error::GovernanceError;
use polis_monetary::safe_arith;
use polis_types::{Address, BlockHeight};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Anything that can report the current (address, power) map.
///
/// The voting system freezes this map into a snapshot when a proposal is
/// created.
pub trait VotingPowerSource {
    fn voting_power(&self, address: &Address) -> u64;

    /// Entries with power > 0, in a deterministic order.
    fn all_voting_powers(&self) -> Vec<(Address, u64)>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub staked_amount: u64,
    /// 0 = never locked.
    pub locked_until_block: BlockHeight,
    pub staked_at_block: BlockHeight,
    pub pending_unstake: u64,
}

impl StakeRecord {
    pub fn voting_power(&self) -> u64 {
        self.staked_amount.saturating_sub(self.pending_unstake)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnstakeStatus {
    Pending,
    Claimed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnstakeRequest {
    pub amount: u64,
    pub requested_at: BlockHeight,
    pub claimable_at: BlockHeight,
    pub status: UnstakeStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashRecord {
    pub address: Address,
    pub amount: u64,
    pub reason: String,
    pub block: BlockHeight,
}

pub struct StakingRegistry {
    records: HashMap<Address, StakeRecord>,
    /// First-stake order; `all_voting_powers` iterates in this order.
    order: Vec<Address>,
    /// Latest request per address (pending or claimed).
    requests: HashMap<Address, UnstakeRequest>,
    slashes: Vec<SlashRecord>,
    cooldown_blocks: u64,
}

impl StakingRegistry {
    pub fn new(cooldown_blocks: u64) -> Self {
        Self {
            records: HashMap::new(),
            order: Vec::new(),
            requests: HashMap::new(),
            slashes: Vec::new(),
            cooldown_blocks,
        }
    }

    pub fn cooldown_blocks(&self) -> u64 {
        self.cooldown_blocks
    }

    /// Lock `amount` for at least `lock_period` blocks from `block`.
    pub fn stake(
        &mut self,
        address: &Address,
        amount: u64,
        lock_period: u64,
        block: BlockHeight,
    ) -> Result<(), GovernanceError> {
        if address.is_empty() {
            return Err(GovernanceError::EmptyAddress);
        }
        if amount == 0 {
            return Err(GovernanceError::ZeroAmount);
        }
        let lock_until = safe_arith::add(block, lock_period)?;

        match self.records.get_mut(address) {
            Some(record) => {
                record.staked_amount = safe_arith::add(record.staked_amount, amount)?;
                record.locked_until_block = record.locked_until_block.max(lock_until);
            }
            None => {
                self.records.insert(
                    address.clone(),
                    StakeRecord {
                        staked_amount: amount,
                        locked_until_block: lock_until,
                        staked_at_block: block,
                        pending_unstake: 0,
                    },
                );
                self.order.push(address.clone());
            }
        }
        tracing::debug!(address = %address, amount, lock_until, "stake added");
        Ok(())
    }

    /// Begin the cooldown for `amount`. Returns the block at which it becomes claimable.
    pub fn request_unstake(
        &mut self,
        address: &Address,
        amount: u64,
        block: BlockHeight,
    ) -> Result<BlockHeight, GovernanceError> {
        if amount == 0 {
            return Err(GovernanceError::ZeroAmount);
        }
        let record = self
            .records
            .get_mut(address)
            .ok_or_else(|| GovernanceError::NoStake(address.clone()))?;
        if block < record.locked_until_block {
            return Err(GovernanceError::StakeLocked {
                until: record.locked_until_block,
            });
        }
        if self
            .requests
            .get(address)
            .is_some_and(|r| r.status == UnstakeStatus::Pending)
        {
            return Err(GovernanceError::PendingUnstakeExists);
        }
        let available = record.voting_power();
        if amount > available {
            return Err(GovernanceError::InsufficientStake {
                available,
                requested: amount,
            });
        }
        let claimable_at = safe_arith::add(block, self.cooldown_blocks)?;
        record.pending_unstake = safe_arith::add(record.pending_unstake, amount)?;
        self.requests.insert(
            address.clone(),
            UnstakeRequest {
                amount,
                requested_at: block,
                claimable_at,
                status: UnstakeStatus::Pending,
            },
        );
        tracing::debug!(address = %address, amount, claimable_at, "unstake requested");
        Ok(claimable_at)
    }

    /// Release a matured unstake request. Returns the amount released.
    pub fn claim_unstake(
        &mut self,
        address: &Address,
        block: BlockHeight,
    ) -> Result<u64, GovernanceError> {
        let request = self
            .requests
            .get_mut(address)
            .filter(|r| r.status == UnstakeStatus::Pending)
            .ok_or(GovernanceError::NoPendingUnstake)?;
        if block < request.claimable_at {
            return Err(GovernanceError::CooldownActive {
                claimable_at: request.claimable_at,
            });
        }
        let record = self
            .records
            .get_mut(address)
            .ok_or_else(|| GovernanceError::NoStake(address.clone()))?;
        let staked = safe_arith::sub(record.staked_amount, request.amount)?;
        let pending = safe_arith::sub(record.pending_unstake, request.amount)?;
        record.staked_amount = staked;
        record.pending_unstake = pending;
        request.status = UnstakeStatus::Claimed;
        tracing::debug!(address = %address, amount = request.amount, "unstake claimed");
        Ok(request.amount)
    }

    /// Remove `amount` from the stake as a penalty.
    pub fn slash(
        &mut self,
        address: &Address,
        amount: u64,
        reason: &str,
        block: BlockHeight,
    ) -> Result<(), GovernanceError> {
        if amount == 0 {
            return Err(GovernanceError::ZeroAmount);
        }
        let record = self
            .records
            .get_mut(address)
            .ok_or_else(|| GovernanceError::NoStake(address.clone()))?;
        if amount > record.staked_amount {
            return Err(GovernanceError::InsufficientStake {
                available: record.staked_amount,
                requested: amount,
            });
        }
        record.staked_amount -= amount;
        if record.pending_unstake > record.staked_amount {
            record.pending_unstake = record.staked_amount;
            // Keep the pending request claimable against what is left.
            if let Some(req) = self
                .requests
                .get_mut(address)
                .filter(|r| r.status == UnstakeStatus::Pending)
            {
                req.amount = req.amount.min(record.pending_unstake);
            }
        }
        self.slashes.push(SlashRecord {
            address: address.clone(),
            amount,
            reason: reason.to_string(),
            block,
        });
        tracing::warn!(address = %address, amount, reason, block, "stake slashed");
        Ok(())
    }

    pub fn record(&self, address: &Address) -> Option<&StakeRecord> {
        self.records.get(address)
    }

    pub fn unstake_request(&self, address: &Address) -> Option<&UnstakeRequest> {
        self.requests.get(address)
    }

    pub fn slashes(&self) -> &[SlashRecord] {
        &self.slashes
    }

    pub fn total_staked(&self) -> u64 {
        self.records
            .values()
            .fold(0u64, |acc, r| acc.saturating_add(r.staked_amount))
    }

    pub fn total_voting_power(&self) -> u64 {
        self.records
            .values()
            .fold(0u64, |acc, r| acc.saturating_add(r.voting_power()))
    }

    pub fn staker_count(&self) -> usize {
        self.records.len()
    }
}

impl VotingPowerSource for StakingRegistry {
    fn voting_power(&self, address: &Address) -> u64 {
        self.records.get(address).map_or(0, StakeRecord::voting_power)
    }

    fn all_voting_powers(&self) -> Vec<(Address, u64)> {
        self.order
            .iter()
            .filter_map(|addr| {
                let power = self.records.get(addr)?.voting_power();
                (power > 0).then(|| (addr.clone(), power))
            })
            .collect()
    }
}

impl Default for StakingRegistry {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from([b; 32])
    }

    fn assert_pending_bounded(reg: &StakingRegistry, a: &Address) {
        let r = reg.record(a).unwrap();
        assert!(r.pending_unstake <= r.staked_amount);
    }

    #[test]
    fn stake_rejects_empty_and_zero() {
        let mut reg = StakingRegistry::new(10);
        assert_eq!(reg.stake(&Address::default(), 5, 0, 1), Err(GovernanceError::EmptyAddress));
        assert_eq!(reg.stake(&addr(1), 0, 0, 1), Err(GovernanceError::ZeroAmount));
    }

    #[test]
    fn stake_extends_lock() {
        let mut reg = StakingRegistry::new(10);
        let a = addr(1);
        reg.stake(&a, 100, 50, 10).unwrap();
        reg.stake(&a, 100, 5, 20).unwrap();
        let r = reg.record(&a).unwrap();
        assert_eq!(r.staked_amount, 200);
        assert_eq!(r.locked_until_block, 60);
        assert_eq!(r.staked_at_block, 10);
    }

    #[test]
    fn unstake_lifecycle() {
        let mut reg = StakingRegistry::new(100);
        let a = addr(1);
        reg.stake(&a, 1000, 10, 0).unwrap();

        assert_eq!(
            reg.request_unstake(&a, 100, 5),
            Err(GovernanceError::StakeLocked { until: 10 })
        );
        assert_eq!(reg.request_unstake(&a, 400, 10), Ok(110));
        assert_eq!(reg.voting_power(&a), 600);
        assert_eq!(
            reg.request_unstake(&a, 1, 11),
            Err(GovernanceError::PendingUnstakeExists)
        );
        assert_eq!(
            reg.claim_unstake(&a, 109),
            Err(GovernanceError::CooldownActive { claimable_at: 110 })
        );
        assert_eq!(reg.claim_unstake(&a, 110), Ok(400));
        let r = reg.record(&a).unwrap();
        assert_eq!((r.staked_amount, r.pending_unstake), (600, 0));
        assert_eq!(reg.unstake_request(&a).unwrap().status, UnstakeStatus::Claimed);
        assert_eq!(reg.claim_unstake(&a, 200), Err(GovernanceError::NoPendingUnstake));
    }

    #[test]
    fn unstake_more_than_available_fails() {
        let mut reg = StakingRegistry::new(1);
        let a = addr(2);
        reg.stake(&a, 50, 0, 0).unwrap();
        assert_eq!(
            reg.request_unstake(&a, 51, 0),
            Err(GovernanceError::InsufficientStake { available: 50, requested: 51 })
        );
        assert!(matches!(reg.request_unstake(&addr(3), 1, 0), Err(GovernanceError::NoStake(_))));
    }

    #[test]
    fn slash_clamps_pending() {
        let mut reg = StakingRegistry::new(100);
        let a = addr(1);
        reg.stake(&a, 1000, 0, 0).unwrap();
        reg.request_unstake(&a, 800, 0).unwrap();
        reg.slash(&a, 500, "equivocation", 3).unwrap();
        let r = reg.record(&a).unwrap();
        assert_eq!((r.staked_amount, r.pending_unstake), (500, 500));
        assert_pending_bounded(&reg, &a);
        assert_eq!(reg.slashes().len(), 1);
        // The shrunken request still claims cleanly.
        assert_eq!(reg.claim_unstake(&a, 100), Ok(500));
        assert_eq!(reg.record(&a).unwrap().staked_amount, 0);
    }

    #[test]
    fn slash_validation() {
        let mut reg = StakingRegistry::new(1);
        let a = addr(1);
        assert!(matches!(reg.slash(&a, 1, "x", 0), Err(GovernanceError::NoStake(_))));
        reg.stake(&a, 10, 0, 0).unwrap();
        assert_eq!(reg.slash(&a, 0, "x", 0), Err(GovernanceError::ZeroAmount));
        assert!(reg.slash(&a, 11, "x", 0).is_err());
    }

    #[test]
    fn all_voting_powers_in_insertion_order() {
        let mut reg = StakingRegistry::new(0);
        for b in [9u8, 3, 7] {
            reg.stake(&addr(b), u64::from(b) * 10, 0, 0).unwrap();
        }
        reg.request_unstake(&addr(3), 30, 0).unwrap();
        let powers = reg.all_voting_powers();
        assert_eq!(powers, vec![(addr(9), 90), (addr(7), 70)]);
        assert_eq!(reg.total_staked(), 190);
        assert_eq!(reg.total_voting_power(), 160);
    }
}
