//! Treasury interface consumed by proposal execution, and a ledger that
//! implements it with per-track balances.

use crate::error::GovernanceError;
use polis_monetary::safe_arith;
use polis_types::{Address, BlockHeight};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Spending tracks. Every balance and spend is attributed to one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TreasuryTrack {
    CoreDevelopment,
    Grants,
    Operations,
    Emergency,
    Uncategorized,
    Reserve,
}

impl TreasuryTrack {
    pub const ALL: [TreasuryTrack; 6] = [
        TreasuryTrack::CoreDevelopment,
        TreasuryTrack::Grants,
        TreasuryTrack::Operations,
        TreasuryTrack::Emergency,
        TreasuryTrack::Uncategorized,
        TreasuryTrack::Reserve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TreasuryTrack::CoreDevelopment => "core_development",
            TreasuryTrack::Grants => "grants",
            TreasuryTrack::Operations => "operations",
            TreasuryTrack::Emergency => "emergency",
            TreasuryTrack::Uncategorized => "uncategorized",
            TreasuryTrack::Reserve => "reserve",
        }
    }
}

impl fmt::Display for TreasuryTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What proposal execution needs from a treasury.
pub trait Treasury {
    fn spend(
        &mut self,
        amount: u64,
        recipient: &Address,
        proposal_id: u64,
        track: TreasuryTrack,
        memo: &str,
        block: BlockHeight,
    ) -> Result<(), GovernanceError>;

    fn balance(&self, track: TreasuryTrack) -> u64;

    fn total_balance(&self) -> u64 {
        TreasuryTrack::ALL
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(self.balance(*t)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendRecord {
    pub amount: u64,
    pub recipient: Address,
    pub proposal_id: u64,
    pub track: TreasuryTrack,
    pub memo: String,
    pub block: BlockHeight,
}

#[derive(Clone, Debug, Default)]
pub struct TreasuryLedger {
    balances: BTreeMap<TreasuryTrack, u64>,
    spends: Vec<SpendRecord>,
}

impl TreasuryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger seeded with genesis balances.
    pub fn with_balances(balances: impl IntoIterator<Item = (TreasuryTrack, u64)>) -> Self {
        let mut ledger = Self::new();
        for (track, amount) in balances {
            ledger.balances.insert(track, amount);
        }
        ledger
    }

    pub fn deposit(&mut self, track: TreasuryTrack, amount: u64) -> Result<(), GovernanceError> {
        if amount == 0 {
            return Err(GovernanceError::ZeroAmount);
        }
        let entry = self.balances.entry(track).or_insert(0);
        *entry = safe_arith::add(*entry, amount)?;
        tracing::debug!(track = %track, amount, "treasury deposit");
        Ok(())
    }

    pub fn transfer_between_tracks(
        &mut self,
        from: TreasuryTrack,
        to: TreasuryTrack,
        amount: u64,
    ) -> Result<(), GovernanceError> {
        if amount == 0 {
            return Err(GovernanceError::ZeroAmount);
        }
        let have = self.balance(from);
        let remaining = safe_arith::sub(have, amount).map_err(|_| GovernanceError::InsufficientTreasury {
            track: from.to_string(),
            have,
            need: amount,
        })?;
        let credited = safe_arith::add(self.balance(to), amount)?;
        self.balances.insert(from, remaining);
        self.balances.insert(to, credited);
        Ok(())
    }

    pub fn spends(&self) -> &[SpendRecord] {
        &self.spends
    }

    /// Every track with its balance, zero balances included.
    pub fn balances(&self) -> Vec<(TreasuryTrack, u64)> {
        TreasuryTrack::ALL.iter().map(|t| (*t, self.balance(*t))).collect()
    }
}

impl Treasury for TreasuryLedger {
    fn spend(
        &mut self,
        amount: u64,
        recipient: &Address,
        proposal_id: u64,
        track: TreasuryTrack,
        memo: &str,
        block: BlockHeight,
    ) -> Result<(), GovernanceError> {
        if amount == 0 {
            return Err(GovernanceError::ZeroAmount);
        }
        if recipient.is_empty() {
            return Err(GovernanceError::EmptyAddress);
        }
        let have = self.balance(track);
        if have < amount {
            return Err(GovernanceError::InsufficientTreasury {
                track: track.to_string(),
                have,
                need: amount,
            });
        }
        self.balances.insert(track, have - amount);
        self.spends.push(SpendRecord {
            amount,
            recipient: recipient.clone(),
            proposal_id,
            track,
            memo: memo.to_string(),
            block,
        });
        tracing::info!(proposal_id, amount, track = %track, recipient = %recipient, "treasury spend");
        Ok(())
    }

    fn balance(&self, track: TreasuryTrack) -> u64 {
        self.balances.get(&track).copied().unwrap_or(0)
    }
}
