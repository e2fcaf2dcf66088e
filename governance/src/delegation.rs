//! Vote delegation: a delegator entrusts amounts of voting power to one or
//! more delegatees.
//!
//! Delegations are additive per (delegator, delegatee) pair and pruned when
//! they reach zero. A reverse index answers "who delegated to me" without
//! scanning every delegator.

use crate::error::GovernanceError;
use polis_monetary::safe_arith;
use polis_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

pub struct DelegationSystem {
    /// delegator -> (delegatee -> amount)
    delegations: HashMap<Address, BTreeMap<Address, u64>>,
    /// delegatee -> delegators
    reverse: HashMap<Address, HashSet<Address>>,
    max_delegatees: usize,
}

impl DelegationSystem {
    pub fn new(max_delegatees: usize) -> Self {
        Self {
            delegations: HashMap::new(),
            reverse: HashMap::new(),
            max_delegatees,
        }
    }

    pub fn delegate(
        &mut self,
        delegator: &Address,
        delegatee: &Address,
        amount: u64,
    ) -> Result<(), GovernanceError> {
        if delegator.is_empty() || delegatee.is_empty() {
            return Err(GovernanceError::EmptyAddress);
        }
        if delegator == delegatee {
            return Err(GovernanceError::SelfDelegation);
        }
        if amount == 0 {
            return Err(GovernanceError::ZeroAmount);
        }
        let outgoing = self.delegations.entry(delegator.clone()).or_default();
        if !outgoing.contains_key(delegatee) && outgoing.len() >= self.max_delegatees {
            return Err(GovernanceError::TooManyDelegatees(self.max_delegatees));
        }
        let current = outgoing.get(delegatee).copied().unwrap_or(0);
        outgoing.insert(delegatee.clone(), safe_arith::add(current, amount)?);
        self.reverse
            .entry(delegatee.clone())
            .or_default()
            .insert(delegator.clone());
        tracing::debug!(delegator = %delegator, delegatee = %delegatee, amount, "delegated");
        Ok(())
    }

    /// Withdraw `amount` from a delegation, removing it at zero.
    pub fn undelegate(
        &mut self,
        delegator: &Address,
        delegatee: &Address,
        amount: u64,
    ) -> Result<(), GovernanceError> {
        if amount == 0 {
            return Err(GovernanceError::ZeroAmount);
        }
        let outgoing = self
            .delegations
            .get_mut(delegator)
            .ok_or(GovernanceError::InsufficientDelegation { have: 0, requested: amount })?;
        let have = outgoing.get(delegatee).copied().unwrap_or(0);
        if amount > have {
            return Err(GovernanceError::InsufficientDelegation { have, requested: amount });
        }
        if have == amount {
            outgoing.remove(delegatee);
            if outgoing.is_empty() {
                self.delegations.remove(delegator);
            }
            if let Some(set) = self.reverse.get_mut(delegatee) {
                set.remove(delegator);
                if set.is_empty() {
                    self.reverse.remove(delegatee);
                }
            }
        } else {
            outgoing.insert(delegatee.clone(), have - amount);
        }
        Ok(())
    }

    /// Total power delegated to `address`.
    pub fn voting_power(&self, address: &Address) -> u64 {
        self.reverse.get(address).map_or(0, |delegators| {
            delegators
                .iter()
                .filter_map(|d| self.delegations.get(d)?.get(address))
                .fold(0u64, |acc, amt| acc.saturating_add(*amt))
        })
    }

    /// Total `delegator` has handed out.
    pub fn delegated_by(&self, delegator: &Address) -> u64 {
        self.delegations
            .get(delegator)
            .map_or(0, |m| m.values().fold(0u64, |acc, v| acc.saturating_add(*v)))
    }

    pub fn delegation(&self, delegator: &Address, delegatee: &Address) -> u64 {
        self.delegations
            .get(delegator)
            .and_then(|m| m.get(delegatee))
            .copied()
            .unwrap_or(0)
    }

    pub fn delegatees_of(&self, delegator: &Address) -> Vec<(Address, u64)> {
        self.delegations
            .get(delegator)
            .map(|m| m.iter().map(|(a, v)| (a.clone(), *v)).collect())
            .unwrap_or_default()
    }

    /// Direct delegators of `delegatee`, sorted for stable output.
    pub fn delegators_of(&self, delegatee: &Address) -> Vec<Address> {
        let mut out: Vec<Address> = self
            .reverse
            .get(delegatee)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();
        out.sort();
        out
    }

    pub fn max_delegatees(&self) -> usize {
        self.max_delegatees
    }
}

/// Serializable form of the delegation graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DelegationSnapshot {
    pub delegations: BTreeMap<Address, BTreeMap<Address, u64>>,
    pub max_delegatees: usize,
}

impl DelegationSystem {
    pub fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
        let snapshot = DelegationSnapshot {
            delegations: self
                .delegations
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            max_delegatees: self.max_delegatees,
        };
        bincode::serialize(&snapshot).map_err(|e| GovernanceError::Persistence(e.to_string()))
    }

    /// Restore from [`save_state`](Self::save_state) output, rebuilding the
    /// reverse index.
    pub fn load_state(data: &[u8]) -> Result<Self, GovernanceError> {
        let snapshot: DelegationSnapshot =
            bincode::deserialize(data).map_err(|e| GovernanceError::Persistence(e.to_string()))?;
        let mut reverse = HashMap::<Address, HashSet<Address>>::new();
        for (from, targets) in &snapshot.delegations {
            for to in targets.keys() {
                reverse.entry(to.clone()).or_default().insert(from.clone());
            }
        }
        Ok(Self {
            delegations: snapshot.delegations.into_iter().collect(),
            reverse,
            max_delegatees: snapshot.max_delegatees,
        })
    }
}

impl Default for DelegationSystem {
    fn default() -> Self {
        Self::new(64)
    }
}
