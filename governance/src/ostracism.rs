//! Ostracism: a community vote that bans an address from governance for a
//! fixed number of blocks.
//!
//! `Nominated -> Ostracized -> Rehabilitated`, or `Nominated -> Dismissed`
//! when finalization finds too few votes in favour.

use crate::error::GovernanceError;
use polis_types::{Address, BlockHeight};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OstracismConfig {
    #[serde(default = "default_required_votes_for")]
    pub required_votes_for: u64,
    #[serde(default = "default_ban_duration")]
    pub ban_duration: u64,
}

fn default_required_votes_for() -> u64 {
    3
}

fn default_ban_duration() -> u64 {
    100_000
}

impl Default for OstracismConfig {
    fn default() -> Self {
        Self {
            required_votes_for: default_required_votes_for(),
            ban_duration: default_ban_duration(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NominationState {
    Nominated,
    Ostracized,
    Dismissed,
    Rehabilitated,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nomination {
    pub id: u64,
    pub subject: Address,
    pub nominator: Address,
    pub reason: String,
    pub nominated_at: BlockHeight,
    pub votes_for: u64,
    pub votes_against: u64,
    pub voters: Vec<Address>,
    pub state: NominationState,
    /// Set when ostracized.
    pub ban_end: Option<BlockHeight>,
}

impl Nomination {
    pub fn is_ban_active(&self, block: BlockHeight) -> bool {
        self.state == NominationState::Ostracized && self.ban_end.is_some_and(|end| block < end)
    }
}

pub struct Ostracism {
    config: OstracismConfig,
    nominations: BTreeMap<u64, Nomination>,
    next_id: u64,
}

impl Ostracism {
    pub fn new(config: OstracismConfig) -> Self {
        Self {
            config,
            nominations: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &OstracismConfig {
        &self.config
    }

    pub fn nominate(
        &mut self,
        subject: &Address,
        nominator: &Address,
        reason: &str,
        block: BlockHeight,
    ) -> Result<u64, GovernanceError> {
        if subject.is_empty() || nominator.is_empty() {
            return Err(GovernanceError::EmptyAddress);
        }
        if subject == nominator {
            return Err(GovernanceError::SelfNomination);
        }
        let open = self.nominations.values().any(|n| {
            &n.subject == subject && (n.state == NominationState::Nominated || n.is_ban_active(block))
        });
        if open {
            return Err(GovernanceError::AlreadyNominated(subject.clone()));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.nominations.insert(
            id,
            Nomination {
                id,
                subject: subject.clone(),
                nominator: nominator.clone(),
                reason: reason.to_string(),
                nominated_at: block,
                votes_for: 0,
                votes_against: 0,
                voters: Vec::new(),
                state: NominationState::Nominated,
                ban_end: None,
            },
        );
        tracing::info!(nomination_id = id, subject = %subject, nominator = %nominator, "ostracism nomination");
        Ok(id)
    }

    /// One vote per voter per nomination.
    pub fn vote(
        &mut self,
        nomination_id: u64,
        voter: &Address,
        in_favor: bool,
    ) -> Result<(), GovernanceError> {
        if voter.is_empty() {
            return Err(GovernanceError::EmptyAddress);
        }
        let nomination = self.open_nomination(nomination_id)?;
        if nomination.voters.contains(voter) {
            return Err(GovernanceError::AlreadyVoted(voter.clone()));
        }
        nomination.voters.push(voter.clone());
        if in_favor {
            nomination.votes_for += 1;
        } else {
            nomination.votes_against += 1;
        }
        Ok(())
    }

    /// Close the vote: ostracize with enough FOR votes, dismiss otherwise.
    pub fn finalize(
        &mut self,
        nomination_id: u64,
        block: BlockHeight,
    ) -> Result<NominationState, GovernanceError> {
        let required = self.config.required_votes_for;
        let ban_duration = self.config.ban_duration;
        let nomination = self.open_nomination(nomination_id)?;
        if nomination.votes_for >= required {
            nomination.state = NominationState::Ostracized;
            nomination.ban_end = Some(block.saturating_add(ban_duration));
        } else {
            nomination.state = NominationState::Dismissed;
        }
        tracing::info!(
            nomination_id,
            subject = %nomination.subject,
            state = ?nomination.state,
            votes_for = nomination.votes_for,
            "ostracism finalized"
        );
        Ok(nomination.state)
    }

    fn open_nomination(&mut self, nomination_id: u64) -> Result<&mut Nomination, GovernanceError> {
        let nomination = self
            .nominations
            .get_mut(&nomination_id)
            .ok_or(GovernanceError::NominationNotFound(nomination_id))?;
        if nomination.state != NominationState::Nominated {
            return Err(GovernanceError::NominationClosed(nomination_id));
        }
        Ok(nomination)
    }

    /// Move every expired ban to `Rehabilitated`. Returns the subjects.
    pub fn rehabilitate_expired(&mut self, block: BlockHeight) -> Vec<Address> {
        let mut restored = Vec::new();
        for n in self.nominations.values_mut() {
            if n.state == NominationState::Ostracized && !n.is_ban_active(block) {
                n.state = NominationState::Rehabilitated;
                restored.push(n.subject.clone());
            }
        }
        if !restored.is_empty() {
            tracing::info!(block, count = restored.len(), "ostracism bans expired");
        }
        restored
    }

    pub fn is_banned(&self, address: &Address, block: BlockHeight) -> bool {
        self.nominations
            .values()
            .any(|n| &n.subject == address && n.is_ban_active(block))
    }

    pub fn active_bans(&self, block: BlockHeight) -> Vec<&Nomination> {
        self.nominations
            .values()
            .filter(|n| n.is_ban_active(block))
            .collect()
    }

    pub fn nomination(&self, id: u64) -> Option<&Nomination> {
        self.nominations.get(&id)
    }

    pub fn nominations(&self) -> impl Iterator<Item = &Nomination> {
        self.nominations.values()
    }
}

impl Default for Ostracism {
    fn default() -> Self {
        Self::new(OstracismConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from([b; 32])
    }

    fn ostracism() -> Ostracism {
        Ostracism::new(OstracismConfig {
            required_votes_for: 2,
            ban_duration: 100,
        })
    }

    #[test]
    fn nominator_cannot_be_subject() {
        let mut o = ostracism();
        assert_eq!(o.nominate(&addr(1), &addr(1), "", 0), Err(GovernanceError::SelfNomination));
        assert_eq!(o.nominate(&Address::default(), &addr(1), "", 0), Err(GovernanceError::EmptyAddress));
    }

    #[test]
    fn full_cycle() {
        let mut o = ostracism();
        let id = o.nominate(&addr(1), &addr(2), "spam", 10).unwrap();
        assert!(matches!(o.nominate(&addr(1), &addr(3), "again", 11), Err(GovernanceError::AlreadyNominated(_))));

        o.vote(id, &addr(2), true).unwrap();
        assert!(matches!(o.vote(id, &addr(2), true), Err(GovernanceError::AlreadyVoted(_))));
        o.vote(id, &addr(3), true).unwrap();
        o.vote(id, &addr(4), false).unwrap();

        assert_eq!(o.finalize(id, 20), Ok(NominationState::Ostracized));
        assert_eq!(o.nomination(id).unwrap().ban_end, Some(120));
        assert!(o.is_banned(&addr(1), 119));
        assert!(!o.is_banned(&addr(1), 120));
        assert_eq!(o.active_bans(50).len(), 1);
        assert_eq!(o.vote(id, &addr(5), true), Err(GovernanceError::NominationClosed(id)));
        assert_eq!(o.finalize(id, 21), Err(GovernanceError::NominationClosed(id)));

        assert!(o.rehabilitate_expired(119).is_empty());
        assert_eq!(o.rehabilitate_expired(120), vec![addr(1)]);
        assert_eq!(o.nomination(id).unwrap().state, NominationState::Rehabilitated);
        // A rehabilitated subject can be nominated again.
        assert_eq!(o.nominate(&addr(1), &addr(2), "relapse", 130), Ok(2));
    }

    #[test]
    fn too_few_votes_dismisses() {
        let mut o = ostracism();
        let id = o.nominate(&addr(1), &addr(2), "", 0).unwrap();
        o.vote(id, &addr(3), true).unwrap();
        assert_eq!(o.finalize(id, 5), Ok(NominationState::Dismissed));
        assert!(!o.is_banned(&addr(1), 5));
        assert_eq!(o.finalize(99, 5), Err(GovernanceError::NominationNotFound(99)));
    }
}
