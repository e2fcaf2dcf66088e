//! The Boule: a council drawn by lot that screens proposals.
//!
//! - **Dokimasia**: citizens register with a minimum stake and may be marked
//!   ineligible.
//! - **Kleroterion**: the council is drawn by a deterministic Fisher–Yates
//!   shuffle seeded from the first four bytes of a caller-supplied seed, so
//!   every node derives the same council.
//! - **Screening**: a proposal is approved once `ceil(2/3)` of the council
//!   approves it and no graphe paranomon is open or upheld against it.
//! - **Graphe paranomon**: a council challenge that blocks a proposal until a
//!   majority resolves it. An upheld challenge blocks it for good.

use crate::error::GovernanceError;
use crate::voting::ProposalScreener;
use polis_types::{Address, BlockHeight};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BouleConfig {
    #[serde(default = "default_council_size")]
    pub council_size: usize,
    #[serde(default = "default_term_blocks")]
    pub term_blocks: u64,
    #[serde(default)]
    pub min_stake: u64,
    #[serde(default)]
    pub screening_required: bool,
}

fn default_council_size() -> usize {
    21
}

fn default_term_blocks() -> u64 {
    10_000
}

impl Default for BouleConfig {
    fn default() -> Self {
        Self {
            council_size: default_council_size(),
            term_blocks: default_term_blocks(),
            min_stake: 0,
            screening_required: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citizen {
    pub address: Address,
    pub registered_at_block: BlockHeight,
    pub stake_at_registration: u64,
    pub is_eligible: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouncilMember {
    pub address: Address,
    pub selected_at: BlockHeight,
    pub term_end: BlockHeight,
    pub selection_index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub reviewer: Address,
    pub approved: bool,
    pub rationale: String,
    pub block: BlockHeight,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrapheParanomon {
    pub challenger: Address,
    pub grounds: String,
    pub raised_at: BlockHeight,
    pub dismiss_votes: usize,
    pub uphold_votes: usize,
    pub voters: Vec<Address>,
    pub resolved: bool,
    pub upheld: bool,
}

impl GrapheParanomon {
    /// Blocks the proposal while open, and forever once upheld.
    pub fn blocks(&self) -> bool {
        !self.resolved || self.upheld
    }
}

pub struct Boule {
    config: BouleConfig,
    citizens: Vec<Citizen>,
    citizen_index: HashMap<Address, usize>,
    council: Vec<CouncilMember>,
    reviews: HashMap<u64, Vec<Review>>,
    challenges: HashMap<u64, GrapheParanomon>,
}

/// One step of the kleroterion's LCG.
fn lcg_next(rng: u32) -> u32 {
    rng.wrapping_mul(1_664_525).wrapping_add(1_013_904_223)
}

impl Boule {
    pub fn new(config: BouleConfig) -> Self {
        Self {
            config,
            citizens: Vec::new(),
            citizen_index: HashMap::new(),
            council: Vec::new(),
            reviews: HashMap::new(),
            challenges: HashMap::new(),
        }
    }

    pub fn config(&self) -> &BouleConfig {
        &self.config
    }

    // ── Dokimasia ───────────────────────────────────────────────────────

    pub fn register_citizen(
        &mut self,
        address: &Address,
        stake: u64,
        block: BlockHeight,
    ) -> Result<(), GovernanceError> {
        if address.is_empty() {
            return Err(GovernanceError::EmptyAddress);
        }
        if stake < self.config.min_stake {
            return Err(GovernanceError::BelowMinStake {
                stake,
                min: self.config.min_stake,
            });
        }
        if self.citizen_index.contains_key(address) {
            return Err(GovernanceError::AlreadyRegistered(address.clone()));
        }
        self.citizen_index.insert(address.clone(), self.citizens.len());
        self.citizens.push(Citizen {
            address: address.clone(),
            registered_at_block: block,
            stake_at_registration: stake,
            is_eligible: true,
        });
        Ok(())
    }

    pub fn set_eligibility(&mut self, address: &Address, eligible: bool) -> Result<(), GovernanceError> {
        let idx = *self
            .citizen_index
            .get(address)
            .ok_or_else(|| GovernanceError::NotRegistered(address.clone()))?;
        self.citizens[idx].is_eligible = eligible;
        Ok(())
    }

    pub fn citizen(&self, address: &Address) -> Option<&Citizen> {
        self.citizen_index.get(address).map(|&i| &self.citizens[i])
    }

    pub fn citizens(&self) -> &[Citizen] {
        &self.citizens
    }

    pub fn eligible_count(&self) -> usize {
        self.citizens.iter().filter(|c| c.is_eligible).count()
    }

    // ── Kleroterion ─────────────────────────────────────────────────────

    /// Draw a new council. Replaces the previous one.
    pub fn conduct_sortition(
        &mut self,
        seed: &[u8],
        block: BlockHeight,
    ) -> Result<&[CouncilMember], GovernanceError> {
        if seed.len() < 4 {
            return Err(GovernanceError::SeedTooShort(seed.len()));
        }
        let mut eligible: Vec<usize> = self
            .citizens
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_eligible)
            .map(|(i, _)| i)
            .collect();
        let needed = self.config.council_size;
        if eligible.len() < needed {
            return Err(GovernanceError::NotEnoughCitizens {
                eligible: eligible.len(),
                needed,
            });
        }

        let mut rng = u32::from_be_bytes([seed[0], seed[1], seed[2], seed[3]]);
        for i in (1..eligible.len()).rev() {
            rng = lcg_next(rng);
            let j = rng as usize % (i + 1);
            eligible.swap(i, j);
        }

        let term_end = block.saturating_add(self.config.term_blocks);
        self.council = eligible
            .into_iter()
            .take(needed)
            .enumerate()
            .map(|(selection_index, ci)| CouncilMember {
                address: self.citizens[ci].address.clone(),
                selected_at: block,
                term_end,
                selection_index,
            })
            .collect();
        tracing::info!(block, council_size = self.council.len(), term_end, "council drawn by lot");
        Ok(self.council.as_slice())
    }

    pub fn council(&self) -> &[CouncilMember] {
        &self.council
    }

    pub fn council_member(&self, address: &Address) -> Option<&CouncilMember> {
        self.council.iter().find(|m| &m.address == address)
    }

    pub fn is_council_member(&self, address: &Address) -> bool {
        self.council_member(address).is_some()
    }

    /// End of the current council's term, if a council has been drawn.
    pub fn term_end(&self) -> Option<BlockHeight> {
        self.council.first().map(|m| m.term_end)
    }

    /// Whether a new sortition is due at `block`.
    pub fn term_expired(&self, block: BlockHeight) -> bool {
        self.term_end().map_or(true, |end| block >= end)
    }

    /// The executive subset: the first `max(1, council_size / 10)` members.
    pub fn get_prytany(&self) -> Vec<&CouncilMember> {
        let n = (self.config.council_size / 10).max(1);
        let mut members: Vec<&CouncilMember> = self.council.iter().collect();
        members.sort_by_key(|m| m.selection_index);
        members.truncate(n);
        members
    }

    // ── Screening ───────────────────────────────────────────────────────

    fn require_member(&self, member: &Address) -> Result<(), GovernanceError> {
        if self.is_council_member(member) {
            Ok(())
        } else {
            Err(GovernanceError::NotCouncilMember(member.clone()))
        }
    }

    pub fn review_proposal(
        &mut self,
        proposal_id: u64,
        member: &Address,
        approved: bool,
        rationale: &str,
        block: BlockHeight,
    ) -> Result<(), GovernanceError> {
        self.require_member(member)?;
        let reviews = self.reviews.entry(proposal_id).or_default();
        if reviews.iter().any(|r| &r.reviewer == member) {
            return Err(GovernanceError::AlreadyReviewed(member.clone()));
        }
        reviews.push(Review {
            reviewer: member.clone(),
            approved,
            rationale: rationale.to_string(),
            block,
        });
        tracing::debug!(proposal_id, reviewer = %member, approved, "proposal reviewed");
        Ok(())
    }

    pub fn reviews(&self, proposal_id: u64) -> &[Review] {
        self.reviews.get(&proposal_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn approval_count(&self, proposal_id: u64) -> usize {
        self.reviews(proposal_id).iter().filter(|r| r.approved).count()
    }

    /// `ceil(2 * council_size / 3)`.
    pub fn approval_threshold(&self) -> usize {
        (2 * self.config.council_size).div_ceil(3)
    }

    pub fn is_proposal_approved(&self, proposal_id: u64) -> bool {
        if !self.config.screening_required {
            return true;
        }
        if self.challenges.get(&proposal_id).is_some_and(GrapheParanomon::blocks) {
            return false;
        }
        self.approval_count(proposal_id) >= self.approval_threshold()
    }

    // ── Graphe paranomon ────────────────────────────────────────────────

    /// Votes needed on either side to resolve a challenge.
    pub fn challenge_majority(&self) -> usize {
        self.config.council_size / 2 + 1
    }

    pub fn raise_challenge(
        &mut self,
        proposal_id: u64,
        challenger: &Address,
        grounds: &str,
        block: BlockHeight,
    ) -> Result<(), GovernanceError> {
        self.require_member(challenger)?;
        if let Some(existing) = self.challenges.get(&proposal_id) {
            if !existing.resolved {
                return Err(GovernanceError::ChallengeActive(proposal_id));
            }
            if existing.upheld {
                return Err(GovernanceError::ChallengeUpheld(proposal_id));
            }
        }
        self.challenges.insert(
            proposal_id,
            GrapheParanomon {
                challenger: challenger.clone(),
                grounds: grounds.to_string(),
                raised_at: block,
                dismiss_votes: 0,
                uphold_votes: 0,
                voters: Vec::new(),
                resolved: false,
                upheld: false,
            },
        );
        tracing::info!(proposal_id, challenger = %challenger, "graphe paranomon raised");
        Ok(())
    }

    /// Record a vote. Returns `Some(upheld)` once the challenge resolves.
    pub fn vote_on_challenge(
        &mut self,
        proposal_id: u64,
        member: &Address,
        dismiss: bool,
        block: BlockHeight,
    ) -> Result<Option<bool>, GovernanceError> {
        self.require_member(member)?;
        let majority = self.challenge_majority();
        let challenge = self
            .challenges
            .get_mut(&proposal_id)
            .filter(|c| !c.resolved)
            .ok_or(GovernanceError::NoOpenChallenge(proposal_id))?;
        if challenge.voters.contains(member) {
            return Err(GovernanceError::AlreadyVoted(member.clone()));
        }
        challenge.voters.push(member.clone());
        if dismiss {
            challenge.dismiss_votes += 1;
        } else {
            challenge.uphold_votes += 1;
        }

        if challenge.dismiss_votes >= majority {
            challenge.resolved = true;
            challenge.upheld = false;
        } else if challenge.uphold_votes >= majority {
            challenge.resolved = true;
            challenge.upheld = true;
        }
        if challenge.resolved {
            tracing::info!(proposal_id, upheld = challenge.upheld, block, "graphe paranomon resolved");
            return Ok(Some(challenge.upheld));
        }
        Ok(None)
    }

    pub fn challenge(&self, proposal_id: u64) -> Option<&GrapheParanomon> {
        self.challenges.get(&proposal_id)
    }
}

impl ProposalScreener for Boule {
    fn is_proposal_approved(&self, proposal_id: u64) -> bool {
        Boule::is_proposal_approved(self, proposal_id)
    }
}

impl Default for Boule {
    fn default() -> Self {
        Self::new(BouleConfig::default())
    }
}
