//! Proposal lifecycle: create, vote, tally, execute.
//!
//! The voting system owns its proposals, the snapshot registry and the
//! anti-whale guard. Everything else it touches is handed in per call:
//! the power source at creation, the screener when voting, the parameter
//! store and treasury when executing. This keeps ownership one-directional
//! (the embedding owns the collaborators, the voting system only borrows).

use std::collections::{BTreeMap, HashSet};

use polis_crypto::SignatureVerifier;
use polis_monetary::safe_arith;
use polis_types::{Address, BlockHeight};

use crate::anti_whale::AntiWhaleGuard;
use crate::error::GovernanceError;
use crate::params::GovParams;
use crate::payload::{vote_payload, ParameterChange, TreasurySpend};
use crate::proposal::{Proposal, ProposalDraft, ProposalStatus, ProposalType, Vote, VoteChoice};
use crate::snapshot::SnapshotRegistry;
use crate::staking::VotingPowerSource;
use crate::treasury::{Treasury, TreasuryTrack};

pub const DEFAULT_VOTING_DELAY: u64 = 100;
pub const DEFAULT_VOTING_PERIOD: u64 = 10_000;
pub const DEFAULT_THRESHOLD: u64 = 50;
pub const CONSTITUTIONAL_THRESHOLD: u64 = 66;
pub const DEFAULT_VETO_THRESHOLD_BPS: u64 = 3334;
pub const DEFAULT_EXECUTION_DELAY: u64 = 1000;

/// Reports whether a proposal has cleared screening.
pub trait ProposalScreener {
    fn is_proposal_approved(&self, proposal_id: u64) -> bool;
}

/// Custom side effects for executed proposals.
///
/// When installed it replaces the built-in dispatch. Returning `false`
/// leaves the proposal `Passed` so execution can be retried.
pub trait ExecutionHandler: Send {
    fn execute(&mut self, proposal: &Proposal, block: BlockHeight) -> bool;
}

/// Collaborators borrowed for one `execute_proposal` call.
#[derive(Default)]
pub struct ExecutionTargets<'a> {
    pub params: Option<&'a mut dyn GovParams>,
    pub treasury: Option<&'a mut dyn Treasury>,
}

/// A signed ballot as submitted by a voter.
#[derive(Clone, Debug)]
pub struct Ballot {
    pub proposal_id: u64,
    pub voter: Address,
    pub choice: VoteChoice,
    pub claimed_power: u64,
    pub signature: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteReceipt {
    /// Power before anti-whale scaling (snapshot power, or the claim).
    pub raw_power: u64,
    /// Power credited to the tally.
    pub effective_power: u64,
}

/// Why a tally came out the way it did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TallyOutcome {
    Passed { execution_time: BlockHeight },
    QuorumNotMet,
    /// Veto share crossed the threshold; the deposit is forfeit.
    Vetoed,
    NoApprovalVotes,
    ThresholdNotMet { approval_percent: u64 },
}

impl TallyOutcome {
    pub fn status(&self) -> ProposalStatus {
        match self {
            TallyOutcome::Passed { .. } => ProposalStatus::Passed,
            _ => ProposalStatus::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TallyOutcome::Passed { .. } => "passed",
            TallyOutcome::QuorumNotMet => "quorum_not_met",
            TallyOutcome::Vetoed => "vetoed",
            TallyOutcome::NoApprovalVotes => "no_approval_votes",
            TallyOutcome::ThresholdNotMet { .. } => "threshold_not_met",
        }
    }
}

pub struct VotingSystem {
    next_proposal_id: u64,
    current_block: BlockHeight,
    voting_delay: u64,
    voting_period: u64,
    default_quorum: u64,
    default_threshold: u64,
    constitutional_threshold: u64,
    veto_threshold_bps: u64,
    execution_delay: u64,
    total_supply: u64,

    proposals: BTreeMap<u64, Proposal>,
    votes: BTreeMap<u64, Vec<Vote>>,
    voted: HashSet<(u64, Address)>,

    snapshots: Option<SnapshotRegistry>,
    anti_whale: Option<AntiWhaleGuard>,
    verifier: Box<dyn SignatureVerifier>,
    execution_handler: Option<Box<dyn ExecutionHandler>>,
}

impl VotingSystem {
    pub fn new(verifier: Box<dyn SignatureVerifier>) -> Self {
        Self {
            next_proposal_id: 1,
            current_block: 0,
            voting_delay: DEFAULT_VOTING_DELAY,
            voting_period: DEFAULT_VOTING_PERIOD,
            default_quorum: 0,
            default_threshold: DEFAULT_THRESHOLD,
            constitutional_threshold: CONSTITUTIONAL_THRESHOLD,
            veto_threshold_bps: DEFAULT_VETO_THRESHOLD_BPS,
            execution_delay: DEFAULT_EXECUTION_DELAY,
            total_supply: 0,
            proposals: BTreeMap::new(),
            votes: BTreeMap::new(),
            voted: HashSet::new(),
            snapshots: None,
            anti_whale: None,
            verifier,
            execution_handler: None,
        }
    }

    // ── Wiring and parameters ───────────────────────────────────────────

    pub fn attach_snapshots(&mut self, registry: SnapshotRegistry) {
        self.snapshots = Some(registry);
    }

    pub fn attach_anti_whale(&mut self, guard: AntiWhaleGuard) {
        self.anti_whale = Some(guard);
    }

    pub fn set_execution_handler(&mut self, handler: Box<dyn ExecutionHandler>) {
        self.execution_handler = Some(handler);
    }

    pub fn clear_execution_handler(&mut self) {
        self.execution_handler = None;
    }

    pub fn snapshots(&self) -> Option<&SnapshotRegistry> {
        self.snapshots.as_ref()
    }

    pub fn anti_whale(&self) -> Option<&AntiWhaleGuard> {
        self.anti_whale.as_ref()
    }

    pub fn verifier_name(&self) -> &str {
        self.verifier.name()
    }

    pub fn current_block(&self) -> BlockHeight {
        self.current_block
    }

    pub fn set_block_height(&mut self, block: BlockHeight) {
        self.current_block = block;
    }

    pub fn voting_delay(&self) -> u64 {
        self.voting_delay
    }

    pub fn set_voting_delay(&mut self, blocks: u64) {
        self.voting_delay = blocks;
    }

    pub fn voting_period(&self) -> u64 {
        self.voting_period
    }

    pub fn set_voting_period(&mut self, blocks: u64) {
        self.voting_period = blocks;
    }

    pub fn default_quorum(&self) -> u64 {
        self.default_quorum
    }

    pub fn set_default_quorum(&mut self, quorum: u64) {
        self.default_quorum = quorum;
    }

    pub fn default_threshold(&self) -> u64 {
        self.default_threshold
    }

    pub fn set_default_threshold(&mut self, percent: u64) {
        self.default_threshold = percent;
    }

    pub fn set_constitutional_threshold(&mut self, percent: u64) {
        self.constitutional_threshold = percent;
    }

    pub fn veto_threshold_bps(&self) -> u64 {
        self.veto_threshold_bps
    }

    pub fn set_veto_threshold_bps(&mut self, bps: u64) {
        self.veto_threshold_bps = bps;
    }

    pub fn execution_delay(&self) -> u64 {
        self.execution_delay
    }

    pub fn set_execution_delay(&mut self, blocks: u64) {
        self.execution_delay = blocks;
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn set_total_supply(&mut self, supply: u64) {
        self.total_supply = supply;
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn proposal(&self, id: u64) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    /// Proposals still accepting votes or awaiting tally.
    pub fn active_proposals(&self) -> Vec<&Proposal> {
        self.proposals.values().filter(|p| p.is_open()).collect()
    }

    pub fn votes(&self, proposal_id: u64) -> &[Vote] {
        self.votes.get(&proposal_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_voted(&self, proposal_id: u64, voter: &Address) -> bool {
        self.voted.contains(&(proposal_id, voter.clone()))
    }

    pub fn next_proposal_id(&self) -> u64 {
        self.next_proposal_id
    }

    fn proposal_mut(&mut self, id: u64) -> Result<&mut Proposal, GovernanceError> {
        self.proposals
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))
    }

    // ── Create ──────────────────────────────────────────────────────────

    /// Create a proposal. With both a snapshot registry attached and a power
    /// source supplied, the power map is frozen at `voting_start` before
    /// this returns.
    pub fn create_proposal(
        &mut self,
        draft: ProposalDraft,
        powers: Option<&dyn VotingPowerSource>,
    ) -> Result<u64, GovernanceError> {
        if draft.proposer.is_empty() {
            return Err(GovernanceError::EmptyAddress);
        }
        let id = self.next_proposal_id;
        let next_id = safe_arith::add(id, 1)?;
        let voting_start = safe_arith::add(self.current_block, self.voting_delay)?;
        let voting_end = safe_arith::add(voting_start, self.voting_period)?;

        if let (Some(registry), Some(source)) = (self.snapshots.as_mut(), powers) {
            registry.create(id, voting_start, source.all_voting_powers())?;
        }

        let approval_threshold = if draft.proposal_type == ProposalType::Constitutional {
            self.constitutional_threshold
        } else {
            self.default_threshold
        };
        let proposal = Proposal {
            id,
            proposal_type: draft.proposal_type,
            status: ProposalStatus::Pending,
            title: draft.title,
            description: draft.description,
            proposer: draft.proposer,
            execution_data: draft.execution_data,
            creation_time: self.current_block,
            voting_start,
            voting_end,
            execution_time: 0,
            yes_votes: 0,
            no_votes: 0,
            abstain_votes: 0,
            veto_votes: 0,
            quorum_requirement: draft.quorum.unwrap_or(self.default_quorum),
            approval_threshold,
            veto_threshold_bps: draft.veto_threshold_bps.unwrap_or(self.veto_threshold_bps),
            deposit_amount: draft.deposit,
            deposit_returned: false,
            deposit_slashed: false,
            require_boule_approval: draft.require_boule_approval,
            boule_approved: !draft.require_boule_approval,
            tallied_at: None,
        };
        tracing::info!(
            proposal_id = id,
            proposal_type = %proposal.proposal_type,
            proposer = %proposal.proposer,
            voting_start,
            voting_end,
            "proposal created"
        );
        self.proposals.insert(id, proposal);
        self.next_proposal_id = next_id;
        Ok(id)
    }

    // ── Vote ────────────────────────────────────────────────────────────

    /// Verify and record a ballot.
    pub fn cast_vote(
        &mut self,
        ballot: &Ballot,
        screener: Option<&dyn ProposalScreener>,
    ) -> Result<VoteReceipt, GovernanceError> {
        let block = self.current_block;
        let pid = ballot.proposal_id;
        let proposal = self
            .proposals
            .get_mut(&pid)
            .ok_or(GovernanceError::ProposalNotFound(pid))?;

        if proposal.require_boule_approval && !proposal.boule_approved {
            if screener.is_some_and(|s| s.is_proposal_approved(pid)) {
                proposal.boule_approved = true;
            } else {
                return Err(GovernanceError::NotScreened(pid));
            }
        }
        // voting_end is inclusive.
        if block < proposal.voting_start || block > proposal.voting_end {
            return Err(GovernanceError::OutsideVotingPeriod {
                block,
                start: proposal.voting_start,
                end: proposal.voting_end,
            });
        }
        if self.voted.contains(&(pid, ballot.voter.clone())) {
            return Err(GovernanceError::AlreadyVoted(ballot.voter.clone()));
        }
        if ballot.signature.len() != 64 {
            return Err(GovernanceError::InvalidSignatureLength(ballot.signature.len()));
        }
        let voter_key: [u8; 32] = ballot
            .voter
            .as_bytes()
            .try_into()
            .map_err(|_| GovernanceError::InvalidVoterLength(ballot.voter.len()))?;

        let payload = vote_payload(pid, &voter_key, ballot.choice, ballot.claimed_power);
        if !self.verifier.verify(&payload, &ballot.signature, &voter_key) {
            return Err(GovernanceError::InvalidSignature);
        }

        let raw_power = match self.snapshots.as_ref().and_then(|r| r.get(pid)) {
            Some(snapshot) => match snapshot.power(&ballot.voter) {
                0 => return Err(GovernanceError::NoSnapshotPower),
                p => p,
            },
            None => ballot.claimed_power,
        };
        let effective_power = match &self.anti_whale {
            Some(guard) => guard.effective_power(raw_power, self.total_supply),
            None => raw_power,
        };

        proposal.credit(ballot.choice, effective_power)?;
        if proposal.status == ProposalStatus::Pending {
            proposal.status = ProposalStatus::Active;
        }
        self.voted.insert((pid, ballot.voter.clone()));
        self.votes.entry(pid).or_default().push(Vote {
            proposal_id: pid,
            voter: ballot.voter.clone(),
            choice: ballot.choice,
            voting_power: effective_power,
            timestamp: block,
            signature: ballot.signature.clone(),
        });
        tracing::debug!(
            proposal_id = pid,
            voter = %ballot.voter,
            choice = ballot.choice.as_str(),
            raw_power,
            effective_power,
            "vote accepted"
        );
        Ok(VoteReceipt {
            raw_power,
            effective_power,
        })
    }

    // ── Tally ───────────────────────────────────────────────────────────

    /// Close voting and decide the proposal. Re-tallying overwrites the
    /// status with the same result when no votes were added. An executed
    /// proposal is final and cannot be re-tallied.
    pub fn tally_votes(&mut self, proposal_id: u64) -> Result<TallyOutcome, GovernanceError> {
        let block = self.current_block;
        let system_veto_bps = self.veto_threshold_bps;
        let execution_delay = self.execution_delay;
        let proposal = self.proposal_mut(proposal_id)?;
        if proposal.status == ProposalStatus::Executed {
            return Err(GovernanceError::WrongStatus {
                expected: ProposalStatus::Active,
                actual: proposal.status,
            });
        }
        if block <= proposal.voting_end {
            return Err(GovernanceError::VotingNotEnded {
                block,
                end: proposal.voting_end,
            });
        }

        let total = safe_arith::sum([
            proposal.yes_votes,
            proposal.no_votes,
            proposal.abstain_votes,
            proposal.veto_votes,
        ])?;
        let veto_bps = match proposal.veto_threshold_bps {
            0 => system_veto_bps,
            bps => bps,
        };
        let approval_votes = proposal.yes_votes.saturating_add(proposal.no_votes);

        let outcome = if total < proposal.quorum_requirement {
            TallyOutcome::QuorumNotMet
        } else if proposal.veto_votes.saturating_mul(10_000) > total.saturating_mul(veto_bps) {
            TallyOutcome::Vetoed
        } else if approval_votes == 0 {
            TallyOutcome::NoApprovalVotes
        } else {
            let approval_percent = proposal.yes_votes.saturating_mul(100) / approval_votes;
            if approval_percent >= proposal.approval_threshold {
                TallyOutcome::Passed {
                    execution_time: safe_arith::add(block, execution_delay)?,
                }
            } else {
                TallyOutcome::ThresholdNotMet { approval_percent }
            }
        };

        proposal.status = outcome.status();
        if let TallyOutcome::Passed { execution_time } = outcome {
            proposal.execution_time = execution_time;
        }
        proposal.tallied_at = Some(block);
        tracing::info!(
            proposal_id,
            outcome = outcome.as_str(),
            yes = proposal.yes_votes,
            no = proposal.no_votes,
            abstain = proposal.abstain_votes,
            veto = proposal.veto_votes,
            "proposal tallied"
        );
        Ok(outcome)
    }

    // ── Execute ─────────────────────────────────────────────────────────

    /// Apply a passed proposal's effects. Any failure leaves it `Passed`.
    pub fn execute_proposal(
        &mut self,
        proposal_id: u64,
        targets: ExecutionTargets<'_>,
    ) -> Result<(), GovernanceError> {
        let block = self.current_block;
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;
        if proposal.status != ProposalStatus::Passed {
            return Err(GovernanceError::WrongStatus {
                expected: ProposalStatus::Passed,
                actual: proposal.status,
            });
        }
        if block < proposal.execution_time {
            return Err(GovernanceError::ExecutionTooEarly {
                execution_time: proposal.execution_time,
            });
        }

        if let Some(handler) = self.execution_handler.as_mut() {
            if !handler.execute(proposal, block) {
                tracing::warn!(proposal_id, "execution handler declined, proposal stays passed");
                return Err(GovernanceError::HandlerRejected);
            }
        } else {
            dispatch(proposal, targets, block)?;
        }

        proposal.status = ProposalStatus::Executed;
        tracing::info!(proposal_id, proposal_type = %proposal.proposal_type, block, "proposal executed");
        Ok(())
    }

    // ── Deposit bookkeeping ─────────────────────────────────────────────

    /// Record that the deposit goes back to the proposer.
    pub fn return_deposit(&mut self, proposal_id: u64) -> Result<u64, GovernanceError> {
        let proposal = self.proposal_mut(proposal_id)?;
        if proposal.deposit_returned {
            return Err(GovernanceError::DepositSettled);
        }
        proposal.deposit_returned = true;
        Ok(proposal.deposit_amount)
    }

    /// Record that the deposit is forfeit. The caller moves the tokens.
    pub fn slash_deposit(&mut self, proposal_id: u64) -> Result<u64, GovernanceError> {
        let proposal = self.proposal_mut(proposal_id)?;
        if proposal.deposit_returned {
            return Err(GovernanceError::DepositSettled);
        }
        proposal.deposit_returned = true;
        proposal.deposit_slashed = true;
        tracing::warn!(proposal_id, amount = proposal.deposit_amount, "proposal deposit slashed");
        Ok(proposal.deposit_amount)
    }
}

/// Built-in effects by proposal type.
fn dispatch(
    proposal: &mut Proposal,
    targets: ExecutionTargets<'_>,
    block: BlockHeight,
) -> Result<(), GovernanceError> {
    match proposal.proposal_type {
        ProposalType::ParameterChange => {
            if let Some(params) = targets.params {
                let change = ParameterChange::decode(&proposal.execution_data)?;
                params.update(&change.key, change.value, proposal.id, block)?;
            }
        }
        ProposalType::TreasurySpending => {
            if let Some(treasury) = targets.treasury {
                let spend = TreasurySpend::decode(&proposal.execution_data)?;
                if spend.amount > 0 {
                    treasury.spend(
                        spend.amount,
                        &spend.recipient,
                        proposal.id,
                        TreasuryTrack::Uncategorized,
                        "proposal execution",
                        block,
                    )?;
                }
            }
        }
        ProposalType::ProtocolUpgrade
        | ProposalType::General
        | ProposalType::Constitutional
        | ProposalType::Emergency => {
            // Audit breadcrumb: the type tag is appended once per execution.
            proposal.execution_data.push(proposal.proposal_type.code());
        }
    }
    Ok(())
}
