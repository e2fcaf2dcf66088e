//! The composed governance state driven by the embedding once per block.
//!
//! `Polis` owns every component and adds the cross-component rules: banned
//! addresses cannot propose or vote, vetoed deposits are slashed into the
//! treasury reserve, delegations are bounded by staked power, and executed
//! parameter changes are re-applied to the voting system.

use polis_crypto::SignatureVerifier;
use polis_types::{Address, BlockHeight};

use crate::anti_whale::AntiWhaleGuard;
use crate::boule::{Boule, GrapheParanomon};
use crate::config::GovernanceConfig;
use crate::delegation::DelegationSystem;
use crate::error::GovernanceError;
use crate::ostracism::{Nomination, NominationState, Ostracism};
use crate::params::{self, GovParams, ParamStore};
use crate::proposal::{Proposal, ProposalDraft, ProposalStatus, ProposalType};
use crate::snapshot::SnapshotRegistry;
use crate::staking::{StakingRegistry, VotingPowerSource};
use crate::treasury::{TreasuryLedger, TreasuryTrack};
use crate::voting::{Ballot, ExecutionTargets, TallyOutcome, VoteReceipt, VotingSystem};

pub struct Polis {
    config: GovernanceConfig,
    block_height: BlockHeight,
    staking: StakingRegistry,
    voting: VotingSystem,
    boule: Boule,
    params: ParamStore,
    treasury: TreasuryLedger,
    ostracism: Ostracism,
    delegation: DelegationSystem,
}

impl Polis {
    pub fn new(
        config: GovernanceConfig,
        verifier: Box<dyn SignatureVerifier>,
    ) -> Result<Self, GovernanceError> {
        config.validate()?;
        let v = &config.voting;

        let mut voting = VotingSystem::new(verifier);
        voting.set_voting_delay(v.voting_delay);
        voting.set_voting_period(v.voting_period);
        voting.set_default_quorum(v.default_quorum);
        voting.set_default_threshold(v.default_threshold);
        voting.set_constitutional_threshold(v.constitutional_threshold);
        voting.set_veto_threshold_bps(v.veto_threshold_bps);
        voting.set_execution_delay(v.execution_delay);
        if v.snapshots_enabled {
            voting.attach_snapshots(SnapshotRegistry::new());
        }
        if v.anti_whale_enabled {
            voting.attach_anti_whale(AntiWhaleGuard::new(config.anti_whale.clone()));
        }

        let params = ParamStore::with_voting_defaults(
            v.voting_period,
            v.default_quorum,
            v.default_threshold,
            v.veto_threshold_bps,
            v.execution_delay,
        )?;
        let t = &config.treasury;
        let treasury = TreasuryLedger::with_balances([
            (TreasuryTrack::CoreDevelopment, t.core_development),
            (TreasuryTrack::Grants, t.grants),
            (TreasuryTrack::Operations, t.operations),
            (TreasuryTrack::Emergency, t.emergency),
            (TreasuryTrack::Uncategorized, t.uncategorized),
            (TreasuryTrack::Reserve, t.reserve),
        ]);

        tracing::info!(
            verifier = voting.verifier_name(),
            council_size = config.boule.council_size,
            screening = config.boule.screening_required,
            "governance initialised"
        );
        Ok(Self {
            staking: StakingRegistry::new(config.staking.unstake_cooldown),
            boule: Boule::new(config.boule.clone()),
            ostracism: Ostracism::new(config.ostracism.clone()),
            delegation: DelegationSystem::new(config.delegation.max_delegatees),
            block_height: 0,
            voting,
            params,
            treasury,
            config,
        })
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn staking(&self) -> &StakingRegistry {
        &self.staking
    }

    pub fn voting(&self) -> &VotingSystem {
        &self.voting
    }

    /// Direct access for embeddings that install an execution handler.
    pub fn voting_mut(&mut self) -> &mut VotingSystem {
        &mut self.voting
    }

    pub fn boule(&self) -> &Boule {
        &self.boule
    }

    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    pub fn treasury(&self) -> &TreasuryLedger {
        &self.treasury
    }

    pub fn treasury_mut(&mut self) -> &mut TreasuryLedger {
        &mut self.treasury
    }

    pub fn ostracism(&self) -> &Ostracism {
        &self.ostracism
    }

    pub fn delegation(&self) -> &DelegationSystem {
        &self.delegation
    }

    // ── Block height ────────────────────────────────────────────────────

    pub fn block_height(&self) -> BlockHeight {
        self.block_height
    }

    /// Move to `block`. Heights never go backwards. Expired bans are lifted.
    pub fn set_block_height(&mut self, block: BlockHeight) -> Result<(), GovernanceError> {
        if block < self.block_height {
            return Err(GovernanceError::BlockHeightRegression {
                current: self.block_height,
                requested: block,
            });
        }
        self.block_height = block;
        self.voting.set_block_height(block);
        self.ostracism.rehabilitate_expired(block);
        Ok(())
    }

    pub fn advance_blocks(&mut self, blocks: u64) -> Result<(), GovernanceError> {
        self.set_block_height(self.block_height.saturating_add(blocks))
    }

    fn ensure_not_banned(&self, address: &Address) -> Result<(), GovernanceError> {
        if self.ostracism.is_banned(address, self.block_height) {
            return Err(GovernanceError::Banned(address.clone()));
        }
        Ok(())
    }

    /// An open or upheld graphe paranomon blocks the proposal even after
    /// its screening approval was cached.
    fn ensure_not_challenged(&self, proposal_id: u64) -> Result<(), GovernanceError> {
        if self.boule.challenge(proposal_id).is_some_and(GrapheParanomon::blocks) {
            return Err(GovernanceError::NotScreened(proposal_id));
        }
        Ok(())
    }

    fn refresh_total_supply(&mut self) {
        self.voting.set_total_supply(self.staking.total_voting_power());
    }

    // ── Staking ─────────────────────────────────────────────────────────

    pub fn stake(&mut self, address: &Address, amount: u64, lock_for: u64) -> Result<(), GovernanceError> {
        self.staking.stake(address, amount, lock_for, self.block_height)?;
        self.refresh_total_supply();
        Ok(())
    }

    pub fn request_unstake(&mut self, address: &Address, amount: u64) -> Result<BlockHeight, GovernanceError> {
        let claimable_at = self.staking.request_unstake(address, amount, self.block_height)?;
        self.refresh_total_supply();
        Ok(claimable_at)
    }

    pub fn claim_unstake(&mut self, address: &Address) -> Result<u64, GovernanceError> {
        let amount = self.staking.claim_unstake(address, self.block_height)?;
        self.refresh_total_supply();
        Ok(amount)
    }

    pub fn slash_stake(&mut self, address: &Address, amount: u64, reason: &str) -> Result<(), GovernanceError> {
        self.staking.slash(address, amount, reason, self.block_height)?;
        self.refresh_total_supply();
        Ok(())
    }

    // ── Boule ───────────────────────────────────────────────────────────

    /// Register with the caller's current staked power.
    pub fn register_citizen(&mut self, address: &Address) -> Result<(), GovernanceError> {
        self.ensure_not_banned(address)?;
        let stake = self.staking.voting_power(address);
        self.boule.register_citizen(address, stake, self.block_height)
    }

    pub fn set_citizen_eligibility(&mut self, address: &Address, eligible: bool) -> Result<(), GovernanceError> {
        self.boule.set_eligibility(address, eligible)
    }

    pub fn conduct_sortition(&mut self, seed: &[u8]) -> Result<Vec<Address>, GovernanceError> {
        let council = self.boule.conduct_sortition(seed, self.block_height)?;
        Ok(council.iter().map(|m| m.address.clone()).collect())
    }

    pub fn review_proposal(
        &mut self,
        proposal_id: u64,
        member: &Address,
        approved: bool,
        rationale: &str,
    ) -> Result<(), GovernanceError> {
        if self.voting.proposal(proposal_id).is_none() {
            return Err(GovernanceError::ProposalNotFound(proposal_id));
        }
        self.boule
            .review_proposal(proposal_id, member, approved, rationale, self.block_height)
    }

    pub fn raise_challenge(
        &mut self,
        proposal_id: u64,
        challenger: &Address,
        grounds: &str,
    ) -> Result<(), GovernanceError> {
        if self.voting.proposal(proposal_id).is_none() {
            return Err(GovernanceError::ProposalNotFound(proposal_id));
        }
        self.boule
            .raise_challenge(proposal_id, challenger, grounds, self.block_height)
    }

    pub fn vote_on_challenge(
        &mut self,
        proposal_id: u64,
        member: &Address,
        dismiss: bool,
    ) -> Result<Option<bool>, GovernanceError> {
        self.boule
            .vote_on_challenge(proposal_id, member, dismiss, self.block_height)
    }

    // ── Proposals ───────────────────────────────────────────────────────

    pub fn submit_proposal(&mut self, mut draft: ProposalDraft) -> Result<u64, GovernanceError> {
        self.ensure_not_banned(&draft.proposer)?;
        draft.require_boule_approval |= self.config.boule.screening_required;
        self.voting.create_proposal(draft, Some(&self.staking))
    }

    pub fn cast_vote(&mut self, ballot: &Ballot) -> Result<VoteReceipt, GovernanceError> {
        self.ensure_not_banned(&ballot.voter)?;
        self.ensure_not_challenged(ballot.proposal_id)?;
        let receipt = self.voting.cast_vote(ballot, Some(&self.boule))?;
        if let Some(guard) = self.voting.anti_whale() {
            let supply = self.voting.total_supply();
            if guard.is_whale(receipt.raw_power, supply) {
                tracing::warn!(
                    proposal_id = ballot.proposal_id,
                    voter = %ballot.voter,
                    raw_power = receipt.raw_power,
                    total_supply = supply,
                    "whale ballot"
                );
            }
        }
        Ok(receipt)
    }

    /// Tally and settle the deposit: slashed into the reserve on veto,
    /// returned otherwise.
    pub fn tally(&mut self, proposal_id: u64) -> Result<TallyOutcome, GovernanceError> {
        let outcome = self.voting.tally_votes(proposal_id)?;
        let settled = self
            .voting
            .proposal(proposal_id)
            .is_some_and(|p| p.deposit_returned);
        if !settled {
            if outcome == TallyOutcome::Vetoed {
                let amount = self.voting.slash_deposit(proposal_id)?;
                if amount > 0 {
                    self.treasury.deposit(TreasuryTrack::Reserve, amount)?;
                }
            } else {
                self.voting.return_deposit(proposal_id)?;
            }
        }
        Ok(outcome)
    }

    pub fn execute(&mut self, proposal_id: u64) -> Result<(), GovernanceError> {
        self.ensure_not_challenged(proposal_id)?;
        let targets = ExecutionTargets {
            params: Some(&mut self.params),
            treasury: Some(&mut self.treasury),
        };
        self.voting.execute_proposal(proposal_id, targets)?;
        if self
            .voting
            .proposal(proposal_id)
            .is_some_and(|p| p.proposal_type == ProposalType::ParameterChange)
        {
            self.sync_voting_params();
        }
        Ok(())
    }

    /// Re-read the governable voting parameters from the param store.
    fn sync_voting_params(&mut self) {
        let p = &self.params;
        if let Some(v) = p.get(params::VOTING_PERIOD) {
            self.voting.set_voting_period(v);
        }
        if let Some(v) = p.get(params::DEFAULT_QUORUM) {
            self.voting.set_default_quorum(v);
        }
        if let Some(v) = p.get(params::DEFAULT_THRESHOLD) {
            self.voting.set_default_threshold(v);
        }
        if let Some(v) = p.get(params::VETO_THRESHOLD_BPS) {
            self.voting.set_veto_threshold_bps(v);
        }
        if let Some(v) = p.get(params::EXECUTION_DELAY) {
            self.voting.set_execution_delay(v);
        }
    }

    pub fn proposal(&self, proposal_id: u64) -> Option<&Proposal> {
        self.voting.proposal(proposal_id)
    }

    /// Status as observed now, reporting `Expired` past the horizon.
    pub fn proposal_status(&self, proposal_id: u64) -> Option<ProposalStatus> {
        self.voting
            .proposal(proposal_id)
            .map(|p| p.status_at(self.block_height, self.config.voting.expiry_horizon))
    }

    // ── Ostracism ───────────────────────────────────────────────────────

    pub fn nominate_ostracism(
        &mut self,
        subject: &Address,
        nominator: &Address,
        reason: &str,
    ) -> Result<u64, GovernanceError> {
        self.ensure_not_banned(nominator)?;
        self.ostracism
            .nominate(subject, nominator, reason, self.block_height)
    }

    pub fn vote_ostracism(
        &mut self,
        nomination_id: u64,
        voter: &Address,
        in_favor: bool,
    ) -> Result<(), GovernanceError> {
        self.ensure_not_banned(voter)?;
        self.ostracism.vote(nomination_id, voter, in_favor)
    }

    pub fn finalize_ostracism(&mut self, nomination_id: u64) -> Result<NominationState, GovernanceError> {
        self.ostracism.finalize(nomination_id, self.block_height)
    }

    pub fn active_bans(&self) -> Vec<&Nomination> {
        self.ostracism.active_bans(self.block_height)
    }

    // ── Delegation ──────────────────────────────────────────────────────

    pub fn delegate(&mut self, delegator: &Address, delegatee: &Address, amount: u64) -> Result<(), GovernanceError> {
        self.ensure_not_banned(delegator)?;
        let staked = self.staking.voting_power(delegator);
        let delegated = self.delegation.delegated_by(delegator).saturating_add(amount);
        if delegated > staked {
            return Err(GovernanceError::DelegationExceedsStake { delegated, staked });
        }
        self.delegation.delegate(delegator, delegatee, amount)
    }

    pub fn undelegate(&mut self, delegator: &Address, delegatee: &Address, amount: u64) -> Result<(), GovernanceError> {
        self.delegation.undelegate(delegator, delegatee, amount)
    }
}
