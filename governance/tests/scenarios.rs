//! End-to-end governance scenarios with real BIP-340 keys.

use polis_crypto::{schnorr_public_key, schnorr_sign, Bip340Verifier, SecretKey};
use polis_governance::config::GovernanceConfig;
use polis_governance::params::VOTING_PERIOD;
use polis_governance::{
    vote_payload, Ballot, Boule, BouleConfig, ExecutionTargets, GovParams, GovernanceError,
    ParameterChange, Polis, ProposalDraft, ProposalStatus, ProposalType, TallyOutcome, Treasury,
    TreasurySpend, TreasuryTrack, VoteChoice, VotingSystem,
};
use polis_nullables::{NullVerifier, RecordingParams, RecordingTreasury, ScriptedHandler};
use polis_types::Address;
use std::sync::atomic::Ordering;

struct Citizen {
    sk: SecretKey,
    addr: Address,
}

impl Citizen {
    fn new(seed: u8) -> Self {
        let sk = SecretKey::from_bytes([seed; 32]);
        let addr = Address::from(schnorr_public_key(&sk).unwrap());
        Self { sk, addr }
    }

    fn ballot(&self, pid: u64, choice: VoteChoice, claimed: u64) -> Ballot {
        let key: [u8; 32] = self.addr.as_bytes().try_into().unwrap();
        let payload = vote_payload(pid, &key, choice, claimed);
        Ballot {
            proposal_id: pid,
            voter: self.addr.clone(),
            choice,
            claimed_power: claimed,
            signature: schnorr_sign(&payload, &self.sk).unwrap().to_vec(),
        }
    }
}

fn polis_with(edit: impl FnOnce(&mut GovernanceConfig)) -> Polis {
    polis_utils::init_tracing();
    let mut config = GovernanceConfig::default();
    edit(&mut config);
    Polis::new(config, Box::new(Bip340Verifier)).unwrap()
}

fn general(proposer: &Address) -> ProposalDraft {
    ProposalDraft::new(ProposalType::General, "scenario", proposer.clone())
}

// ── S1: anti-whale scales the tally ─────────────────────────────────────

#[test]
fn s1_quadratic_scaling_in_tally() {
    let mut polis = polis_with(|_| {});
    let whale = Citizen::new(1);
    polis.stake(&whale.addr, 10_000, 0).unwrap();

    let pid = polis.submit_proposal(general(&whale.addr)).unwrap();
    assert_eq!(polis.proposal(pid).unwrap().voting_start, 100);

    polis.set_block_height(101).unwrap();
    let receipt = polis.cast_vote(&whale.ballot(pid, VoteChoice::Yes, 10_000)).unwrap();
    assert_eq!(receipt.raw_power, 10_000);
    assert_eq!(receipt.effective_power, 100);

    polis.set_block_height(10_102).unwrap();
    let outcome = polis.tally(pid).unwrap();
    assert!(matches!(outcome, TallyOutcome::Passed { .. }));
    let p = polis.proposal(pid).unwrap();
    assert_eq!(p.yes_votes, 100);
    assert_eq!(p.status, ProposalStatus::Passed);
    assert_eq!(p.approval_threshold, 50);
    assert!(p.deposit_returned && !p.deposit_slashed);
}

// ── S2: veto rejects and slashes the deposit ────────────────────────────

#[test]
fn s2_veto_rejects_regardless_of_ratio() {
    let mut polis = polis_with(|c| {
        c.voting.anti_whale_enabled = false;
        c.voting.snapshots_enabled = false;
    });
    let voters: Vec<Citizen> = (1..=3).map(Citizen::new).collect();
    let pid = polis
        .submit_proposal(general(&voters[0].addr).with_deposit(250))
        .unwrap();

    polis.set_block_height(100).unwrap();
    polis.cast_vote(&voters[0].ballot(pid, VoteChoice::Yes, 100)).unwrap();
    polis.cast_vote(&voters[1].ballot(pid, VoteChoice::No, 100)).unwrap();
    polis.cast_vote(&voters[2].ballot(pid, VoteChoice::Veto, 101)).unwrap();

    polis.set_block_height(10_101).unwrap();
    assert_eq!(polis.tally(pid), Ok(TallyOutcome::Vetoed));
    let p = polis.proposal(pid).unwrap();
    assert_eq!(p.status, ProposalStatus::Rejected);
    assert_eq!(p.total_votes(), 301);
    assert!(p.deposit_slashed);
    assert_eq!(polis.treasury().balance(TreasuryTrack::Reserve), 250);

    // Re-tally keeps the status and does not slash twice.
    assert_eq!(polis.tally(pid), Ok(TallyOutcome::Vetoed));
    assert_eq!(polis.treasury().balance(TreasuryTrack::Reserve), 250);
}

// ── S3: the snapshot freezes power at creation ──────────────────────────

#[test]
fn s3_snapshot_ignores_later_stake() {
    let mut polis = polis_with(|c| c.voting.anti_whale_enabled = false);
    let a = Citizen::new(1);
    let b = Citizen::new(2);

    polis.set_block_height(500).unwrap();
    polis.stake(&a.addr, 1000, 0).unwrap();
    polis.stake(&b.addr, 500, 0).unwrap();
    let pid = polis.submit_proposal(general(&a.addr)).unwrap();
    assert_eq!(polis.proposal(pid).unwrap().voting_start, 600);

    polis.set_block_height(601).unwrap();
    polis.stake(&a.addr, 4000, 0).unwrap();
    let receipt = polis.cast_vote(&a.ballot(pid, VoteChoice::Yes, 5000)).unwrap();
    assert_eq!(receipt.raw_power, 1000);
    assert_eq!(polis.proposal(pid).unwrap().yes_votes, 1000);

    // Someone who staked after the snapshot has no power on this proposal.
    let late = Citizen::new(3);
    polis.stake(&late.addr, 10, 0).unwrap();
    assert_eq!(
        polis.cast_vote(&late.ballot(pid, VoteChoice::No, 10)),
        Err(GovernanceError::NoSnapshotPower)
    );

    let snapshot = polis.voting().snapshots().unwrap().get(pid).unwrap();
    assert_eq!(snapshot.total_power, 1500);
    assert_eq!(snapshot.block_height, 600);
}

// ── S4: Boule screening blocks then unblocks ────────────────────────────

#[test]
fn s4_screening_gate() {
    let mut polis = polis_with(|c| {
        c.boule.council_size = 3;
        c.boule.screening_required = true;
        c.voting.snapshots_enabled = false;
    });
    let members: Vec<Citizen> = (1..=3).map(Citizen::new).collect();
    for m in &members {
        polis.register_citizen(&m.addr).unwrap();
    }
    polis.conduct_sortition(&[1, 2, 3, 4]).unwrap();

    let voter = Citizen::new(9);
    let pid = polis.submit_proposal(general(&voter.addr)).unwrap();
    polis.set_block_height(150).unwrap();

    assert_eq!(
        polis.cast_vote(&voter.ballot(pid, VoteChoice::Yes, 10)),
        Err(GovernanceError::NotScreened(pid))
    );
    polis.review_proposal(pid, &members[0].addr, true, "sound").unwrap();
    assert!(polis.cast_vote(&voter.ballot(pid, VoteChoice::Yes, 10)).is_err());
    polis.review_proposal(pid, &members[1].addr, true, "sound").unwrap();
    assert!(polis.cast_vote(&voter.ballot(pid, VoteChoice::Yes, 10)).is_ok());
}

#[test]
fn s4_challenge_blocks_voting() {
    let mut polis = polis_with(|c| {
        c.boule.council_size = 3;
        c.boule.screening_required = true;
        c.voting.snapshots_enabled = false;
    });
    let members: Vec<Citizen> = (1..=3).map(Citizen::new).collect();
    for m in &members {
        polis.register_citizen(&m.addr).unwrap();
    }
    polis.conduct_sortition(&[0xCA, 0xFE, 0, 0]).unwrap();
    let voter = Citizen::new(9);
    let pid = polis.submit_proposal(general(&voter.addr)).unwrap();
    polis.review_proposal(pid, &members[0].addr, true, "").unwrap();
    polis.review_proposal(pid, &members[1].addr, true, "").unwrap();
    polis.raise_challenge(pid, &members[2].addr, "violates the constitution").unwrap();

    polis.set_block_height(100).unwrap();
    assert_eq!(
        polis.cast_vote(&voter.ballot(pid, VoteChoice::Yes, 1)),
        Err(GovernanceError::NotScreened(pid))
    );
    polis.vote_on_challenge(pid, &members[0].addr, true).unwrap();
    assert_eq!(polis.vote_on_challenge(pid, &members[1].addr, true), Ok(Some(false)));
    assert!(polis.cast_vote(&voter.ballot(pid, VoteChoice::Yes, 1)).is_ok());
}

#[test]
fn upheld_challenge_blocks_an_approved_proposal() {
    let mut polis = polis_with(|c| {
        c.boule.council_size = 3;
        c.boule.screening_required = true;
        c.voting.snapshots_enabled = false;
    });
    let members: Vec<Citizen> = (1..=3).map(Citizen::new).collect();
    for m in &members {
        polis.register_citizen(&m.addr).unwrap();
    }
    polis.conduct_sortition(&[0xCA, 0xFE, 0, 0]).unwrap();
    let first = Citizen::new(9);
    let second = Citizen::new(10);
    let pid = polis.submit_proposal(general(&first.addr)).unwrap();
    polis.review_proposal(pid, &members[0].addr, true, "").unwrap();
    polis.review_proposal(pid, &members[1].addr, true, "").unwrap();

    polis.set_block_height(100).unwrap();
    assert!(polis.cast_vote(&first.ballot(pid, VoteChoice::Yes, 1)).is_ok());

    polis.raise_challenge(pid, &members[2].addr, "violates the constitution").unwrap();
    polis.vote_on_challenge(pid, &members[0].addr, false).unwrap();
    assert_eq!(polis.vote_on_challenge(pid, &members[1].addr, false), Ok(Some(true)));

    assert_eq!(
        polis.cast_vote(&second.ballot(pid, VoteChoice::Yes, 1)),
        Err(GovernanceError::NotScreened(pid))
    );
    polis.set_block_height(10_101).unwrap();
    assert!(matches!(polis.tally(pid), Ok(TallyOutcome::Passed { .. })));
    polis.advance_blocks(1000).unwrap();
    assert_eq!(polis.execute(pid), Err(GovernanceError::NotScreened(pid)));
    assert_eq!(polis.proposal(pid).unwrap().status, ProposalStatus::Passed);
}

// ── S5: sortition determinism ───────────────────────────────────────────

#[test]
fn s5_sortition_is_deterministic() {
    let draw = || {
        let mut boule = Boule::new(BouleConfig {
            council_size: 3,
            term_blocks: 10_000,
            min_stake: 0,
            screening_required: false,
        });
        for b in 0x01..=0x0A {
            boule.register_citizen(&Address::from([b; 32]), 1, 0).unwrap();
        }
        boule.conduct_sortition(&[0xDE, 0xAD, 0xBE, 0xEF], 100).unwrap().to_vec()
    };
    let first = draw();
    let second = draw();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    for (i, m) in first.iter().enumerate() {
        assert_eq!(m.selection_index, i);
    }
}

// ── Execution ───────────────────────────────────────────────────────────

fn passed_proposal(polis: &mut Polis, draft: ProposalDraft) -> u64 {
    let voter = Citizen::new(42);
    if polis.staking().record(&voter.addr).is_none() {
        polis.stake(&voter.addr, 100, 0).unwrap();
    }
    let start = polis.block_height();
    let pid = polis.submit_proposal(draft).unwrap();
    polis.set_block_height(start + 100).unwrap();
    polis.cast_vote(&voter.ballot(pid, VoteChoice::Yes, 100)).unwrap();
    polis.set_block_height(start + 10_101).unwrap();
    assert!(matches!(polis.tally(pid).unwrap(), TallyOutcome::Passed { .. }));
    pid
}

#[test]
fn parameter_change_resyncs_voting_system() {
    let mut polis = polis_with(|_| {});
    let data = ParameterChange::new(VOTING_PERIOD, 500).encode().unwrap();
    let proposer = Address::from([7u8; 32]);
    let pid = passed_proposal(
        &mut polis,
        ProposalDraft::new(ProposalType::ParameterChange, "shorter votes", proposer.clone()).with_execution_data(data),
    );
    polis.advance_blocks(1000).unwrap();
    polis.execute(pid).unwrap();
    assert_eq!(polis.proposal(pid).unwrap().status, ProposalStatus::Executed);
    assert_eq!(polis.params().get(VOTING_PERIOD), Some(500));
    assert_eq!(polis.voting().voting_period(), 500);

    let next = polis.submit_proposal(general(&proposer)).unwrap();
    let p = polis.proposal(next).unwrap();
    assert_eq!(p.voting_end - p.voting_start, 500);
}

#[test]
fn out_of_range_parameter_stays_passed() {
    let mut polis = polis_with(|_| {});
    let data = ParameterChange::new("default_threshold", 250).encode().unwrap();
    let pid = passed_proposal(
        &mut polis,
        ProposalDraft::new(ProposalType::ParameterChange, "bad", Address::from([7u8; 32])).with_execution_data(data),
    );
    polis.advance_blocks(1000).unwrap();
    assert!(matches!(polis.execute(pid), Err(GovernanceError::ParameterOutOfRange { .. })));
    assert_eq!(polis.proposal(pid).unwrap().status, ProposalStatus::Passed);
}

#[test]
fn treasury_spend_executes_from_uncategorized() {
    let mut polis = polis_with(|c| c.treasury.uncategorized = 1_000);
    let recipient = Address::from([0x55u8; 32]);
    let data = TreasurySpend::new(400, recipient.clone()).encode().unwrap();
    let pid = passed_proposal(
        &mut polis,
        ProposalDraft::new(ProposalType::TreasurySpending, "grant", Address::from([7u8; 32])).with_execution_data(data),
    );
    polis.advance_blocks(1000).unwrap();
    polis.execute(pid).unwrap();
    assert_eq!(polis.treasury().balance(TreasuryTrack::Uncategorized), 600);
    let spend = &polis.treasury().spends()[0];
    assert_eq!((spend.amount, &spend.recipient, spend.proposal_id), (400, &recipient, pid));
    assert_eq!(spend.memo, "proposal execution");
    assert!(polis.execute(pid).is_err());
}

#[test]
fn executed_proposal_cannot_be_retallied() {
    let mut polis = polis_with(|c| c.treasury.uncategorized = 1_000);
    let data = TreasurySpend::new(400, Address::from([0x55u8; 32])).encode().unwrap();
    let pid = passed_proposal(
        &mut polis,
        ProposalDraft::new(ProposalType::TreasurySpending, "grant", Address::from([7u8; 32])).with_execution_data(data),
    );
    polis.advance_blocks(1000).unwrap();
    polis.execute(pid).unwrap();

    assert_eq!(
        polis.tally(pid),
        Err(GovernanceError::WrongStatus {
            expected: ProposalStatus::Active,
            actual: ProposalStatus::Executed,
        })
    );
    assert_eq!(polis.proposal(pid).unwrap().status, ProposalStatus::Executed);
    assert!(matches!(polis.execute(pid), Err(GovernanceError::WrongStatus { .. })));
    assert_eq!(polis.treasury().balance(TreasuryTrack::Uncategorized), 600);
    assert_eq!(polis.treasury().spends().len(), 1);
}

#[test]
fn malformed_execution_data_is_retryable() {
    let mut polis = polis_with(|c| c.treasury.uncategorized = 1_000);
    let pid = passed_proposal(
        &mut polis,
        ProposalDraft::new(ProposalType::TreasurySpending, "truncated", Address::from([7u8; 32]))
            .with_execution_data(vec![1, 2, 3]),
    );
    polis.advance_blocks(1000).unwrap();
    assert!(matches!(polis.execute(pid), Err(GovernanceError::MalformedExecutionData(_))));
    assert_eq!(polis.proposal(pid).unwrap().status, ProposalStatus::Passed);
    assert_eq!(polis.treasury().balance(TreasuryTrack::Uncategorized), 1_000);
}

// ── Nullable collaborators ──────────────────────────────────────────────

fn passed_with(vs: &mut VotingSystem, draft: ProposalDraft) -> u64 {
    let pid = vs.create_proposal(draft, None).unwrap();
    vs.set_block_height(vs.current_block() + 100);
    let ballot = Ballot {
        proposal_id: pid,
        voter: Address::from([1u8; 32]),
        choice: VoteChoice::Yes,
        claimed_power: 10,
        signature: vec![0u8; 64],
    };
    vs.cast_vote(&ballot, None).unwrap();
    vs.set_block_height(vs.current_block() + 10_001);
    vs.tally_votes(pid).unwrap();
    vs.set_block_height(vs.current_block() + 1_000);
    pid
}

#[test]
fn null_verifier_counts_and_rejects() {
    let verifier = NullVerifier::rejecting();
    let calls = verifier.calls();
    let mut vs = VotingSystem::new(Box::new(verifier));
    let pid = vs
        .create_proposal(general(&Address::from([2u8; 32])), None)
        .unwrap();
    vs.set_block_height(100);
    let ballot = Ballot {
        proposal_id: pid,
        voter: Address::from([1u8; 32]),
        choice: VoteChoice::No,
        claimed_power: 1,
        signature: vec![0u8; 64],
    };
    assert_eq!(vs.cast_vote(&ballot, None), Err(GovernanceError::InvalidSignature));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(vs.verifier_name(), "null-verifier");
}

#[test]
fn recording_collaborators_receive_dispatch() {
    let mut vs = VotingSystem::new(Box::new(NullVerifier::accepting()));
    let proposer = Address::from([2u8; 32]);

    let param_data = ParameterChange::new("anything", 9).encode().unwrap();
    let p1 = passed_with(
        &mut vs,
        ProposalDraft::new(ProposalType::ParameterChange, "p", proposer.clone()).with_execution_data(param_data),
    );
    let mut params = RecordingParams::new();
    vs.execute_proposal(p1, ExecutionTargets { params: Some(&mut params), treasury: None })
        .unwrap();
    assert_eq!(params.updates, vec![("anything".to_string(), 9, p1, vs.current_block())]);
    assert_eq!(params.get("anything"), Some(9));

    let spend_data = TreasurySpend::new(5, Address::from([3u8; 32])).encode().unwrap();
    let p2 = passed_with(
        &mut vs,
        ProposalDraft::new(ProposalType::TreasurySpending, "t", proposer.clone()).with_execution_data(spend_data),
    );
    let mut failing = RecordingTreasury::failing();
    assert!(vs
        .execute_proposal(p2, ExecutionTargets { params: None, treasury: Some(&mut failing) })
        .is_err());
    let mut treasury = RecordingTreasury::new();
    vs.execute_proposal(p2, ExecutionTargets { params: None, treasury: Some(&mut treasury) })
        .unwrap();
    assert_eq!(treasury.spends.len(), 1);
    assert_eq!(treasury.spends[0].track, TreasuryTrack::Uncategorized);
    assert_eq!(treasury.total_balance(), 0);
}

#[test]
fn absent_collaborator_is_a_noop() {
    let mut vs = VotingSystem::new(Box::new(NullVerifier::accepting()));
    let pid = passed_with(
        &mut vs,
        ProposalDraft::new(ProposalType::ParameterChange, "p", Address::from([2u8; 32])).with_execution_data(vec![0xff]),
    );
    vs.execute_proposal(pid, ExecutionTargets::default()).unwrap();
    assert_eq!(vs.proposal(pid).unwrap().status, ProposalStatus::Executed);
}

#[test]
fn failing_params_keep_proposal_passed() {
    let mut vs = VotingSystem::new(Box::new(NullVerifier::accepting()));
    let data = ParameterChange::new("k", 1).encode().unwrap();
    let pid = passed_with(
        &mut vs,
        ProposalDraft::new(ProposalType::ParameterChange, "p", Address::from([2u8; 32])).with_execution_data(data),
    );
    let mut params = RecordingParams::failing();
    assert!(vs
        .execute_proposal(pid, ExecutionTargets { params: Some(&mut params), treasury: None })
        .is_err());
    assert_eq!(vs.proposal(pid).unwrap().status, ProposalStatus::Passed);
}

#[test]
fn scripted_handler_retries() {
    let mut vs = VotingSystem::new(Box::new(NullVerifier::accepting()));
    let handler = ScriptedHandler::new([false, false], true);
    let log = handler.log();
    vs.set_execution_handler(Box::new(handler));
    let pid = passed_with(
        &mut vs,
        ProposalDraft::new(ProposalType::ProtocolUpgrade, "u", Address::from([2u8; 32])),
    );
    assert_eq!(vs.execute_proposal(pid, ExecutionTargets::default()), Err(GovernanceError::HandlerRejected));
    assert_eq!(vs.execute_proposal(pid, ExecutionTargets::default()), Err(GovernanceError::HandlerRejected));
    vs.execute_proposal(pid, ExecutionTargets::default()).unwrap();
    assert_eq!(log.lock().unwrap().len(), 3);
    assert_eq!(vs.proposal(pid).unwrap().status, ProposalStatus::Executed);
}
