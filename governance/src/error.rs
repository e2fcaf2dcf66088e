use polis_monetary::ArithError;
use polis_types::Address;
use thiserror::Error;

use crate::proposal::ProposalStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("arithmetic: {0}")]
    Arithmetic(#[from] ArithError),

    #[error("address must not be empty")]
    EmptyAddress,

    #[error("amount must be greater than zero")]
    ZeroAmount,

    // ── Staking ─────────────────────────────────────────────────────────
    #[error("no stake recorded for {0}")]
    NoStake(Address),

    #[error("stake is locked until block {until}")]
    StakeLocked { until: u64 },

    #[error("insufficient unlocked stake: available {available}, requested {requested}")]
    InsufficientStake { available: u64, requested: u64 },

    #[error("an unstake request is already pending")]
    PendingUnstakeExists,

    #[error("no pending unstake request")]
    NoPendingUnstake,

    #[error("unstake cooldown active until block {claimable_at}")]
    CooldownActive { claimable_at: u64 },

    // ── Snapshots and proposals ─────────────────────────────────────────
    #[error("snapshot for proposal {0} already exists")]
    SnapshotExists(u64),

    #[error("proposal {0} not found")]
    ProposalNotFound(u64),

    #[error("proposal {0} has not been approved by the Boule")]
    NotScreened(u64),

    #[error("block {block} is outside the voting period {start}..={end}")]
    OutsideVotingPeriod { block: u64, start: u64, end: u64 },

    #[error("{0} has already voted on this proposal")]
    AlreadyVoted(Address),

    #[error("signature must be 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    #[error("voter must be a 32-byte key, got {0} bytes")]
    InvalidVoterLength(usize),

    #[error("ballot signature verification failed")]
    InvalidSignature,

    #[error("voter has no power in the proposal snapshot")]
    NoSnapshotPower,

    #[error("voting ends at block {end}, current block {block}")]
    VotingNotEnded { block: u64, end: u64 },

    #[error("proposal is {actual:?}, expected {expected:?}")]
    WrongStatus {
        expected: ProposalStatus,
        actual: ProposalStatus,
    },

    #[error("execution not allowed before block {execution_time}")]
    ExecutionTooEarly { execution_time: u64 },

    #[error("malformed execution data: {0}")]
    MalformedExecutionData(String),

    #[error("custom execution handler rejected the proposal")]
    HandlerRejected,

    #[error("deposit already settled")]
    DepositSettled,

    // ── Parameters and treasury ─────────────────────────────────────────
    #[error("unknown parameter {0}")]
    UnknownParameter(String),

    #[error("parameter {key} = {value} outside [{min}, {max}]")]
    ParameterOutOfRange {
        key: String,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("treasury track {track} holds {have}, need {need}")]
    InsufficientTreasury { track: String, have: u64, need: u64 },

    // ── Boule ───────────────────────────────────────────────────────────
    #[error("stake {stake} below the citizen minimum {min}")]
    BelowMinStake { stake: u64, min: u64 },

    #[error("{0} is already registered")]
    AlreadyRegistered(Address),

    #[error("{0} is not a registered citizen")]
    NotRegistered(Address),

    #[error("sortition seed must be at least 4 bytes, got {0}")]
    SeedTooShort(usize),

    #[error("{eligible} eligible citizens, council needs {needed}")]
    NotEnoughCitizens { eligible: usize, needed: usize },

    #[error("{0} is not on the current council")]
    NotCouncilMember(Address),

    #[error("{0} has already reviewed this proposal")]
    AlreadyReviewed(Address),

    #[error("an unresolved challenge already exists for proposal {0}")]
    ChallengeActive(u64),

    #[error("proposal {0} was struck down by an upheld challenge")]
    ChallengeUpheld(u64),

    #[error("no open challenge for proposal {0}")]
    NoOpenChallenge(u64),

    // ── Ostracism ───────────────────────────────────────────────────────
    #[error("nominator cannot nominate themselves")]
    SelfNomination,

    #[error("nomination {0} not found")]
    NominationNotFound(u64),

    #[error("nomination {0} is closed")]
    NominationClosed(u64),

    #[error("{0} already has an open nomination or an active ban")]
    AlreadyNominated(Address),

    #[error("{0} is ostracized")]
    Banned(Address),

    // ── Delegation ──────────────────────────────────────────────────────
    #[error("cannot delegate to self")]
    SelfDelegation,

    #[error("delegator already has the maximum of {0} delegatees")]
    TooManyDelegatees(usize),

    #[error("delegated {delegated} exceeds staked power {staked}")]
    DelegationExceedsStake { delegated: u64, staked: u64 },

    #[error("delegation of {have} is smaller than {requested}")]
    InsufficientDelegation { have: u64, requested: u64 },

    // ── Embedding ───────────────────────────────────────────────────────
    #[error("block height cannot move backwards from {current} to {requested}")]
    BlockHeightRegression { current: u64, requested: u64 },

    #[error("config: {0}")]
    Config(String),

    #[error("persistence: {0}")]
    Persistence(String),
}
