//! On-chain governance for the Polis chain, modeled on the Athenian polis.
//!
//! Components, composed bottom-up:
//! - [`StakingRegistry`]: locked tokens become voting power, with cooldown unstake and slashing
//! - [`SnapshotRegistry`]: per-proposal frozen (address, power) maps
//! - [`AntiWhaleGuard`]: quadratic scaling, hard cap, whale detection
//! - [`Boule`]: citizen registration, council sortition, screening, graphe paranomon
//! - [`VotingSystem`]: proposal lifecycle, signed ballots, tally, execution dispatch
//! - satellites: [`TreasuryLedger`], [`Ostracism`], [`DelegationSystem`], [`ParamStore`]
//!
//! [`Polis`] owns all of them and is the single mutator the embedding drives
//! once per block.

pub mod anti_whale;
pub mod boule;
pub mod config;
pub mod delegation;
pub mod error;
pub mod ostracism;
pub mod params;
pub mod payload;
pub mod polis;
pub mod proposal;
pub mod snapshot;
pub mod staking;
pub mod treasury;
pub mod voting;

pub use anti_whale::{AntiWhaleConfig, AntiWhaleGuard};
pub use boule::{Boule, BouleConfig, Citizen, CouncilMember, GrapheParanomon, Review};
pub use config::GovernanceConfig;
pub use delegation::{DelegationSnapshot, DelegationSystem};
pub use error::GovernanceError;
pub use ostracism::{Nomination, NominationState, Ostracism, OstracismConfig};
pub use params::{GovParams, ParamChange, ParamStore};
pub use payload::{vote_payload, ParameterChange, TreasurySpend, VOTE_PAYLOAD_LEN};
pub use polis::Polis;
pub use proposal::{Proposal, ProposalDraft, ProposalStatus, ProposalType, Vote, VoteChoice};
pub use snapshot::{Snapshot, SnapshotRegistry};
pub use staking::{SlashRecord, StakeRecord, StakingRegistry, UnstakeRequest, UnstakeStatus, VotingPowerSource};
pub use treasury::{SpendRecord, Treasury, TreasuryLedger, TreasuryTrack};
pub use voting::{
    Ballot, ExecutionHandler, ExecutionTargets, ProposalScreener, TallyOutcome, VoteReceipt,
    VotingSystem,
};
