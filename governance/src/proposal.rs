//! Proposal, ballot and status types.

use polis_types::{Address, BlockHeight};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GovernanceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalType {
    ParameterChange,
    TreasurySpending,
    ProtocolUpgrade,
    General,
    Constitutional,
    Emergency,
}

impl ProposalType {
    pub const ALL: [ProposalType; 6] = [
        ProposalType::ParameterChange,
        ProposalType::TreasurySpending,
        ProposalType::ProtocolUpgrade,
        ProposalType::General,
        ProposalType::Constitutional,
        ProposalType::Emergency,
    ];

    pub fn code(&self) -> u8 {
        match self {
            ProposalType::ParameterChange => 0,
            ProposalType::TreasurySpending => 1,
            ProposalType::ProtocolUpgrade => 2,
            ProposalType::General => 3,
            ProposalType::Constitutional => 4,
            ProposalType::Emergency => 5,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalType::ParameterChange => "PARAMETER_CHANGE",
            ProposalType::TreasurySpending => "TREASURY_SPENDING",
            ProposalType::ProtocolUpgrade => "PROTOCOL_UPGRADE",
            ProposalType::General => "GENERAL",
            ProposalType::Constitutional => "CONSTITUTIONAL",
            ProposalType::Emergency => "EMERGENCY",
        }
    }
}

impl fmt::Display for ProposalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalType {
    type Err = GovernanceError;

    /// Accepts the upper-case name or the numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Self::from_code(code)
                .ok_or_else(|| GovernanceError::Config(format!("unknown proposal type {s}")));
        }
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| GovernanceError::Config(format!("unknown proposal type {s}")))
    }
}

/// Lifecycle status. Numeric codes are part of the RPC surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    Pending,
    Active,
    Passed,
    Rejected,
    Executed,
    Expired,
}

impl ProposalStatus {
    pub fn code(&self) -> u8 {
        match self {
            ProposalStatus::Pending => 0,
            ProposalStatus::Active => 1,
            ProposalStatus::Passed => 2,
            ProposalStatus::Rejected => 3,
            ProposalStatus::Executed => 4,
            ProposalStatus::Expired => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Active => "active",
            ProposalStatus::Passed => "passed",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Executed => "executed",
            ProposalStatus::Expired => "expired",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteChoice {
    Yes,
    No,
    Abstain,
    Veto,
}

impl VoteChoice {
    /// Tag byte used in the signed ballot payload.
    pub fn tag(&self) -> u8 {
        match self {
            VoteChoice::Yes => 0,
            VoteChoice::No => 1,
            VoteChoice::Abstain => 2,
            VoteChoice::Veto => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(VoteChoice::Yes),
            1 => Some(VoteChoice::No),
            2 => Some(VoteChoice::Abstain),
            3 => Some(VoteChoice::Veto),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteChoice::Yes => "YES",
            VoteChoice::No => "NO",
            VoteChoice::Abstain => "ABSTAIN",
            VoteChoice::Veto => "VETO",
        }
    }
}

impl FromStr for VoteChoice {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YES" => Ok(VoteChoice::Yes),
            "NO" => Ok(VoteChoice::No),
            "ABSTAIN" => Ok(VoteChoice::Abstain),
            "VETO" => Ok(VoteChoice::Veto),
            other => Err(GovernanceError::Config(format!("unknown vote choice {other}"))),
        }
    }
}

/// What a proposer submits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposalDraft {
    pub proposal_type: ProposalType,
    pub title: String,
    pub description: String,
    pub proposer: Address,
    pub deposit: u64,
    pub execution_data: Vec<u8>,
    pub require_boule_approval: bool,
    /// Overrides the system default quorum.
    pub quorum: Option<u64>,
    /// Overrides the system default veto threshold.
    pub veto_threshold_bps: Option<u64>,
}

impl ProposalDraft {
    pub fn new(proposal_type: ProposalType, title: impl Into<String>, proposer: Address) -> Self {
        Self {
            proposal_type,
            title: title.into(),
            description: String::new(),
            proposer,
            deposit: 0,
            execution_data: Vec::new(),
            require_boule_approval: false,
            quorum: None,
            veto_threshold_bps: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_deposit(mut self, deposit: u64) -> Self {
        self.deposit = deposit;
        self
    }

    pub fn with_execution_data(mut self, data: Vec<u8>) -> Self {
        self.execution_data = data;
        self
    }

    pub fn with_screening(mut self, required: bool) -> Self {
        self.require_boule_approval = required;
        self
    }

    pub fn with_quorum(mut self, quorum: u64) -> Self {
        self.quorum = Some(quorum);
        self
    }

    pub fn with_veto_threshold_bps(mut self, bps: u64) -> Self {
        self.veto_threshold_bps = Some(bps);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    pub proposal_type: ProposalType,
    pub status: ProposalStatus,
    pub title: String,
    pub description: String,
    pub proposer: Address,
    pub execution_data: Vec<u8>,

    pub creation_time: BlockHeight,
    pub voting_start: BlockHeight,
    pub voting_end: BlockHeight,
    /// 0 until a tally passes.
    pub execution_time: BlockHeight,

    pub yes_votes: u64,
    pub no_votes: u64,
    pub abstain_votes: u64,
    pub veto_votes: u64,

    pub quorum_requirement: u64,
    /// Percent of YES among YES+NO.
    pub approval_threshold: u64,
    /// 0 falls back to the system default at tally time.
    pub veto_threshold_bps: u64,

    pub deposit_amount: u64,
    /// The deposit decision has been recorded (returned or slashed).
    pub deposit_returned: bool,
    pub deposit_slashed: bool,

    pub require_boule_approval: bool,
    pub boule_approved: bool,
    /// Block of the last tally, if any.
    pub tallied_at: Option<BlockHeight>,
}

impl Proposal {
    pub fn total_votes(&self) -> u64 {
        self.yes_votes
            .saturating_add(self.no_votes)
            .saturating_add(self.abstain_votes)
            .saturating_add(self.veto_votes)
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, ProposalStatus::Pending | ProposalStatus::Active)
    }

    /// Status as observed at `block`: an untallied proposal whose voting
    /// ended more than `expiry_horizon` blocks ago reads as `Expired`.
    pub fn status_at(&self, block: BlockHeight, expiry_horizon: u64) -> ProposalStatus {
        if self.is_open() && block > self.voting_end.saturating_add(expiry_horizon) {
            ProposalStatus::Expired
        } else {
            self.status
        }
    }

    pub(crate) fn credit(&mut self, choice: VoteChoice, power: u64) -> Result<(), GovernanceError> {
        use polis_monetary::safe_arith::add;
        let bucket = match choice {
            VoteChoice::Yes => &mut self.yes_votes,
            VoteChoice::No => &mut self.no_votes,
            VoteChoice::Abstain => &mut self.abstain_votes,
            VoteChoice::Veto => &mut self.veto_votes,
        };
        *bucket = add(*bucket, power)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_id: u64,
    pub voter: Address,
    pub choice: VoteChoice,
    /// Effective (scaled) power credited to the tally.
    pub voting_power: u64,
    pub timestamp: BlockHeight,
    pub signature: Vec<u8>,
}
