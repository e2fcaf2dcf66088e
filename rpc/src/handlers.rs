//! RPC request and response bodies.
//!
//! Byte fields (addresses, signatures, execution data, seeds) travel as
//! lower-case hex strings.

use polis_governance::{Nomination, Proposal};
use polis_types::BlockHeight;
use polis_utils::blocks_until;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A proposal type given either by name or by numeric code.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProposalTypeParam {
    Code(u8),
    Name(String),
}

// ── Governance ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitProposalRequest {
    #[serde(rename = "type")]
    pub proposal_type: ProposalTypeParam,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub proposer: String,
    #[serde(default)]
    pub deposit: u64,
    #[serde(default)]
    pub execution_data: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitProposalResponse {
    pub proposal_id: u64,
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub proposal_id: u64,
    pub voter: String,
    pub choice: String,
    pub voting_power: u64,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct ProposalIdRequest {
    pub proposal_id: u64,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub proposal_id: u64,
}

#[derive(Debug, Serialize)]
pub struct TallyResponse {
    pub success: bool,
    pub status: u8,
    pub outcome: &'static str,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub abstain_votes: u64,
    pub veto_votes: u64,
}

#[derive(Debug, Serialize)]
pub struct ProposalView {
    pub id: u64,
    #[serde(rename = "type")]
    pub proposal_type: u8,
    pub type_name: &'static str,
    pub status: u8,
    pub status_name: &'static str,
    pub title: String,
    pub description: String,
    pub proposer: String,
    pub execution_data: String,
    pub creation_time: BlockHeight,
    pub voting_start: BlockHeight,
    pub voting_end: BlockHeight,
    /// Blocks left before voting closes, zero once it has.
    pub blocks_remaining: u64,
    pub execution_time: BlockHeight,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub abstain_votes: u64,
    pub veto_votes: u64,
    pub quorum_requirement: u64,
    pub approval_threshold: u64,
    pub veto_threshold_bps: u64,
    pub deposit_amount: u64,
    pub deposit_returned: bool,
    pub deposit_slashed: bool,
    pub require_boule_approval: bool,
    pub boule_approved: bool,
}

impl ProposalView {
    /// `status` is passed in so callers can report the time-aware status.
    pub fn new(p: &Proposal, status: polis_governance::ProposalStatus, block: BlockHeight) -> Self {
        Self {
            id: p.id,
            proposal_type: p.proposal_type.code(),
            type_name: p.proposal_type.as_str(),
            status: status.code(),
            status_name: status.as_str(),
            title: p.title.clone(),
            description: p.description.clone(),
            proposer: p.proposer.to_hex(),
            execution_data: hex::encode(&p.execution_data),
            creation_time: p.creation_time,
            voting_start: p.voting_start,
            voting_end: p.voting_end,
            blocks_remaining: blocks_until(block, p.voting_end),
            execution_time: p.execution_time,
            yes_votes: p.yes_votes,
            no_votes: p.no_votes,
            abstain_votes: p.abstain_votes,
            veto_votes: p.veto_votes,
            quorum_requirement: p.quorum_requirement,
            approval_threshold: p.approval_threshold,
            veto_threshold_bps: p.veto_threshold_bps,
            deposit_amount: p.deposit_amount,
            deposit_returned: p.deposit_returned,
            deposit_slashed: p.deposit_slashed,
            require_boule_approval: p.require_boule_approval,
            boule_approved: p.boule_approved,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListProposalsResponse {
    pub proposals: Vec<ProposalView>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub proposal_id: u64,
    pub member: String,
    pub approved: bool,
    #[serde(default)]
    pub rationale: String,
}

// ── Staking ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StakeRequest {
    pub address: String,
    pub amount: u64,
    #[serde(default)]
    pub lock_for_blocks: u64,
    pub block_height: Option<BlockHeight>,
}

#[derive(Debug, Serialize)]
pub struct StakeResponse {
    pub success: bool,
    pub address: String,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct UnstakeRequest {
    pub address: String,
    pub amount: u64,
    pub block_height: Option<BlockHeight>,
}

#[derive(Debug, Serialize)]
pub struct UnstakeResponse {
    pub success: bool,
    pub address: String,
    pub claimable_at: BlockHeight,
}

#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    pub address: String,
    pub block_height: Option<BlockHeight>,
}

#[derive(Debug, Serialize)]
pub struct PowerResponse {
    pub address: String,
    pub voting_power: u64,
    pub total_power: u64,
}

// ── Treasury ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TreasuryBalanceResponse {
    pub balances: BTreeMap<&'static str, u64>,
    pub total: u64,
}

// ── Boule ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SortitionRequest {
    pub seed: String,
}

#[derive(Debug, Serialize)]
pub struct CouncilMemberView {
    pub address: String,
    pub selection_index: usize,
    pub selected_at: BlockHeight,
    pub term_end: BlockHeight,
}

#[derive(Debug, Serialize)]
pub struct CouncilResponse {
    pub council: Vec<CouncilMemberView>,
    pub prytany: Vec<String>,
    pub term_end: Option<BlockHeight>,
}

// ── Ostracism ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NominateRequest {
    pub target: String,
    pub nominator: String,
    #[serde(default)]
    pub reason: String,
    pub block_height: Option<BlockHeight>,
}

#[derive(Debug, Serialize)]
pub struct NominateResponse {
    pub success: bool,
    pub nomination_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct OstracismVoteRequest {
    pub nomination_id: u64,
    pub voter: String,
    pub in_favor: bool,
}

#[derive(Debug, Deserialize)]
pub struct NominationIdRequest {
    pub nomination_id: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListBansRequest {
    pub block_height: Option<BlockHeight>,
}

#[derive(Debug, Serialize)]
pub struct BanView {
    pub address: String,
    pub ban_end: BlockHeight,
    pub reason: String,
}

impl From<&Nomination> for BanView {
    fn from(n: &Nomination) -> Self {
        Self {
            address: n.subject.to_hex(),
            ban_end: n.ban_end.unwrap_or_default(),
            reason: n.reason.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListBansResponse {
    pub bans: Vec<BanView>,
    pub count: usize,
}

// ── Delegation ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DelegationRequest {
    pub delegator: String,
    pub delegatee: String,
    pub amount: u64,
}

#[derive(Debug, Serialize)]
pub struct DelegationResponse {
    pub success: bool,
    pub delegatee_power: u64,
}

// ── Chain ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BlockHeightRequest {
    pub block_height: BlockHeight,
}
