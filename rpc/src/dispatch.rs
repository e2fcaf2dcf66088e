//! Method routing over the governance state.

use polis_governance::{
    Ballot, GovernanceError, Polis, ProposalDraft, ProposalType, Treasury, VoteChoice,
    VotingPowerSource,
};
use polis_monetary::{DenominationTable, MonetarySpec};
use polis_types::{Address, BlockHeight};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use subtle::ConstantTimeEq;

use crate::envelope::{RpcRequest, RpcResponse};
use crate::error::RpcError;
use crate::handlers::*;
use crate::throttle::BlockRateLimiter;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcConfig {
    /// When set, mutating methods require `"auth": <token>` in the request.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Requests accepted per block height. 0 disables the limit.
    #[serde(default)]
    pub max_requests_per_block: u32,
}

/// Methods that only read state and never need the auth token.
const READ_ONLY: &[&str] = &[
    "governance/get_proposal",
    "governance/list_proposals",
    "staking/get_power",
    "treasury/balance",
    "ostracism/list_bans",
    "boule/council",
    "chain/monetary_spec",
];

pub struct Dispatcher {
    config: RpcConfig,
    limiter: BlockRateLimiter,
    monetary_spec: Value,
}

impl Dispatcher {
    pub fn new(config: RpcConfig) -> Result<Self, RpcError> {
        let spec = MonetarySpec::current(&DenominationTable::standard());
        let monetary_spec = serde_json::to_value(spec).map_err(|e| RpcError::Internal(e.to_string()))?;
        Ok(Self {
            limiter: BlockRateLimiter::new(config.max_requests_per_block),
            config,
            monetary_spec,
        })
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Parse, route and serialize one request.
    pub fn handle_str(&mut self, polis: &mut Polis, raw: &str) -> String {
        let response = match serde_json::from_str::<RpcRequest>(raw) {
            Ok(request) => self.handle(polis, &request),
            Err(e) => RpcResponse::failure(Value::Null, &RpcError::Parse(e.to_string())),
        };
        serde_json::to_string(&response).unwrap_or_else(|_| {
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-1,"message":"response serialization failed"}}"#
                .to_string()
        })
    }

    pub fn handle(&mut self, polis: &mut Polis, request: &RpcRequest) -> RpcResponse {
        match self.route(polis, request) {
            Ok(result) => RpcResponse::success(request.id.clone(), result),
            Err(e) => {
                tracing::debug!(method = %request.method, code = e.code(), error = %e, "rpc request failed");
                RpcResponse::failure(request.id.clone(), &e)
            }
        }
    }

    fn route(&mut self, polis: &mut Polis, req: &RpcRequest) -> Result<Value, RpcError> {
        if req.jsonrpc != "2.0" {
            return Err(RpcError::Parse(format!("unsupported jsonrpc version {:?}", req.jsonrpc)));
        }
        let method = req.method.as_str();
        if let Some(token) = &self.config.auth_token {
            if !READ_ONLY.contains(&method) && !token_matches(token, req.auth.as_deref()) {
                return Err(RpcError::AuthRequired);
            }
        }
        // Counted after auth so unauthenticated callers cannot drain the quota.
        if !self.limiter.try_acquire(polis.block_height()) {
            return Err(RpcError::RateLimited);
        }
        let p = &req.params;

        match method {
            // ── Governance ──────────────────────────────────────────────
            "governance/submit_proposal" => {
                let r: SubmitProposalRequest = params(p)?;
                let proposal_type = match r.proposal_type {
                    ProposalTypeParam::Code(code) => ProposalType::from_code(code)
                        .ok_or_else(|| RpcError::InvalidParams(format!("unknown proposal type {code}")))?,
                    ProposalTypeParam::Name(name) => name
                        .parse()
                        .map_err(|_| RpcError::InvalidParams(format!("unknown proposal type {name}")))?,
                };
                let draft = ProposalDraft::new(proposal_type, r.title, address(&r.proposer)?)
                    .with_description(r.description)
                    .with_deposit(r.deposit)
                    .with_execution_data(hex::decode(&r.execution_data)?);
                let proposal_id = polis.submit_proposal(draft)?;
                to_value(SubmitProposalResponse {
                    proposal_id,
                    status: "submitted",
                })
            }
            "governance/vote" => {
                let r: VoteRequest = params(p)?;
                let choice: VoteChoice = r
                    .choice
                    .parse()
                    .map_err(|_| RpcError::InvalidParams(format!("unknown vote choice {}", r.choice)))?;
                let ballot = Ballot {
                    proposal_id: r.proposal_id,
                    voter: address(&r.voter)?,
                    choice,
                    claimed_power: r.voting_power,
                    signature: hex::decode(&r.signature)?,
                };
                polis.cast_vote(&ballot)?;
                to_value(SuccessResponse {
                    success: true,
                    proposal_id: r.proposal_id,
                })
            }
            "governance/tally" => {
                let r: ProposalIdRequest = params(p)?;
                let outcome = polis.tally(r.proposal_id)?;
                let proposal = polis
                    .proposal(r.proposal_id)
                    .ok_or(GovernanceError::ProposalNotFound(r.proposal_id))?;
                to_value(TallyResponse {
                    success: true,
                    status: proposal.status.code(),
                    outcome: outcome.as_str(),
                    yes_votes: proposal.yes_votes,
                    no_votes: proposal.no_votes,
                    abstain_votes: proposal.abstain_votes,
                    veto_votes: proposal.veto_votes,
                })
            }
            "governance/get_proposal" => {
                let r: ProposalIdRequest = params(p)?;
                let proposal = polis
                    .proposal(r.proposal_id)
                    .ok_or(GovernanceError::ProposalNotFound(r.proposal_id))?;
                let horizon = polis.config().voting.expiry_horizon;
                let block = polis.block_height();
                to_value(ProposalView::new(proposal, proposal.status_at(block, horizon), block))
            }
            "governance/list_proposals" => {
                let block = polis.block_height();
                let horizon = polis.config().voting.expiry_horizon;
                let proposals: Vec<ProposalView> = polis
                    .voting()
                    .active_proposals()
                    .into_iter()
                    .map(|p| ProposalView::new(p, p.status_at(block, horizon), block))
                    .collect();
                to_value(ListProposalsResponse {
                    count: proposals.len(),
                    proposals,
                })
            }
            "governance/execute" => {
                let r: ProposalIdRequest = params(p)?;
                polis.execute(r.proposal_id)?;
                to_value(SuccessResponse {
                    success: true,
                    proposal_id: r.proposal_id,
                })
            }
            "governance/cast_review" => {
                let r: ReviewRequest = params(p)?;
                polis.review_proposal(r.proposal_id, &address(&r.member)?, r.approved, &r.rationale)?;
                to_value(SuccessResponse {
                    success: true,
                    proposal_id: r.proposal_id,
                })
            }

            // ── Staking ─────────────────────────────────────────────────
            "staking/stake" => {
                let r: StakeRequest = params(p)?;
                let addr = address(&r.address)?;
                advance_to(polis, r.block_height)?;
                polis.stake(&addr, r.amount, r.lock_for_blocks)?;
                to_value(StakeResponse {
                    success: true,
                    address: r.address,
                    amount: r.amount,
                })
            }
            "staking/unstake" => {
                let r: UnstakeRequest = params(p)?;
                let addr = address(&r.address)?;
                advance_to(polis, r.block_height)?;
                let claimable_at = polis.request_unstake(&addr, r.amount)?;
                to_value(UnstakeResponse {
                    success: true,
                    address: r.address,
                    claimable_at,
                })
            }
            "staking/claim" => {
                let r: AddressRequest = params(p)?;
                let addr = address(&r.address)?;
                advance_to(polis, r.block_height)?;
                let amount = polis.claim_unstake(&addr)?;
                to_value(StakeResponse {
                    success: true,
                    address: r.address,
                    amount,
                })
            }
            "staking/get_power" => {
                let r: AddressRequest = params(p)?;
                let addr = address(&r.address)?;
                to_value(PowerResponse {
                    voting_power: polis.staking().voting_power(&addr),
                    total_power: polis.staking().total_voting_power(),
                    address: r.address,
                })
            }

            // ── Treasury ────────────────────────────────────────────────
            "treasury/balance" => {
                let treasury = polis.treasury();
                to_value(TreasuryBalanceResponse {
                    balances: treasury.balances().into_iter().map(|(t, v)| (t.as_str(), v)).collect(),
                    total: treasury.total_balance(),
                })
            }

            // ── Boule ───────────────────────────────────────────────────
            "boule/register_citizen" => {
                let r: AddressRequest = params(p)?;
                let addr = address(&r.address)?;
                advance_to(polis, r.block_height)?;
                polis.register_citizen(&addr)?;
                Ok(json!({ "success": true, "address": r.address }))
            }
            "boule/sortition" => {
                let r: SortitionRequest = params(p)?;
                let council = polis.conduct_sortition(&hex::decode(&r.seed)?)?;
                Ok(json!({
                    "council": council.iter().map(Address::to_hex).collect::<Vec<_>>(),
                    "term_end": polis.boule().term_end(),
                }))
            }
            "boule/council" => {
                let boule = polis.boule();
                to_value(CouncilResponse {
                    council: boule
                        .council()
                        .iter()
                        .map(|m| CouncilMemberView {
                            address: m.address.to_hex(),
                            selection_index: m.selection_index,
                            selected_at: m.selected_at,
                            term_end: m.term_end,
                        })
                        .collect(),
                    prytany: boule.get_prytany().iter().map(|m| m.address.to_hex()).collect(),
                    term_end: boule.term_end(),
                })
            }

            // ── Ostracism ───────────────────────────────────────────────
            "ostracism/nominate" => {
                let r: NominateRequest = params(p)?;
                let target = address(&r.target)?;
                let nominator = address(&r.nominator)?;
                advance_to(polis, r.block_height)?;
                let nomination_id = polis.nominate_ostracism(&target, &nominator, &r.reason)?;
                to_value(NominateResponse {
                    success: true,
                    nomination_id,
                })
            }
            "ostracism/vote" => {
                let r: OstracismVoteRequest = params(p)?;
                polis.vote_ostracism(r.nomination_id, &address(&r.voter)?, r.in_favor)?;
                Ok(json!({ "success": true, "nomination_id": r.nomination_id }))
            }
            "ostracism/finalize" => {
                let r: NominationIdRequest = params(p)?;
                let state = polis.finalize_ostracism(r.nomination_id)?;
                Ok(json!({ "nomination_id": r.nomination_id, "state": format!("{state:?}") }))
            }
            "ostracism/list_bans" => {
                let r: ListBansRequest = params(p)?;
                let block = r.block_height.unwrap_or_else(|| polis.block_height());
                let bans: Vec<BanView> = polis
                    .ostracism()
                    .active_bans(block)
                    .into_iter()
                    .map(BanView::from)
                    .collect();
                to_value(ListBansResponse {
                    count: bans.len(),
                    bans,
                })
            }

            // ── Delegation ──────────────────────────────────────────────
            "delegation/delegate" | "delegation/undelegate" => {
                let r: DelegationRequest = params(p)?;
                let delegator = address(&r.delegator)?;
                let delegatee = address(&r.delegatee)?;
                if method == "delegation/delegate" {
                    polis.delegate(&delegator, &delegatee, r.amount)?;
                } else {
                    polis.undelegate(&delegator, &delegatee, r.amount)?;
                }
                to_value(DelegationResponse {
                    success: true,
                    delegatee_power: polis.delegation().voting_power(&delegatee),
                })
            }

            // ── Chain ───────────────────────────────────────────────────
            "chain/set_block_height" => {
                let r: BlockHeightRequest = params(p)?;
                polis.set_block_height(r.block_height)?;
                Ok(json!({ "block_height": r.block_height }))
            }
            "chain/monetary_spec" => Ok(self.monetary_spec.clone()),

            other => Err(RpcError::MethodNotFound(other.to_string())),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Deserialize params; absent params read as an empty object.
fn params<T: DeserializeOwned>(value: &Value) -> Result<T, RpcError> {
    let value = match value {
        Value::Null => Value::Object(Default::default()),
        v => v.clone(),
    };
    Ok(serde_json::from_value(value)?)
}

fn address(hex_str: &str) -> Result<Address, RpcError> {
    Ok(Address::new(hex::decode(hex_str)?))
}

/// Constant-time token comparison.
fn token_matches(expected: &str, given: Option<&str>) -> bool {
    given.is_some_and(|g| bool::from(g.as_bytes().ct_eq(expected.as_bytes())))
}

/// Move the chain forward. Call only after every param has been decoded,
/// since heights never go back.
fn advance_to(polis: &mut Polis, block: Option<BlockHeight>) -> Result<(), RpcError> {
    if let Some(block) = block {
        polis.set_block_height(block)?;
    }
    Ok(())
}

fn to_value<T: Serialize>(body: T) -> Result<Value, RpcError> {
    serde_json::to_value(body).map_err(|e| RpcError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polis_crypto::{schnorr_public_key, schnorr_sign, Bip340Verifier, SecretKey};
    use polis_governance::config::GovernanceConfig;
    use polis_governance::vote_payload;

    fn polis() -> Polis {
        Polis::new(GovernanceConfig::default(), Box::new(Bip340Verifier)).unwrap()
    }

    fn call(d: &mut Dispatcher, polis: &mut Polis, method: &str, params: Value) -> Value {
        let raw = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params }).to_string();
        serde_json::from_str(&d.handle_str(polis, &raw)).unwrap()
    }

    fn error_code(response: &Value) -> i64 {
        response["error"]["code"].as_i64().unwrap()
    }

    #[test]
    fn full_proposal_flow() {
        let mut d = Dispatcher::new(RpcConfig::default()).unwrap();
        let mut polis = polis();
        let sk = SecretKey::from_bytes([21u8; 32]);
        let key = schnorr_public_key(&sk).unwrap();
        let voter = hex::encode(key);

        let r = call(&mut d, &mut polis, "staking/stake", json!({ "address": voter, "amount": 400, "lock_for_blocks": 0, "block_height": 10 }));
        assert_eq!(r["result"]["success"], true);

        let r = call(
            &mut d,
            &mut polis,
            "governance/submit_proposal",
            json!({ "type": "GENERAL", "title": "t", "proposer": voter, "deposit": 0, "execution_data": "" }),
        );
        assert_eq!(r["result"]["status"], "submitted");
        let pid = r["result"]["proposal_id"].as_u64().unwrap();

        call(&mut d, &mut polis, "chain/set_block_height", json!({ "block_height": 110 }));
        let payload = vote_payload(pid, &key, VoteChoice::Yes, 400);
        let sig = hex::encode(schnorr_sign(&payload, &sk).unwrap());
        let r = call(
            &mut d,
            &mut polis,
            "governance/vote",
            json!({ "proposal_id": pid, "voter": voter, "choice": "YES", "voting_power": 400, "signature": sig }),
        );
        assert_eq!(r["result"]["success"], true, "{r}");

        let r = call(&mut d, &mut polis, "governance/list_proposals", Value::Null);
        assert_eq!(r["result"]["count"], 1);
        assert_eq!(r["result"]["proposals"][0]["blocks_remaining"], 10_000);

        call(&mut d, &mut polis, "chain/set_block_height", json!({ "block_height": 10_111 }));
        let r = call(&mut d, &mut polis, "governance/tally", json!({ "proposal_id": pid }));
        assert_eq!(r["result"]["status"], 2);
        assert_eq!(r["result"]["yes_votes"], 20);
        assert_eq!(r["result"]["outcome"], "passed");

        let r = call(&mut d, &mut polis, "governance/get_proposal", json!({ "proposal_id": pid }));
        assert_eq!(r["result"]["proposer"], voter);
        assert_eq!(r["result"]["status_name"], "passed");
        assert_eq!(r["result"]["blocks_remaining"], 0);

        let r = call(&mut d, &mut polis, "governance/execute", json!({ "proposal_id": pid }));
        assert_eq!(error_code(&r), -1);
        call(&mut d, &mut polis, "chain/set_block_height", json!({ "block_height": 11_111 }));
        let r = call(&mut d, &mut polis, "governance/execute", json!({ "proposal_id": pid }));
        assert_eq!(r["result"]["success"], true);
    }

    #[test]
    fn error_codes() {
        let mut d = Dispatcher::new(RpcConfig::default()).unwrap();
        let mut polis = polis();
        let parse: Value = serde_json::from_str(&d.handle_str(&mut polis, "{not json")).unwrap();
        assert_eq!(error_code(&parse), -32700);
        assert_eq!(parse["id"], Value::Null);

        let r = call(&mut d, &mut polis, "governance/nope", Value::Null);
        assert_eq!(error_code(&r), -32601);
        let r = call(&mut d, &mut polis, "governance/tally", json!({ "proposal": 1 }));
        assert_eq!(error_code(&r), -32602);
        let r = call(&mut d, &mut polis, "staking/get_power", json!({ "address": "zz" }));
        assert_eq!(error_code(&r), -32602);
        let r = call(&mut d, &mut polis, "governance/tally", json!({ "proposal_id": 9 }));
        assert_eq!(error_code(&r), -1);
        assert!(r["error"]["message"].as_str().unwrap().contains("9"));
    }

    #[test]
    fn auth_and_rate_limit() {
        let mut d = Dispatcher::new(RpcConfig {
            auth_token: Some("secret".into()),
            max_requests_per_block: 3,
        })
        .unwrap();
        let mut polis = polis();
        let stake = r#"{"jsonrpc":"2.0","id":7,"method":"staking/stake","params":{"address":"0101","amount":5}}"#;
        let r: Value = serde_json::from_str(&d.handle_str(&mut polis, stake)).unwrap();
        assert_eq!(error_code(&r), -32600);
        assert_eq!(r["id"], 7);

        let authed = r#"{"jsonrpc":"2.0","id":8,"method":"staking/stake","auth":"secret","params":{"address":"0101","amount":5}}"#;
        let r: Value = serde_json::from_str(&d.handle_str(&mut polis, authed)).unwrap();
        assert_eq!(r["result"]["amount"], 5);

        let r = call(&mut d, &mut polis, "treasury/balance", Value::Null);
        assert_eq!(r["result"]["total"], 0);
        let r = call(&mut d, &mut polis, "treasury/balance", Value::Null);
        assert_eq!(error_code(&r), -32001);
    }

    #[test]
    fn unauthenticated_requests_do_not_spend_the_quota() {
        let mut d = Dispatcher::new(RpcConfig {
            auth_token: Some("secret".into()),
            max_requests_per_block: 1,
        })
        .unwrap();
        let mut polis = polis();
        for auth in [None, Some("secre"), Some("secret!"), Some("")] {
            let mut req = json!({
                "jsonrpc": "2.0", "id": 1, "method": "staking/stake",
                "params": { "address": "0101", "amount": 5 },
            });
            if let Some(a) = auth {
                req["auth"] = json!(a);
            }
            let r: Value = serde_json::from_str(&d.handle_str(&mut polis, &req.to_string())).unwrap();
            assert_eq!(error_code(&r), -32600);
        }

        let authed = r#"{"jsonrpc":"2.0","id":2,"method":"staking/stake","auth":"secret","params":{"address":"0101","amount":5}}"#;
        let r: Value = serde_json::from_str(&d.handle_str(&mut polis, authed)).unwrap();
        assert_eq!(r["result"]["amount"], 5, "{r}");
        let r: Value = serde_json::from_str(&d.handle_str(&mut polis, authed)).unwrap();
        assert_eq!(error_code(&r), -32001);
    }

    #[test]
    fn bad_params_leave_block_height_untouched() {
        let mut d = Dispatcher::new(RpcConfig::default()).unwrap();
        let mut polis = polis();
        let start = polis.block_height();
        let cases = [
            ("staking/stake", json!({ "address": "zz", "amount": 5, "block_height": 50_000 })),
            ("staking/unstake", json!({ "address": "0x", "amount": 5, "block_height": 50_000 })),
            ("staking/claim", json!({ "address": "not hex", "block_height": 50_000 })),
            ("boule/register_citizen", json!({ "address": "q1", "block_height": 50_000 })),
            (
                "ostracism/nominate",
                json!({ "target": "0202", "nominator": "zz", "reason": "x", "block_height": 50_000 }),
            ),
        ];
        for (method, params) in cases {
            let r = call(&mut d, &mut polis, method, params);
            assert_eq!(error_code(&r), -32602, "{method}: {r}");
            assert_eq!(polis.block_height(), start, "{method} moved the chain");
        }
    }

    #[test]
    fn monetary_spec_and_bans() {
        let mut d = Dispatcher::new(RpcConfig::default()).unwrap();
        let mut polis = polis();
        let r = call(&mut d, &mut polis, "chain/monetary_spec", Value::Null);
        assert_eq!(r["result"]["spec_hash"].as_str().unwrap().len(), 16);
        assert_eq!(r["result"]["ratios"]["ob_per_tal"], 36000);

        let r = call(
            &mut d,
            &mut polis,
            "ostracism/nominate",
            json!({ "target": "aa", "nominator": "bb", "reason": "spam", "block_height": 5 }),
        );
        let id = r["result"]["nomination_id"].as_u64().unwrap();
        for voter in ["cc", "dd", "ee"] {
            call(&mut d, &mut polis, "ostracism/vote", json!({ "nomination_id": id, "voter": voter, "in_favor": true }));
        }
        let r = call(&mut d, &mut polis, "ostracism/finalize", json!({ "nomination_id": id }));
        assert_eq!(r["result"]["state"], "Ostracized");
        let r = call(&mut d, &mut polis, "ostracism/list_bans", json!({}));
        assert_eq!(r["result"]["count"], 1);
        assert_eq!(r["result"]["bans"][0]["address"], "aa");
        assert_eq!(r["result"]["bans"][0]["ban_end"], 100_005);
    }
}
