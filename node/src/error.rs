use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("governance error: {0}")]
    Governance(#[from] polis_governance::GovernanceError),

    #[error("RPC error: {0}")]
    Rpc(#[from] polis_rpc::RpcError),

    #[error("monetary invariants do not hold; refusing to start")]
    MonetaryInvariant,

    #[error("config error: {0}")]
    Config(String),

    #[error("unknown log format: {0}")]
    LogFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
