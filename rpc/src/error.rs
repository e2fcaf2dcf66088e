//! RPC error types and their wire codes.

use polis_governance::GovernanceError;
use thiserror::Error;

pub const AUTH_REQUIRED: i64 = -32600;
pub const PARSE_ERROR: i64 = -32700;
pub const RATE_LIMITED: i64 = -32001;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
/// Every domain failure.
pub const GENERIC: i64 = -1;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("rate limited")]
    RateLimited,

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("{0}")]
    Governance(#[from] GovernanceError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RpcError {
    pub fn code(&self) -> i64 {
        match self {
            RpcError::Parse(_) => PARSE_ERROR,
            RpcError::AuthRequired => AUTH_REQUIRED,
            RpcError::RateLimited => RATE_LIMITED,
            RpcError::MethodNotFound(_) => METHOD_NOT_FOUND,
            RpcError::InvalidParams(_) => INVALID_PARAMS,
            RpcError::Governance(_) | RpcError::Internal(_) => GENERIC,
        }
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(e: serde_json::Error) -> Self {
        RpcError::InvalidParams(e.to_string())
    }
}

impl From<hex::FromHexError> for RpcError {
    fn from(e: hex::FromHexError) -> Self {
        RpcError::InvalidParams(format!("bad hex: {e}"))
    }
}
