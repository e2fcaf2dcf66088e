//! JSON-RPC 2.0 surface for a Polis node.
//!
//! Transport-agnostic: the [`Dispatcher`] takes a request string and the
//! governance state and returns a response string. Provides methods for:
//! - Proposal submission, voting, tallying and execution
//! - Staking, unstaking and voting-power queries
//! - Boule registration, sortition and screening reviews
//! - Ostracism and delegation
//! - Treasury balances and the monetary spec

pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod throttle;

pub use dispatch::{Dispatcher, RpcConfig};
pub use envelope::{ErrorObject, RpcRequest, RpcResponse};
pub use error::RpcError;
pub use throttle::BlockRateLimiter;
