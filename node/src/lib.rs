//! Polis node: owns the governance state and serves JSON-RPC strings.
//!
//! The node is the embedding layer that:
//! - Loads [`NodeConfig`] from TOML
//! - Refuses to start when the monetary unit system is inconsistent
//! - Builds the composite governance state with a BIP-340 verifier
//! - Routes raw JSON-RPC requests through the dispatcher
//!
//! Transport is left to the embedding; [`Node::handle_rpc`] takes and
//! returns strings.

pub mod config;
pub mod error;
pub mod logging;
pub mod node;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use node::Node;
