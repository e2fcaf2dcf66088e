//! The Polis node: governance state plus the RPC dispatcher in front of it.

use std::path::Path;

use polis_crypto::{Bip340Verifier, SignatureVerifier};
use polis_governance::Polis;
use polis_monetary::{monetary_spec_hash_hex, validate_monetary_invariants};
use polis_rpc::Dispatcher;
use polis_types::BlockHeight;

use crate::config::NodeConfig;
use crate::error::NodeError;

pub struct Node {
    config: NodeConfig,
    polis: Polis,
    dispatcher: Dispatcher,
}

impl Node {
    /// Start a node with the BIP-340 ballot verifier.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        Self::with_verifier(config, Box::new(Bip340Verifier))
    }

    /// Start a node with a caller-supplied ballot verifier.
    pub fn with_verifier(
        config: NodeConfig,
        verifier: Box<dyn SignatureVerifier>,
    ) -> Result<Self, NodeError> {
        if !validate_monetary_invariants() {
            tracing::error!("monetary unit ratios are inconsistent");
            return Err(NodeError::MonetaryInvariant);
        }
        config.validate()?;

        let mut polis = Polis::new(config.governance.clone(), verifier)?;
        polis.set_block_height(config.genesis_block)?;
        let dispatcher = Dispatcher::new(config.rpc.clone())?;

        tracing::info!(
            genesis_block = config.genesis_block,
            spec_hash = %monetary_spec_hash_hex(),
            rpc_auth = config.rpc.auth_token.is_some(),
            rpc_rate_limit = config.rpc.max_requests_per_block,
            "node started"
        );
        Ok(Self {
            config,
            polis,
            dispatcher,
        })
    }

    /// Load a TOML config file and start a node from it.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        Self::new(NodeConfig::from_toml_file(path)?)
    }

    /// Serve one raw JSON-RPC request. Always yields a JSON-RPC response.
    pub fn handle_rpc(&mut self, request: &str) -> String {
        self.dispatcher.handle_str(&mut self.polis, request)
    }

    /// Feed a new chain height to governance.
    pub fn on_block(&mut self, block: BlockHeight) -> Result<(), NodeError> {
        self.polis.set_block_height(block)?;
        tracing::trace!(block, "block height advanced");
        Ok(())
    }

    pub fn block_height(&self) -> BlockHeight {
        self.polis.block_height()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn polis(&self) -> &Polis {
        &self.polis
    }

    pub fn polis_mut(&mut self) -> &mut Polis {
        &mut self.polis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_genesis_block() {
        let config = NodeConfig {
            genesis_block: 250,
            ..NodeConfig::default()
        };
        let node = Node::new(config).unwrap();
        assert_eq!(node.block_height(), 250);
        assert_eq!(node.polis().voting().current_block(), 250);
    }

    #[test]
    fn block_height_is_monotonic() {
        let mut node = Node::new(NodeConfig::default()).unwrap();
        node.on_block(10).unwrap();
        assert!(matches!(node.on_block(9), Err(NodeError::Governance(_))));
        assert_eq!(node.block_height(), 10);
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = NodeConfig::default();
        config.governance.voting.voting_period = 0;
        assert!(matches!(Node::new(config), Err(NodeError::Governance(_))));
    }
}
