//! Property tests for the node's block-height handling.

use polis_node::{Node, NodeConfig};
use proptest::prelude::*;

proptest! {
    /// The node height only moves forward; stale heights are refused and
    /// leave it at the highest block seen so far.
    #[test]
    fn block_height_tracks_the_highest_block(
        genesis in 0u64..1_000,
        blocks in proptest::collection::vec(0u64..5_000, 1..40),
    ) {
        let config = NodeConfig { genesis_block: genesis, ..NodeConfig::default() };
        let mut node = Node::new(config).unwrap();
        let mut highest = genesis;
        for block in blocks {
            let result = node.on_block(block);
            if block >= highest {
                prop_assert!(result.is_ok());
                highest = block;
            } else {
                prop_assert!(result.is_err());
            }
            prop_assert_eq!(node.block_height(), highest);
            prop_assert_eq!(node.polis().voting().current_block(), highest);
        }
    }
}
