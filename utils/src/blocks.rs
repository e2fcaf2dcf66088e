//! Block-height arithmetic helpers for display.

use polis_types::BlockHeight;

/// Blocks remaining until `target`, zero once it has been reached.
pub fn blocks_until(current: BlockHeight, target: BlockHeight) -> u64 {
    target.saturating_sub(current)
}

/// Format a span of blocks as wall-clock time given the block interval.
pub fn format_block_span(blocks: u64, block_time_secs: u64) -> String {
    let secs = blocks.saturating_mul(block_time_secs);
    if secs < 60 {
        format!("{} blocks (~{}s)", blocks, secs)
    } else if secs < 3600 {
        format!("{} blocks (~{}m)", blocks, secs / 60)
    } else if secs < 86400 {
        format!("{} blocks (~{}h {}m)", blocks, secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{} blocks (~{}d {}h)", blocks, secs / 86400, (secs % 86400) / 3600)
    }
}
