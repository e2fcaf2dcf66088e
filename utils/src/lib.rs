//! Shared utilities for Polis.

pub mod blocks;
pub mod logging;

pub use blocks::{blocks_until, format_block_span};
pub use logging::init_tracing;
