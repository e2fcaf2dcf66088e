//! Per-block request limiter.
//!
//! A budget of `max_per_block` requests refills whenever the chain moves
//! to a new block height. Zero disables the limit.

use polis_types::BlockHeight;

pub struct BlockRateLimiter {
    max_per_block: u32,
    block: BlockHeight,
    used: u32,
}

impl BlockRateLimiter {
    pub fn new(max_per_block: u32) -> Self {
        Self {
            max_per_block,
            block: 0,
            used: 0,
        }
    }

    /// Try to spend one request at `block`.
    ///
    /// Returns `false` if the budget for this block is exhausted.
    pub fn try_acquire(&mut self, block: BlockHeight) -> bool {
        if self.max_per_block == 0 {
            return true;
        }
        if block != self.block {
            self.block = block;
            self.used = 0;
        }
        if self.used >= self.max_per_block {
            return false;
        }
        self.used += 1;
        true
    }

    pub fn max_per_block(&self) -> u32 {
        self.max_per_block
    }

    /// Requests left at the block seen last.
    pub fn remaining(&self) -> u32 {
        self.max_per_block.saturating_sub(self.used)
    }
}

impl Default for BlockRateLimiter {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_refills_per_block() {
        let mut limiter = BlockRateLimiter::new(2);
        assert!(limiter.try_acquire(5));
        assert!(limiter.try_acquire(5));
        assert!(!limiter.try_acquire(5));
        assert_eq!(limiter.remaining(), 0);
        assert!(limiter.try_acquire(6));
        assert_eq!(limiter.remaining(), 1);
    }

    #[test]
    fn test_zero_is_unlimited() {
        let mut limiter = BlockRateLimiter::default();
        for _ in 0..1000 {
            assert!(limiter.try_acquire(1));
        }
    }
}
