//! # Memory-Limit Split
//!
//! A volume's target memory limit is divided between the two resident
//! tiers: the uncompressed hot cache gets at most half the budget, and what
//! that actually buys is further capped by a rule of thumb — enough blocks
//! to iterate along any axis-aligned edge of the block grid without
//! thrashing. Whatever the hot cache does not claim becomes the byte budget
//! for compressed residents, which the eviction sweep enforces.
//!
//! When no explicit limit is set, the default is detected from system RAM
//! the way the rest of this stack does it: a fixed percentage with a floor.

use std::sync::OnceLock;

use sysinfo::System;

use crate::config::{
    DEFAULT_MEMORY_BUDGET_PERCENT, MIN_MEMORY_BUDGET, MIN_UNCOMPRESSED_BLOCKS,
};
use crate::region::Region;

static SYSTEM_TOTAL_MEMORY: OnceLock<usize> = OnceLock::new();

/// Default target memory limit: a percentage of system RAM, floored.
pub(crate) fn auto_target_limit() -> usize {
    let total_memory = *SYSTEM_TOTAL_MEMORY.get_or_init(|| {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.total_memory() as usize
    });

    let budget = (total_memory * DEFAULT_MEMORY_BUDGET_PERCENT) / 100;
    budget.max(MIN_MEMORY_BUDGET)
}

/// Outcome of dividing a target limit between the two resident tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BudgetSplit {
    pub max_uncompressed_blocks: u32,
    pub compressed_limit: usize,
}

/// Splits `target_bytes` between the uncompressed cache and the compressed
/// block budget for a volume whose block grid is `blocks`.
pub(crate) fn split_target_limit(
    target_bytes: usize,
    uncompressed_block_bytes: usize,
    blocks: &Region,
) -> BudgetSplit {
    // Covers iteration along any axis-aligned edge of the block grid.
    let ideal = blocks.width() as u64 + blocks.height() as u64 * blocks.depth() as u64;

    // Never spend more than half the budget on the hot cache.
    let fits = ((target_bytes / 2) / uncompressed_block_bytes.max(1)) as u64;

    let max_uncompressed_blocks = ideal
        .min(fits)
        .clamp(MIN_UNCOMPRESSED_BLOCKS as u64, u32::MAX as u64) as u32;

    let hot_cache_bytes =
        (max_uncompressed_blocks as usize).saturating_mul(uncompressed_block_bytes);

    BudgetSplit {
        max_uncompressed_blocks,
        compressed_limit: target_bytes.saturating_sub(hot_cache_bytes),
    }
}
