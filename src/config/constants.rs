//! # Volume Store Configuration Constants
//!
//! Constants that depend on each other are co-located and guarded with
//! compile-time assertions so a careless edit fails the build rather than
//! corrupting addressing at runtime.
//!
//! ```text
//! DEFAULT_BLOCK_SIDE_LENGTH (32)
//!       │
//!       └─> must be a non-zero power of two: voxel coordinates are split
//!           into (block, offset) by arithmetic shift and mask, which is
//!           only exact for power-of-two sides.
//!
//! DEFAULT_MEMORY_BUDGET_PERCENT (25) ── MIN_MEMORY_BUDGET (4 MB)
//!       Auto-detected target limit: a quarter of system RAM, floored so
//!       the store stays functional on constrained machines.
//! ```

/// Default block side length in voxels.
///
/// Smaller blocks compress and decompress faster but there are more of
/// them, so per-voxel addressing pays more map lookups.
pub const DEFAULT_BLOCK_SIDE_LENGTH: u16 = 32;

/// Default memory budget as a percentage of system RAM.
pub const DEFAULT_MEMORY_BUDGET_PERCENT: usize = 25;

/// Minimum memory budget floor in bytes (4 MB).
pub const MIN_MEMORY_BUDGET: usize = 4 * 1024 * 1024;

/// Lower bound on the uncompressed-cache capacity. The block currently
/// being materialised must always fit.
pub const MIN_UNCOMPRESSED_BLOCKS: u32 = 1;

const _: () = assert!(
    DEFAULT_BLOCK_SIDE_LENGTH.is_power_of_two(),
    "DEFAULT_BLOCK_SIDE_LENGTH must be a power of two for shift/mask addressing"
);

const _: () = assert!(
    MIN_UNCOMPRESSED_BLOCKS >= 1,
    "the uncompressed cache must hold at least the block being accessed"
);
