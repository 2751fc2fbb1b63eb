//! # Pagers
//!
//! The pager is the volume's external persistence collaborator. The volume
//! calls `page_in` right after creating an empty `CompressedBlock` for a
//! coordinate it has never seen, and `page_out` immediately before
//! forgetting a block. What happens on the other side — files, a database,
//! procedural generation, or nothing at all — is the application's
//! business; the volume only sees the compressed buffer.
//!
//! The `region` passed to both calls is the inclusive voxel region the
//! block covers (`lower = B * S`, `upper = lower + (S-1, S-1, S-1)`), which
//! gives pagers a stable, coordinate-addressed key.

use eyre::Result;

use crate::block::CompressedBlock;
use crate::region::Region;
use crate::voxel::Voxel;

/// Persistence contract for paged-out blocks.
pub trait Pager<V: Voxel> {
    /// Fills a newly created block for a never-seen region.
    ///
    /// On return the block's buffer must decompress to exactly one block of
    /// voxels. Leaving the buffer empty is the "no stored data" answer: the
    /// volume then fills the block with default voxels itself.
    fn page_in(&mut self, region: Region, block: &mut CompressedBlock) -> Result<()>;

    /// Persists (or drops) a block that is about to be evicted. After this
    /// call returns the volume forgets the block.
    fn page_out(&mut self, region: Region, block: &CompressedBlock) -> Result<()>;
}

/// A pager that stores nothing: paged-in blocks come back as default
/// voxels, paged-out blocks are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPager;

impl<V: Voxel> Pager<V> for NullPager {
    fn page_in(&mut self, _region: Region, _block: &mut CompressedBlock) -> Result<()> {
        Ok(())
    }

    fn page_out(&mut self, _region: Region, _block: &CompressedBlock) -> Result<()> {
        Ok(())
    }
}
