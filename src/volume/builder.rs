//! # Volume Builder
//!
//! Fluent configuration for [`PagedVolume`]. Every setting has a default —
//! block side from [`crate::config`], the deflate codec, no pager, default
//! border voxel, auto-detected memory target — so the minimal build is just
//! `PagedVolume::builder(region).build()`.

use eyre::Result;

use crate::codec::{Codec, DeflateCodec};
use crate::config::DEFAULT_BLOCK_SIDE_LENGTH;
use crate::pager::Pager;
use crate::region::Region;
use crate::volume::PagedVolume;
use crate::voxel::Voxel;

/// Builder for configuring a [`PagedVolume`].
///
/// Use `PagedVolume::builder(valid_region)` to create one, chain the
/// settings you care about, then call [`VolumeBuilder::build`].
pub struct VolumeBuilder<V: Voxel> {
    valid_region: Region,
    block_side_length: u16,
    codec: Option<Box<dyn Codec>>,
    pager: Option<Box<dyn Pager<V>>>,
    border_value: V,
    target_memory_limit: Option<usize>,
}

impl<V: Voxel> VolumeBuilder<V> {
    pub(crate) fn new(valid_region: Region) -> Self {
        Self {
            valid_region,
            block_side_length: DEFAULT_BLOCK_SIDE_LENGTH,
            codec: None,
            pager: None,
            border_value: V::default(),
            target_memory_limit: None,
        }
    }

    /// Sets the block side length in voxels. Must be a non-zero power of
    /// two; validated by [`VolumeBuilder::build`].
    pub fn block_side_length(mut self, side_length: u16) -> Self {
        self.block_side_length = side_length;
        self
    }

    /// Supplies the codec used to compress resident blocks. Defaults to
    /// [`DeflateCodec`].
    pub fn codec<C: Codec + 'static>(mut self, codec: C) -> Self {
        self.codec = Some(Box::new(codec));
        self
    }

    /// Supplies the pager that persists evicted blocks and initialises new
    /// ones. Without a pager, new blocks are default-filled and evicted
    /// blocks are dropped.
    pub fn pager<P: Pager<V> + 'static>(mut self, pager: P) -> Self {
        self.pager = Some(Box::new(pager));
        self
    }

    /// Sets the value returned for out-of-range reads via `get_voxel_at`.
    pub fn border_value(mut self, value: V) -> Self {
        self.border_value = value;
        self
    }

    /// Sets the total memory target in bytes. Defaults to a percentage of
    /// system RAM with a floor.
    pub fn target_memory_limit(mut self, bytes: usize) -> Self {
        self.target_memory_limit = Some(bytes);
        self
    }

    /// Validates the configuration and constructs the volume.
    pub fn build(self) -> Result<PagedVolume<V>> {
        let codec = self
            .codec
            .unwrap_or_else(|| Box::new(DeflateCodec::new()) as Box<dyn Codec>);

        let mut volume = PagedVolume::with_pager(
            self.valid_region,
            Some(codec),
            self.pager,
            self.block_side_length,
        )?;
        volume.set_border_value(self.border_value);
        if let Some(bytes) = self.target_memory_limit {
            volume.set_target_memory_limit(bytes)?;
        }
        Ok(volume)
    }
}
