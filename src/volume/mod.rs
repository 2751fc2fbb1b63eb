//! # Paged Volume Store
//!
//! This module implements the block-paged volume store: voxel get/set over
//! an unbounded coordinate space, backed by two resident tiers and an
//! external pager.
//!
//! ## Architecture Overview
//!
//! ```text
//! get_voxel / set_voxel
//!       │  shift + mask
//!       ▼
//! (BlockCoord, in-block offset)
//!       │
//!       ▼
//! uncompressed cache ── miss ──> block index ── miss ──> pager.page_in
//!  (hashbrown map,                (BTreeMap of             (or default
//!   bounded count,                 CompressedBlock,         payload)
//!   decompressed via               byte-budgeted,
//!   the codec)                     LRU-evicted via
//!                                  pager.page_out)
//! ```
//!
//! ## Resident-State Invariants
//!
//! - A block is either absent, compressed-only, or compressed **and**
//!   uncompressed; never uncompressed-only.
//! - The uncompressed copy may disagree with the compressed payload only
//!   while its dirty flag is set; every path that releases an uncompressed
//!   copy re-compresses it first when dirty.
//! - `last_accessed` stamps are strictly monotonic across all accesses, so
//!   LRU victim selection is total and deterministic.
//!
//! ## Eviction
//!
//! The compressed tier is byte-budgeted: after every page-in, the sweep
//! erases least-recently-stamped blocks (through `pager.page_out`) until
//! the resident compressed footprint fits. The block that triggered the
//! sweep is never its victim, which bounds the overshoot at one block.
//!
//! The uncompressed tier is count-budgeted: materialising a block into a
//! full cache first writes back and drops the entry whose compressed
//! sibling carries the oldest stamp.
//!
//! ## Recency Shortcut
//!
//! The most recently accessed block coordinate is kept aside. A repeat hit
//! skips the index lookup and does not consume a timestamp, which is what
//! keeps tight voxel loops from exhausting the u32 stamp space.
//!
//! ## Thread Safety
//!
//! A volume assumes a single-threaded client. Reads take `&mut self` too:
//! even `get_voxel` updates recency state and can page in and evict.
//! Callers that want parallel readers must serialize or partition by
//! disjoint block coordinates.

mod builder;
mod budget;

pub use builder::VolumeBuilder;

use std::collections::BTreeMap;

use eyre::{bail, ensure, Result};
use hashbrown::HashMap;

use crate::block::{BlockCoord, CompressedBlock, UncompressedBlock};
use crate::codec::{Codec, DeflateCodec};
use crate::config::MIN_UNCOMPRESSED_BLOCKS;
use crate::error::{CodecErrorKind, VolumeError};
use crate::pager::Pager;
use crate::region::Region;
use crate::voxel::Voxel;

/// Policy for voxel coordinates outside the valid region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    /// Fail with `OutOfRange`.
    Validate,
    /// Snap to the nearest in-range coordinate.
    Clamp,
    /// Return a caller-supplied border value (reads only).
    Border,
    /// Skip the range check entirely.
    AssumeValid,
}

impl<V: Voxel + std::fmt::Debug> std::fmt::Debug for PagedVolume<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedVolume")
            .field("valid_region", &self.valid_region)
            .field("valid_region_blocks", &self.valid_region_blocks)
            .field("block_side_length", &self.block_side_length)
            .field("block_shift", &self.block_shift)
            .field("border_value", &self.border_value)
            .field("blocks", &self.blocks)
            .finish_non_exhaustive()
    }
}

/// A sparse voxel volume paged in fixed-size compressed blocks.
pub struct PagedVolume<V: Voxel> {
    valid_region: Region,
    valid_region_blocks: Region,
    block_side_length: u16,
    block_shift: u32,
    border_value: V,

    codec: Box<dyn Codec>,
    pager: Option<Box<dyn Pager<V>>>,

    blocks: BTreeMap<BlockCoord, CompressedBlock>,
    cache: HashMap<BlockCoord, UncompressedBlock<V>>,
    last_block: Option<BlockCoord>,
    timestamp: u32,

    max_uncompressed_blocks: u32,
    compressed_limit: usize,
    default_payload: Option<Vec<u8>>,

    longest_side_length: u32,
    shortest_side_length: u32,
    diagonal_length: f32,
}

impl<V: Voxel> PagedVolume<V> {
    /// Creates a volume with the default codec and no pager: new blocks are
    /// filled with default voxels, evicted blocks are dropped.
    pub fn new(valid_region: Region, block_side_length: u16) -> Result<Self> {
        Self::with_pager(
            valid_region,
            Some(Box::new(DeflateCodec::new())),
            None,
            block_side_length,
        )
    }

    /// Starts a fluent configuration of a volume over `valid_region`.
    pub fn builder(valid_region: Region) -> VolumeBuilder<V> {
        VolumeBuilder::new(valid_region)
    }

    /// Creates a volume with an explicit codec and pager.
    ///
    /// The codec is required; `None` fails with `InvalidArgument`. The
    /// pager is optional: without one, page-in fills blocks with default
    /// voxels and page-out silently drops them.
    pub fn with_pager(
        valid_region: Region,
        codec: Option<Box<dyn Codec>>,
        pager: Option<Box<dyn Pager<V>>>,
        block_side_length: u16,
    ) -> Result<Self> {
        let codec = match codec {
            Some(codec) => codec,
            None => bail!(VolumeError::InvalidArgument {
                reason: "a codec must be provided",
            }),
        };
        ensure!(
            block_side_length != 0,
            VolumeError::InvalidArgument {
                reason: "block side length cannot be zero",
            }
        );
        ensure!(
            block_side_length.is_power_of_two(),
            VolumeError::InvalidArgument {
                reason: "block side length must be a power of two",
            }
        );
        ensure!(
            !valid_region.is_empty(),
            VolumeError::InvalidArgument {
                reason: "valid region must not be empty",
            }
        );

        let block_shift = block_side_length.trailing_zeros();
        let valid_region_blocks = valid_region.to_blocks(block_shift);

        let width = valid_region.width() as u32;
        let height = valid_region.height() as u32;
        let depth = valid_region.depth() as u32;

        let mut volume = Self {
            valid_region,
            valid_region_blocks,
            block_side_length,
            block_shift,
            border_value: V::default(),
            codec,
            pager,
            blocks: BTreeMap::new(),
            cache: HashMap::new(),
            last_block: None,
            timestamp: 0,
            max_uncompressed_blocks: MIN_UNCOMPRESSED_BLOCKS,
            compressed_limit: 0,
            default_payload: None,
            longest_side_length: width.max(height).max(depth),
            shortest_side_length: width.min(height).min(depth),
            diagonal_length: ((width as f32).powi(2)
                + (height as f32).powi(2)
                + (depth as f32).powi(2))
            .sqrt(),
        };
        volume.set_target_memory_limit(budget::auto_target_limit())?;
        Ok(volume)
    }

    /// Reads a voxel under the given wrap mode. `border` is returned for
    /// out-of-range positions under `WrapMode::Border`.
    pub fn get_voxel(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        wrap_mode: WrapMode,
        border: V,
    ) -> Result<V> {
        match wrap_mode {
            WrapMode::Validate => {
                ensure!(
                    self.valid_region.contains_point(x, y, z),
                    VolumeError::OutOfRange { x, y, z }
                );
                self.read_voxel(x, y, z)
            }
            WrapMode::Clamp => {
                let (x, y, z) = self.valid_region.clamp_point(x, y, z);
                self.read_voxel(x, y, z)
            }
            WrapMode::Border => {
                if self.valid_region.contains_point(x, y, z) {
                    self.read_voxel(x, y, z)
                } else {
                    Ok(border)
                }
            }
            WrapMode::AssumeValid => self.read_voxel(x, y, z),
        }
    }

    /// Reads a voxel, returning the volume's border value for out-of-range
    /// positions.
    pub fn get_voxel_at(&mut self, x: i32, y: i32, z: i32) -> Result<V> {
        if self.valid_region.contains_point(x, y, z) {
            self.read_voxel(x, y, z)
        } else {
            Ok(self.border_value)
        }
    }

    /// Writes a voxel. Only `Validate` and `AssumeValid` are legal wrap
    /// modes for writes; `Clamp` and `Border` fail with `InvalidArgument`.
    pub fn set_voxel(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        value: V,
        wrap_mode: WrapMode,
    ) -> Result<()> {
        match wrap_mode {
            WrapMode::AssumeValid => {}
            WrapMode::Validate => {
                ensure!(
                    self.valid_region.contains_point(x, y, z),
                    VolumeError::OutOfRange { x, y, z }
                );
            }
            WrapMode::Clamp | WrapMode::Border => bail!(VolumeError::InvalidArgument {
                reason: "writes accept only the Validate or AssumeValid wrap modes",
            }),
        }
        self.write_voxel(x, y, z, value)
    }

    /// Writes a voxel if the position is inside the valid region. Returns
    /// whether the write happened.
    pub fn set_voxel_at(&mut self, x: i32, y: i32, z: i32, value: V) -> Result<bool> {
        if !self.valid_region.contains_point(x, y, z) {
            return Ok(false);
        }
        self.write_voxel(x, y, z, value)?;
        Ok(true)
    }

    /// Pages in every absent block covered by `region`, without
    /// decompressing any of them. Already-resident blocks are skipped, and
    /// the number of page-ins is capped at the number of blocks the region
    /// covers, so a prefetch never evicts its own freshly loaded blocks.
    pub fn prefetch(&mut self, region: Region) -> Result<()> {
        let block_region = region.to_blocks(self.block_shift);
        let mut remaining = block_region.voxel_count();

        for x in block_region.lower_x()..=block_region.upper_x() {
            for y in block_region.lower_y()..=block_region.upper_y() {
                for z in block_region.lower_z()..=block_region.upper_z() {
                    let coord = BlockCoord::new(x, y, z);
                    if self.blocks.contains_key(&coord) {
                        // Leaving resident blocks compressed keeps a large
                        // prefetch from churning the uncompressed cache.
                        continue;
                    }
                    if remaining == 0 {
                        return Ok(());
                    }
                    remaining -= 1;
                    self.touch_compressed(coord)?;
                }
            }
        }
        Ok(())
    }

    /// Erases every resident block covered by `region`, paging each one out.
    pub fn flush(&mut self, region: Region) -> Result<()> {
        let block_region = region.to_blocks(self.block_shift);
        let resident: Vec<BlockCoord> = self
            .blocks
            .keys()
            .copied()
            .filter(|coord| block_region.contains_point(coord.x, coord.y, coord.z))
            .collect();
        for coord in resident {
            self.erase_block(coord)?;
        }
        Ok(())
    }

    /// Erases every resident block, paging each one out.
    pub fn flush_all(&mut self) -> Result<()> {
        // Erasure invalidates iteration, so snapshot the keys first.
        let resident: Vec<BlockCoord> = self.blocks.keys().copied().collect();
        for coord in resident {
            self.erase_block(coord)?;
        }
        Ok(())
    }

    /// Sets the total memory target and derives the two tier budgets from
    /// it: at most half the target for the uncompressed cache (further
    /// capped by the edge-iteration rule of thumb), the remainder for
    /// resident compressed blocks. Clears the uncompressed cache.
    pub fn set_target_memory_limit(&mut self, target_bytes: usize) -> Result<()> {
        let split = budget::split_target_limit(
            target_bytes,
            self.uncompressed_block_bytes(),
            &self.valid_region_blocks,
        );
        self.set_max_uncompressed_blocks(split.max_uncompressed_blocks)?;
        self.compressed_limit = split.compressed_limit;
        Ok(())
    }

    /// Bounds the uncompressed cache to `count` blocks (at least one) and
    /// clears it, writing dirty entries back first.
    pub fn set_max_uncompressed_blocks(&mut self, count: u32) -> Result<()> {
        self.clear_uncompressed_cache()?;
        self.max_uncompressed_blocks = count.max(MIN_UNCOMPRESSED_BLOCKS);
        Ok(())
    }

    /// Total resident footprint: volume bookkeeping, compressed blocks and
    /// cached uncompressed blocks. Reporting only.
    pub fn calculate_size_in_bytes(&self) -> usize {
        let mut total = std::mem::size_of::<Self>();
        total += self
            .blocks
            .values()
            .map(|block| block.size_in_bytes())
            .sum::<usize>();
        total += self
            .cache
            .values()
            .map(|block| block.size_in_bytes())
            .sum::<usize>();
        total
    }

    /// Resident compressed bytes over the raw size of the same blocks.
    /// Reporting only; 1.0 for an empty volume.
    pub fn calculate_compression_ratio(&self) -> f32 {
        let raw = self.blocks.len() * self.uncompressed_block_bytes();
        if raw == 0 {
            return 1.0;
        }
        self.compressed_bytes_in_use() as f32 / raw as f32
    }

    /// Cloning a volume would decompress and copy every resident block;
    /// resample into a fresh volume instead.
    pub fn try_clone(&self) -> Result<Self> {
        bail!(VolumeError::NotImplemented {
            operation: "volume cloning",
        })
    }

    pub fn valid_region(&self) -> Region {
        self.valid_region
    }

    pub fn block_side_length(&self) -> u16 {
        self.block_side_length
    }

    pub fn border_value(&self) -> V {
        self.border_value
    }

    pub fn set_border_value(&mut self, value: V) {
        self.border_value = value;
    }

    /// Longest side of the valid region, in voxels.
    pub fn longest_side_length(&self) -> u32 {
        self.longest_side_length
    }

    /// Shortest side of the valid region, in voxels.
    pub fn shortest_side_length(&self) -> u32 {
        self.shortest_side_length
    }

    /// Diagonal of the valid region, in voxels.
    pub fn diagonal_length(&self) -> f32 {
        self.diagonal_length
    }

    /// Byte budget currently enforced on resident compressed blocks.
    pub fn compressed_budget(&self) -> usize {
        self.compressed_limit
    }

    pub fn max_uncompressed_blocks(&self) -> u32 {
        self.max_uncompressed_blocks
    }

    /// Number of blocks resident in the index.
    pub fn resident_block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of blocks currently held uncompressed.
    pub fn uncompressed_block_count(&self) -> usize {
        self.cache.len()
    }

    /// Bytes used by resident compressed blocks, including per-block
    /// overhead.
    pub fn compressed_bytes_in_use(&self) -> usize {
        self.blocks
            .values()
            .map(|block| block.size_in_bytes())
            .sum()
    }

    fn uncompressed_block_bytes(&self) -> usize {
        (self.block_side_length as usize).pow(3) * std::mem::size_of::<V>()
    }

    #[inline]
    fn decompose(&self, x: i32, y: i32, z: i32) -> (BlockCoord, u16, u16, u16) {
        let mask = self.block_side_length as i32 - 1;
        (
            BlockCoord::containing(x, y, z, self.block_shift),
            (x & mask) as u16,
            (y & mask) as u16,
            (z & mask) as u16,
        )
    }

    fn read_voxel(&mut self, x: i32, y: i32, z: i32) -> Result<V> {
        let (coord, ox, oy, oz) = self.decompose(x, y, z);
        let block = self.uncompressed_block(coord)?;
        Ok(block.get(ox, oy, oz))
    }

    fn write_voxel(&mut self, x: i32, y: i32, z: i32, value: V) -> Result<()> {
        let (coord, ox, oy, oz) = self.decompose(x, y, z);
        let block = self.uncompressed_block(coord)?;
        block.set(ox, oy, oz, value);
        Ok(())
    }

    /// Returns the uncompressed form of a block, paging in and
    /// decompressing as needed.
    fn uncompressed_block(&mut self, coord: BlockCoord) -> Result<&mut UncompressedBlock<V>> {
        // A repeat hit skips the index lookup and does not consume a
        // timestamp; tight voxel loops stay within u32 stamp space.
        if self.last_block == Some(coord) && self.cache.contains_key(&coord) {
            // INVARIANT: checked contains_key above.
            return Ok(self.cache.get_mut(&coord).expect("shortcut entry present"));
        }

        self.touch_compressed(coord)?;
        if !self.cache.contains_key(&coord) {
            self.materialize(coord)?;
        }

        self.last_block = Some(coord);
        // INVARIANT: present in the cache, or materialize above failed.
        Ok(self.cache.get_mut(&coord).expect("block materialised above"))
    }

    /// Ensures `coord` is resident in the block index and stamps it. A miss
    /// pages the block in and then runs the compressed eviction sweep.
    fn touch_compressed(&mut self, coord: BlockCoord) -> Result<()> {
        if !self.blocks.contains_key(&coord) {
            self.page_in_block(coord)?;
            self.stamp_block(coord);
            self.evict_excess_compressed(coord)?;
        } else {
            self.stamp_block(coord);
        }
        Ok(())
    }

    fn page_in_block(&mut self, coord: BlockCoord) -> Result<()> {
        let region = coord.voxel_region(self.block_side_length);
        let mut block = CompressedBlock::new();
        if let Some(pager) = self.pager.as_mut() {
            pager.page_in(region, &mut block)?;
        }
        if block.is_empty() {
            // "No stored data" answer from the pager (or no pager at all):
            // the block is one of default voxels.
            block.set_data(self.default_payload()?);
        }
        self.blocks.insert(coord, block);
        Ok(())
    }

    fn stamp_block(&mut self, coord: BlockCoord) {
        self.timestamp += 1;
        if let Some(block) = self.blocks.get_mut(&coord) {
            block.touch(self.timestamp);
        }
    }

    /// Compressed payload of a block of default voxels, produced once per
    /// volume and reused for every defaulted page-in.
    fn default_payload(&mut self) -> Result<Vec<u8>> {
        if let Some(payload) = &self.default_payload {
            return Ok(payload.clone());
        }

        let fresh = UncompressedBlock::<V>::new(self.block_side_length)?;
        let raw = fresh.as_bytes();
        let mut scratch = vec![0u8; self.codec.max_compressed_len(raw.len())];
        let written = self.codec.compress(raw, &mut scratch)?;
        scratch.truncate(written);
        scratch.shrink_to_fit();

        self.default_payload = Some(scratch.clone());
        Ok(scratch)
    }

    /// Decompresses `coord` into a fresh uncompressed block and caches it,
    /// first making room if the cache is at capacity.
    fn materialize(&mut self, coord: BlockCoord) -> Result<()> {
        while self.cache.len() >= self.max_uncompressed_blocks as usize {
            if !self.evict_one_uncompressed()? {
                break;
            }
        }

        let mut fresh = UncompressedBlock::new(self.block_side_length)?;
        let expected = fresh.raw_byte_len();
        // INVARIANT: touch_compressed runs before materialize.
        let block = self
            .blocks
            .get(&coord)
            .expect("compressed block resident before materialisation");
        let written = self.codec.decompress(block.data(), fresh.as_mut_bytes())?;
        ensure!(
            written == expected,
            VolumeError::Codec {
                kind: CodecErrorKind::Corrupt,
                detail: format!(
                    "block decompressed to {} bytes, expected {}",
                    written, expected
                ),
            }
        );
        fresh.mark_clean();
        self.cache.insert(coord, fresh);
        Ok(())
    }

    /// Drops one uncompressed entry, writing it back first when dirty. The
    /// victim is the entry whose compressed sibling carries the oldest
    /// stamp. Returns false when the cache is empty.
    fn evict_one_uncompressed(&mut self) -> Result<bool> {
        let victim = self
            .cache
            .keys()
            .copied()
            .min_by_key(|coord| {
                self.blocks
                    .get(coord)
                    .map(|block| block.last_accessed())
                    .unwrap_or(0)
            });
        let Some(victim) = victim else {
            return Ok(false);
        };

        if let Some(evicted) = self.cache.remove(&victim) {
            if evicted.is_dirty() {
                self.write_back(victim, &evicted)?;
            }
        }
        if self.last_block == Some(victim) {
            self.last_block = None;
        }
        Ok(true)
    }

    /// Re-compresses a dirty uncompressed block into its compressed sibling.
    fn write_back(&mut self, coord: BlockCoord, block: &UncompressedBlock<V>) -> Result<()> {
        let raw = block.as_bytes();
        let mut scratch = vec![0u8; self.codec.max_compressed_len(raw.len())];
        let written = self.codec.compress(raw, &mut scratch)?;
        scratch.truncate(written);
        scratch.shrink_to_fit();

        match self.blocks.get_mut(&coord) {
            Some(compressed) => {
                compressed.set_data(scratch);
                Ok(())
            }
            None => bail!(
                "dirty uncompressed block at ({}, {}, {}) has no compressed sibling",
                coord.x,
                coord.y,
                coord.z
            ),
        }
    }

    /// LRU sweep of the compressed tier, run after a page-in. `protect` is
    /// the block that triggered the sweep; it is never the victim, so the
    /// resident footprint can overshoot the budget by at most one block.
    fn evict_excess_compressed(&mut self, protect: BlockCoord) -> Result<()> {
        while self.compressed_bytes_in_use() > self.compressed_limit {
            let victim = self
                .blocks
                .iter()
                .filter(|(coord, _)| **coord != protect)
                .min_by_key(|(_, block)| block.last_accessed())
                .map(|(coord, _)| *coord);
            match victim {
                Some(coord) => self.erase_block(coord)?,
                None => break,
            }
        }
        Ok(())
    }

    /// Removes a block entirely: flushes a dirty uncompressed copy into the
    /// compressed payload, hands the payload to the pager, then forgets it.
    fn erase_block(&mut self, coord: BlockCoord) -> Result<()> {
        if let Some(uncompressed) = self.cache.remove(&coord) {
            if uncompressed.is_dirty() {
                self.write_back(coord, &uncompressed)?;
            }
        }
        if self.last_block == Some(coord) {
            self.last_block = None;
        }

        let region = coord.voxel_region(self.block_side_length);
        if let (Some(block), Some(pager)) = (self.blocks.get(&coord), self.pager.as_mut()) {
            pager.page_out(region, block)?;
        }
        self.blocks.remove(&coord);
        Ok(())
    }

    /// Empties the uncompressed cache, writing dirty entries back first.
    fn clear_uncompressed_cache(&mut self) -> Result<()> {
        let cached: Vec<BlockCoord> = self.cache.keys().copied().collect();
        for coord in cached {
            if let Some(block) = self.cache.remove(&coord) {
                if block.is_dirty() {
                    self.write_back(coord, &block)?;
                }
            }
        }
        self.last_block = None;
        Ok(())
    }
}

impl<V: Voxel> Drop for PagedVolume<V> {
    fn drop(&mut self) {
        // Resident blocks still get their page-out callbacks; errors have
        // nowhere to go from a destructor.
        let _ = self.flush_all();
    }
}
