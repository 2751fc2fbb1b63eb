//! Uncompressed representation of one block: a dense cubic array of voxels
//! in `x + y*S + z*S*S` order, plus a dirty flag tracking divergence from
//! the compressed payload of the same block.
//!
//! Offset bounds are the caller's responsibility and checked with
//! `debug_assert!` only; the owning volume derives offsets by masking, so
//! they are always in range.

use eyre::{ensure, Result};
use zerocopy::IntoBytes;

use crate::error::VolumeError;
use crate::voxel::Voxel;

/// A block's voxels in directly addressable form.
#[derive(Debug)]
pub struct UncompressedBlock<V: Voxel> {
    voxels: Box<[V]>,
    side_length: u16,
    dirty: bool,
}

impl<V: Voxel> UncompressedBlock<V> {
    /// Allocates a block of `side_length`³ default voxels.
    ///
    /// The side length must be a non-zero power of two.
    pub fn new(side_length: u16) -> Result<Self> {
        ensure!(
            side_length != 0,
            VolumeError::InvalidArgument {
                reason: "block side length cannot be zero",
            }
        );
        ensure!(
            side_length.is_power_of_two(),
            VolumeError::InvalidArgument {
                reason: "block side length must be a power of two",
            }
        );

        let count = (side_length as usize).pow(3);
        Ok(Self {
            voxels: vec![V::default(); count].into_boxed_slice(),
            side_length,
            dirty: false,
        })
    }

    pub fn side_length(&self) -> u16 {
        self.side_length
    }

    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }

    pub fn raw_byte_len(&self) -> usize {
        self.voxels.len() * std::mem::size_of::<V>()
    }

    #[inline]
    fn index(&self, ox: u16, oy: u16, oz: u16) -> usize {
        debug_assert!(ox < self.side_length, "x offset outside block");
        debug_assert!(oy < self.side_length, "y offset outside block");
        debug_assert!(oz < self.side_length, "z offset outside block");

        let side = self.side_length as usize;
        ox as usize + oy as usize * side + oz as usize * side * side
    }

    #[inline]
    pub fn get(&self, ox: u16, oy: u16, oz: u16) -> V {
        self.voxels[self.index(ox, oy, oz)]
    }

    #[inline]
    pub fn set(&mut self, ox: u16, oy: u16, oz: u16, value: V) {
        let index = self.index(ox, oy, oz);
        self.voxels[index] = value;
        self.dirty = true;
    }

    /// The voxel array as raw bytes, in storage order.
    pub fn as_bytes(&self) -> &[u8] {
        self.voxels.as_bytes()
    }

    /// Mutable raw bytes; the decompression target.
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        self.voxels.as_mut_bytes()
    }

    /// Whether the voxels have diverged from the block's compressed payload.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Resident footprint including struct overhead.
    pub fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.raw_byte_len()
    }
}
