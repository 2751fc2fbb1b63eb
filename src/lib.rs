//! # voxstore - Block-Paged Sparse Voxel Storage
//!
//! voxstore stores and queries very large, sparse three-dimensional voxel
//! grids whose uncompressed size would exceed available memory. The volume
//! is decomposed into fixed-size cubic blocks; most resident blocks are
//! kept compressed, a small cache holds hot blocks uncompressed, and blocks
//! evicted under the memory budget are handed to an application-provided
//! pager.
//!
//! ## Quick Start
//!
//! ```ignore
//! use voxstore::{PagedVolume, Region, WrapMode};
//!
//! let mut volume: PagedVolume<u8> = PagedVolume::builder(Region::cubic(0, 1023))
//!     .block_side_length(32)
//!     .target_memory_limit(64 * 1024 * 1024)
//!     .build()?;
//!
//! volume.set_voxel(5, 6, 7, 42, WrapMode::Validate)?;
//! assert_eq!(volume.get_voxel_at(5, 6, 7)?, 42);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │      Public API (PagedVolume<V>)         │
//! ├──────────────────────────────────────────┤
//! │  Wrap-mode dispatch │ Coordinate split   │
//! ├─────────────────────┴────────────────────┤
//! │  Uncompressed cache (bounded, hot)       │
//! ├──────────────────────────────────────────┤
//! │  Block index (compressed, byte-budgeted, │
//! │  LRU-evicted)                            │
//! ├──────────────────────────────────────────┤
//! │  Codec (deflate by default)              │
//! ├──────────────────────────────────────────┤
//! │  Pager (application-provided I/O)        │
//! └──────────────────────────────────────────┘
//! ```
//!
//! A voxel read splits `(x, y, z)` into a block coordinate and an in-block
//! offset by shift and mask, finds the block's uncompressed form (paging in
//! and decompressing on the way as needed), and indexes the dense array. A
//! write follows the same path and marks the block dirty; the dirty copy is
//! re-compressed before the block is ever released.
//!
//! ## Module Overview
//!
//! - [`volume`]: the paged volume store, wrap modes, builder
//! - [`block`]: block coordinates and the two block representations
//! - [`codec`]: pluggable compression boundary, default deflate codec
//! - [`pager`]: persistence contract for paged-out blocks
//! - [`region`]: inclusive integer boxes of voxel space
//! - [`voxel`]: the value-type contract for voxels
//! - [`config`]: tunables
//!
//! ## Persistence
//!
//! The volume has no on-disk format of its own. All durability is mediated
//! by the pager; the buffer a pager sees is whatever the configured codec
//! emitted.
//!
//! ## Thread Safety
//!
//! A `PagedVolume` is a single-threaded value: even reads update recency
//! state and may trigger paging, so all operations take `&mut self`.

pub mod block;
pub mod codec;
pub mod config;
pub mod error;
pub mod pager;
pub mod region;
pub mod volume;
pub mod voxel;

pub use block::{BlockCoord, CompressedBlock, UncompressedBlock};
pub use codec::{Codec, DeflateCodec};
pub use error::{CodecErrorKind, VolumeError};
pub use pager::{NullPager, Pager};
pub use region::Region;
pub use volume::{PagedVolume, VolumeBuilder, WrapMode};
pub use voxel::Voxel;
