//! # Voxel Value Types
//!
//! The volume is parameterised by an opaque voxel value type. The store
//! never inspects a voxel's contents; it only needs a byte size, a default
//! value and the guarantee that a block of voxels can be handed to the
//! codec as raw bytes and reconstructed from them. The `zerocopy` traits
//! carry exactly that guarantee, so `Voxel` is a blanket trait over them.

use zerocopy::{FromBytes, Immutable, IntoBytes};

/// A value type storable in a volume.
///
/// Any `Copy + Default` type whose in-memory layout is valid for every bit
/// pattern qualifies. Primitive integers and floats implement this out of
/// the box; `#[repr(C)]` structs opt in by deriving the `zerocopy` traits:
///
/// ```ignore
/// #[derive(Clone, Copy, Default, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
/// #[repr(C)]
/// struct MaterialDensity {
///     material: u16,
///     density: u16,
/// }
/// ```
pub trait Voxel:
    Copy + Default + PartialEq + FromBytes + IntoBytes + Immutable + 'static
{
}

impl<T> Voxel for T where
    T: Copy + Default + PartialEq + FromBytes + IntoBytes + Immutable + 'static
{
}
