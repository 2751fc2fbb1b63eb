//! Compressed representation of one block: a tagged byte buffer plus the
//! recency stamp the volume's eviction sweep keys on. The buffer is opaque
//! here; it knows nothing about the voxel type or the block side length.

/// A block's compressed payload.
///
/// Created empty; the pager (or a write-back of a dirty uncompressed copy)
/// fills it. `last_accessed` is maintained by the owning volume and is
/// strictly monotonic across accesses.
#[derive(Debug, Default)]
pub struct CompressedBlock {
    data: Vec<u8>,
    last_accessed: u32,
}

impl CompressedBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Replaces the compressed payload.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
    }

    pub fn last_accessed(&self) -> u32 {
        self.last_accessed
    }

    pub(crate) fn touch(&mut self, stamp: u32) {
        self.last_accessed = stamp;
    }

    /// Resident footprint including struct overhead and buffer capacity.
    pub fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.data.capacity()
    }
}
