//! # Block Codecs
//!
//! The codec is the seam between a block's dense voxel bytes and its
//! compressed resident form. The volume passes raw voxel bytes in and
//! expects the same bytes back; no framing, versioning or endianness
//! normalisation happens at this layer, so any byte-oriented compressor can
//! sit behind the trait.
//!
//! The contract is `decompress(compress(x)) == x` for any `x` whose length
//! is a whole number of blocks. Both calls write into a caller-provided
//! buffer and report how many bytes they produced; a destination that is
//! too small fails with `CodecErrorKind::OutOfSpace`, undecodable input
//! with `CodecErrorKind::Corrupt`.

mod deflate;

pub use deflate::DeflateCodec;

use eyre::Result;

/// Byte-buffer compression contract.
pub trait Codec {
    /// Compresses `src` into `dst`, returning the number of bytes written.
    fn compress(&self, src: &[u8], dst: &mut [u8]) -> Result<usize>;

    /// Decompresses `src` into `dst`, returning the number of bytes written.
    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Result<usize>;

    /// Upper bound on the compressed size of `src_len` input bytes, used to
    /// size write-back scratch buffers. The default is deliberately
    /// generous; codecs with a tighter bound should override it.
    fn max_compressed_len(&self, src_len: usize) -> usize {
        src_len + src_len / 2 + 128
    }
}
