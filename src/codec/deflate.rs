//! Default codec: zlib-wrapped DEFLATE via `flate2`.
//!
//! Block payloads are small (a few KB to a few hundred KB), so the
//! streaming encoder is run to completion in one shot and the result copied
//! into the caller's buffer.

use std::io::{Read, Write};

use eyre::{bail, Result};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::codec::Codec;
use crate::error::{CodecErrorKind, VolumeError};

/// zlib/DEFLATE codec.
#[derive(Debug, Clone)]
pub struct DeflateCodec {
    level: Compression,
}

impl DeflateCodec {
    pub fn new() -> Self {
        Self {
            level: Compression::default(),
        }
    }

    /// Fastest compression, largest output.
    pub fn fast() -> Self {
        Self {
            level: Compression::fast(),
        }
    }

    /// Best compression, slowest.
    pub fn best() -> Self {
        Self {
            level: Compression::best(),
        }
    }
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for DeflateCodec {
    fn compress(&self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(src.len() / 4 + 64), self.level);
        if let Err(err) = encoder.write_all(src) {
            bail!(VolumeError::Codec {
                kind: CodecErrorKind::Corrupt,
                detail: format!("deflate stream failed: {}", err),
            });
        }
        let encoded = match encoder.finish() {
            Ok(encoded) => encoded,
            Err(err) => bail!(VolumeError::Codec {
                kind: CodecErrorKind::Corrupt,
                detail: format!("deflate stream failed to finish: {}", err),
            }),
        };

        if encoded.len() > dst.len() {
            bail!(VolumeError::Codec {
                kind: CodecErrorKind::OutOfSpace,
                detail: format!(
                    "compressed output is {} bytes but destination holds {}",
                    encoded.len(),
                    dst.len()
                ),
            });
        }

        dst[..encoded.len()].copy_from_slice(&encoded);
        Ok(encoded.len())
    }

    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        let mut decoder = ZlibDecoder::new(src);
        let mut decoded = Vec::with_capacity(dst.len());
        if let Err(err) = decoder.read_to_end(&mut decoded) {
            bail!(VolumeError::Codec {
                kind: CodecErrorKind::Corrupt,
                detail: format!("inflate failed: {}", err),
            });
        }

        if decoded.len() > dst.len() {
            bail!(VolumeError::Codec {
                kind: CodecErrorKind::OutOfSpace,
                detail: format!(
                    "decompressed output is {} bytes but destination holds {}",
                    decoded.len(),
                    dst.len()
                ),
            });
        }

        dst[..decoded.len()].copy_from_slice(&decoded);
        Ok(decoded.len())
    }

    fn max_compressed_len(&self, src_len: usize) -> usize {
        // zlib worst case is a small per-stream and per-16KB-segment overhead.
        src_len + src_len / 1000 + 64
    }
}
