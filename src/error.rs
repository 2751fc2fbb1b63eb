//! # Volume Error Types
//!
//! The closed set of failures the volume store can surface. Errors are
//! raised through `eyre::bail!`/`ensure!` and carried inside the report, so
//! callers can `downcast_ref::<VolumeError>()` when they need to branch on
//! the kind.
//!
//! Codec and pager failures are fatal to the operation that triggered them;
//! the volume's block index and uncompressed cache remain consistent (no
//! half-inserted block, no orphaned uncompressed entry).

/// How a codec call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorKind {
    /// The destination buffer was too small for the output.
    OutOfSpace,
    /// The input could not be decoded, or a round-trip produced an
    /// unexpected number of bytes.
    Corrupt,
}

impl CodecErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            CodecErrorKind::OutOfSpace => "out of space",
            CodecErrorKind::Corrupt => "corrupt",
        }
    }
}

/// Closed enumeration of volume-store failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeError {
    /// A constructor or operation argument was rejected (non-power-of-two
    /// block side, missing codec, wrap mode not allowed for writes).
    InvalidArgument { reason: &'static str },
    /// A coordinate fell outside the valid region under `WrapMode::Validate`.
    OutOfRange { x: i32, y: i32, z: i32 },
    /// Compression or decompression failed.
    Codec {
        kind: CodecErrorKind,
        detail: String,
    },
    /// The operation is deliberately unsupported.
    NotImplemented { operation: &'static str },
}

impl std::fmt::Display for VolumeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VolumeError::InvalidArgument { reason } => {
                write!(f, "invalid argument: {}", reason)
            }
            VolumeError::OutOfRange { x, y, z } => {
                write!(f, "position ({}, {}, {}) is outside the valid region", x, y, z)
            }
            VolumeError::Codec { kind, detail } => {
                write!(f, "codec failure ({}): {}", kind.name(), detail)
            }
            VolumeError::NotImplemented { operation } => {
                write!(f, "{} is not implemented", operation)
            }
        }
    }
}

impl std::error::Error for VolumeError {}
