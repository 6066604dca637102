//! Error types for texture compression and decompression.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while assembling, compressing or decompressing textures.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An array pattern has no file extension to insert the slice index before.
    #[error("Image pattern does not contain a file extension: {0}")]
    InvalidPattern(String),

    /// A slice of an image array differs from slice 0.
    #[error("Image array[0] and [{index}] are inconsistent: {reason}")]
    InconsistentArray { index: u32, reason: String },

    /// A slice of an image array is itself a 3D image.
    #[error("Image arrays do not support 3D sources (slice {index})")]
    NestedVolumeNotSupported { index: u32 },

    /// The block footprint is not valid for the format or not supported by the codec.
    #[error("Block size {x}x{y}x{z} is invalid: {reason}")]
    BadBlockSize {
        x: u32,
        y: u32,
        z: u32,
        reason: String,
    },

    /// Required SIMD instruction support is missing on this CPU.
    #[error("Required SIMD ISA support missing on this CPU")]
    UnsupportedCpu,

    /// Floating point arithmetic does not follow IEEE round-to-nearest.
    #[error("Floating point mode is unsafe for the codec (fast-math style rounding detected)")]
    UnsafeFloatMode,

    /// The codec engine failed to encode blocks.
    #[error("Codec compress failed: {reason}")]
    EncodeFailed { reason: String },

    /// The codec engine failed to decode blocks.
    #[error("Codec decompress failed: {reason}")]
    DecodeFailed { reason: String },

    /// Payload length does not match the block grid.
    #[error("Truncated or corrupt payload: expected {expected} bytes, got {actual}")]
    TruncatedOrCorrupt { expected: usize, actual: usize },

    /// Leading magic bytes do not identify the requested format.
    #[error("Bad magic: expected {expected:#010X}, found {found:#010X}")]
    BadMagic { expected: u32, found: u32 },

    /// Fewer bytes than the fixed header size.
    #[error("Truncated header: {len} bytes available, {required} required")]
    TruncatedHeader { len: usize, required: usize },

    /// File read or write failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration values are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Texture dimensions cannot be represented or processed.
    #[error("Invalid dimensions {width}×{height}×{depth}: {reason}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        depth: u32,
        reason: String,
    },

    /// Source image could not be decoded.
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    /// Codec context (worker pool) could not be created.
    #[error("Codec context creation failed: {0}")]
    ContextCreation(String),
}

impl CodecError {
    /// Returns true for environment errors that retrying cannot fix.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CodecError::UnsupportedCpu | CodecError::UnsafeFloatMode)
    }

    /// Create an I/O error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CodecError::Io {
            path: path.into(),
            source,
        }
    }

    /// Convert an `image` crate error raised while touching `path`.
    pub(crate) fn from_image(path: impl Into<PathBuf>, err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(source) => CodecError::io(path, source),
            other => CodecError::ImageDecode(other.to_string()),
        }
    }
}
