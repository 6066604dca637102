//! Compression job configuration.
//!
//! A [`CodecConfig`] describes one compression job: the target format, the
//! block footprint, the effort level, whether a mip chain is produced, the
//! worker thread count and the channel swizzle applied before encoding.
//!
//! # Example
//!
//! ```
//! use texture2dstudio::{BlockFootprint, CodecConfig, TextureFormat};
//!
//! let config = CodecConfig::new(TextureFormat::Astc)
//!     .with_footprint(BlockFootprint::new_2d(6, 6))
//!     .with_effort(60)
//!     .with_thread_count(4);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.footprint(), BlockFootprint::new_2d(6, 6));
//! ```

use crate::error::{CodecError, CodecResult};
use crate::format::{BlockFootprint, TextureFormat};

/// Highest supported effort level.
pub const MAX_EFFORT: u32 = 100;

/// Default effort level (fastest).
pub const DEFAULT_EFFORT: u32 = 0;

/// Default worker thread count.
pub const DEFAULT_THREAD_COUNT: usize = 1;

/// Largest block dimension the container header can store.
pub const MAX_BLOCK_DIMENSION: u32 = u8::MAX as u32;

/// Source of one output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    R,
    G,
    B,
    A,
    /// Constant 0.
    Zero,
    /// Constant 255.
    One,
}

impl Channel {
    #[inline]
    fn select(self, texel: [u8; 4]) -> u8 {
        match self {
            Channel::R => texel[0],
            Channel::G => texel[1],
            Channel::B => texel[2],
            Channel::A => texel[3],
            Channel::Zero => 0,
            Channel::One => u8::MAX,
        }
    }
}

/// Per-channel remapping applied to texels before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Swizzle {
    pub r: Channel,
    pub g: Channel,
    pub b: Channel,
    pub a: Channel,
}

impl Swizzle {
    /// R,G,B,A → R,G,B,A.
    pub const IDENTITY: Swizzle = Swizzle {
        r: Channel::R,
        g: Channel::G,
        b: Channel::B,
        a: Channel::A,
    };

    /// Returns true if applying this swizzle is a no-op.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Remap RGBA8 texels in place.
    pub fn apply(&self, rgba: &mut [u8]) {
        if self.is_identity() {
            return;
        }
        for texel in rgba.chunks_exact_mut(4) {
            let src = [texel[0], texel[1], texel[2], texel[3]];
            texel[0] = self.r.select(src);
            texel[1] = self.g.select(src);
            texel[2] = self.b.select(src);
            texel[3] = self.a.select(src);
        }
    }
}

impl Default for Swizzle {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Configuration of a single compression job.
///
/// Built with [`CodecConfig::new`] and the `with_*` methods, then checked with
/// [`CodecConfig::validate`] before any codec work starts. The footprint is
/// forced to 4×4×1 for the ETC family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodecConfig {
    format: TextureFormat,
    footprint: BlockFootprint,
    effort: u32,
    mipmap: bool,
    thread_count: usize,
    swizzle: Swizzle,
}

impl CodecConfig {
    /// Create a config for `format` with default settings.
    ///
    /// ASTC defaults to a 4×4 footprint.
    pub fn new(format: TextureFormat) -> Self {
        Self {
            format,
            footprint: format.resolve_footprint(BlockFootprint::new_2d(4, 4)),
            effort: DEFAULT_EFFORT,
            mipmap: false,
            thread_count: DEFAULT_THREAD_COUNT,
            swizzle: Swizzle::IDENTITY,
        }
    }

    /// Set the block footprint. Ignored for fixed-footprint formats.
    pub fn with_footprint(mut self, footprint: BlockFootprint) -> Self {
        self.footprint = self.format.resolve_footprint(footprint);
        self
    }

    /// Set the effort level (0 = fastest, [`MAX_EFFORT`] = best).
    ///
    /// Effort is not a uniform knob across formats:
    /// - ETC1 and ETC2 RGB color blocks always use the slow ETC1 profile, so
    ///   effort has no effect on them.
    /// - ETC2 RGBA8/A8 alpha and ETC2 A1 blocks widen their search with effort.
    /// - ASTC switches from the fast to the slow profile at effort 50.
    pub fn with_effort(mut self, effort: u32) -> Self {
        self.effort = effort;
        self
    }

    /// Enable or disable mip chain generation.
    pub fn with_mipmap(mut self, mipmap: bool) -> Self {
        self.mipmap = mipmap;
        self
    }

    /// Set the worker thread count. Zero is treated as one.
    pub fn with_thread_count(mut self, count: usize) -> Self {
        self.thread_count = count.max(1);
        self
    }

    /// Set the channel swizzle applied before encoding.
    pub fn with_swizzle(mut self, swizzle: Swizzle) -> Self {
        self.swizzle = swizzle;
        self
    }

    /// Get the target format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Get the block footprint.
    pub fn footprint(&self) -> BlockFootprint {
        self.footprint
    }

    /// Get the effort level.
    pub fn effort(&self) -> u32 {
        self.effort
    }

    /// Returns true if a mip chain is generated.
    pub fn mipmap(&self) -> bool {
        self.mipmap
    }

    /// Get the worker thread count (at least 1).
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Get the channel swizzle.
    pub fn swizzle(&self) -> Swizzle {
        self.swizzle
    }

    /// Check the configuration before use.
    ///
    /// # Errors
    ///
    /// - `BadBlockSize` if a block dimension is zero or too large for the header
    /// - `InvalidConfig` if the effort is above [`MAX_EFFORT`]
    pub fn validate(&self) -> CodecResult<()> {
        let fp = self.footprint;
        if fp.x == 0 || fp.y == 0 || fp.z == 0 {
            return Err(CodecError::BadBlockSize {
                x: fp.x,
                y: fp.y,
                z: fp.z,
                reason: "block dimensions must be positive".to_string(),
            });
        }
        if fp.x > MAX_BLOCK_DIMENSION || fp.y > MAX_BLOCK_DIMENSION || fp.z > MAX_BLOCK_DIMENSION {
            return Err(CodecError::BadBlockSize {
                x: fp.x,
                y: fp.y,
                z: fp.z,
                reason: format!("block dimensions must not exceed {}", MAX_BLOCK_DIMENSION),
            });
        }
        if self.effort > MAX_EFFORT {
            return Err(CodecError::InvalidConfig(format!(
                "effort {} out of range 0..={}",
                self.effort, MAX_EFFORT
            )));
        }
        Ok(())
    }
}
