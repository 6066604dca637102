//! ASTC block codec.
//!
//! Encoding uses the ISPC ASTC kernel from `intel_tex_2`, which handles 2D
//! footprints up to 8×8. Decoding uses `texture2ddecoder` and accepts every
//! legal 2D footprint.

use intel_tex_2::{astc, RgbaSurface};
use tracing::trace;

use super::{bgra_u32_to_rgba8, BlockCodec, RgbaBand};
use crate::error::{CodecError, CodecResult};
use crate::format::{BlockFootprint, TextureFormat};
use crate::volume::CHANNELS;

/// Largest block edge the encoder kernel supports.
pub const MAX_ENCODE_BLOCK_DIMENSION: u32 = 8;

/// Effort at which the slow (exhaustive) kernel profile is selected.
const SLOW_PROFILE_EFFORT: u32 = 50;

/// Codec for ASTC LDR blocks.
#[derive(Debug, Clone, Copy)]
pub struct AstcCodec {
    footprint: BlockFootprint,
    effort: u32,
}

impl AstcCodec {
    /// Create an encoder/decoder for `footprint`.
    ///
    /// # Errors
    ///
    /// `BadBlockSize` if the footprint is not a legal 2D ASTC footprint or is
    /// larger than [`MAX_ENCODE_BLOCK_DIMENSION`].
    pub fn encoder(footprint: BlockFootprint, effort: u32) -> CodecResult<Self> {
        check_legal(footprint)?;
        if footprint.x > MAX_ENCODE_BLOCK_DIMENSION || footprint.y > MAX_ENCODE_BLOCK_DIMENSION {
            return Err(CodecError::BadBlockSize {
                x: footprint.x,
                y: footprint.y,
                z: footprint.z,
                reason: format!(
                    "the encoder supports blocks up to {0}x{0}",
                    MAX_ENCODE_BLOCK_DIMENSION
                ),
            });
        }
        Ok(Self { footprint, effort })
    }

    /// Create a decoder for `footprint`.
    ///
    /// # Errors
    ///
    /// `BadBlockSize` if the footprint is not a legal 2D ASTC footprint.
    pub fn decoder(footprint: BlockFootprint) -> CodecResult<Self> {
        check_legal(footprint)?;
        Ok(Self {
            footprint,
            effort: 0,
        })
    }
}

fn check_legal(footprint: BlockFootprint) -> CodecResult<()> {
    if !footprint.is_astc_2d() {
        return Err(CodecError::BadBlockSize {
            x: footprint.x,
            y: footprint.y,
            z: footprint.z,
            reason: "not a supported 2D ASTC footprint".to_string(),
        });
    }
    Ok(())
}

impl BlockCodec for AstcCodec {
    fn format(&self) -> TextureFormat {
        TextureFormat::Astc
    }

    fn footprint(&self) -> BlockFootprint {
        self.footprint
    }

    fn encode_band(&self, band: &RgbaBand<'_>, out: &mut [u8]) -> CodecResult<()> {
        let (bw, bh) = (self.footprint.x, self.footprint.y);
        let settings = if self.effort >= SLOW_PROFILE_EFFORT {
            astc::alpha_slow_settings(bw, bh)
        } else {
            astc::alpha_fast_settings(bw, bh)
        };
        let surface = RgbaSurface {
            data: band.data,
            width: band.width,
            height: band.height,
            stride: band.width * CHANNELS as u32,
        };
        trace!(
            footprint = %self.footprint,
            width = band.width,
            height = band.height,
            "Encoding ASTC band"
        );

        let blocks = astc::compress_blocks(&settings, &surface);
        if blocks.len() != out.len() {
            return Err(CodecError::EncodeFailed {
                reason: format!(
                    "ASTC kernel produced {} bytes, expected {}",
                    blocks.len(),
                    out.len()
                ),
            });
        }
        out.copy_from_slice(&blocks);
        Ok(())
    }

    fn decode(&self, blocks: &[u8], width: u32, height: u32) -> CodecResult<Vec<u8>> {
        let (w, h) = (width as usize, height as usize);
        let mut pixels = vec![0u32; w * h];
        texture2ddecoder::decode_astc(
            blocks,
            w,
            h,
            self.footprint.x as usize,
            self.footprint.y as usize,
            &mut pixels,
        )
        .map_err(|e| CodecError::DecodeFailed {
            reason: format!("astc {}: {e}", self.footprint),
        })?;
        Ok(bgra_u32_to_rgba8(&pixels))
    }
}
