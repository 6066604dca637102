//! ETC1 and ETC2 block codec.
//!
//! Color blocks come from the ISPC ETC1 kernel (`intel_tex_2`); ETC1 blocks
//! are valid ETC2 RGB blocks, so both formats share it. ETC2 RGBA8 prefixes
//! each color block with an EAC alpha block. Punch-through alpha blocks are
//! produced by this crate. Decoding goes through `texture2ddecoder`.

use intel_tex_2::{etc1, RgbaSurface};
use tracing::trace;

use super::{bgra_u32_to_rgba8, eac, punchthrough, BlockCodec, RgbaBand};
use crate::error::{CodecError, CodecResult};
use crate::format::{BlockFootprint, TextureFormat};
use crate::volume::CHANNELS;

const COLOR_BLOCK_BYTES: usize = 8;

/// Codec for the ETC family.
#[derive(Debug, Clone, Copy)]
pub struct EtcCodec {
    format: TextureFormat,
    effort: u32,
}

impl EtcCodec {
    /// Create a codec for an ETC `format`.
    pub fn new(format: TextureFormat, effort: u32) -> Self {
        debug_assert!(format.is_etc(), "{} is not an ETC format", format);
        Self { format, effort }
    }

    fn encode_color(&self, band: &RgbaBand<'_>, blocks: usize) -> CodecResult<Vec<u8>> {
        let surface = RgbaSurface {
            data: band.data,
            width: band.width,
            height: band.height,
            stride: band.width * CHANNELS as u32,
        };
        let color = etc1::compress_blocks(&etc1::slow_settings(), &surface);
        if color.len() != blocks * COLOR_BLOCK_BYTES {
            return Err(CodecError::EncodeFailed {
                reason: format!(
                    "ETC1 kernel produced {} bytes for {} blocks",
                    color.len(),
                    blocks
                ),
            });
        }
        Ok(color)
    }
}

impl BlockCodec for EtcCodec {
    fn format(&self) -> TextureFormat {
        self.format
    }

    fn footprint(&self) -> BlockFootprint {
        BlockFootprint::ETC
    }

    fn encode_band(&self, band: &RgbaBand<'_>, out: &mut [u8]) -> CodecResult<()> {
        let blocks_x = band.width as usize / 4;
        let blocks = blocks_x * (band.height as usize / 4);
        let block_bytes = self.format.bytes_per_block();
        if out.len() != blocks * block_bytes {
            return Err(CodecError::EncodeFailed {
                reason: format!(
                    "output holds {} bytes, band needs {}",
                    out.len(),
                    blocks * block_bytes
                ),
            });
        }
        trace!(format = %self.format, blocks, "Encoding ETC band");

        match self.format {
            TextureFormat::Etc1 | TextureFormat::Etc2Rgb => {
                out.copy_from_slice(&self.encode_color(band, blocks)?);
            }
            TextureFormat::Etc2Rgba | TextureFormat::Etc2A8 => {
                let color = self.encode_color(band, blocks)?;
                for (i, (block, color)) in out
                    .chunks_exact_mut(block_bytes)
                    .zip(color.chunks_exact(COLOR_BLOCK_BYTES))
                    .enumerate()
                {
                    let texels = band.block4x4(i % blocks_x, i / blocks_x);
                    let alpha: [u8; 16] = std::array::from_fn(|t| texels[t][3]);
                    block[..8].copy_from_slice(&eac::encode_alpha_block(&alpha, self.effort));
                    block[8..].copy_from_slice(color);
                }
            }
            TextureFormat::Etc2A1 => {
                for (i, block) in out.chunks_exact_mut(block_bytes).enumerate() {
                    let texels = band.block4x4(i % blocks_x, i / blocks_x);
                    block.copy_from_slice(&punchthrough::encode_block(&texels, self.effort));
                }
            }
            TextureFormat::Astc => {
                return Err(CodecError::EncodeFailed {
                    reason: "ASTC blocks requested from the ETC codec".to_string(),
                });
            }
        }
        Ok(())
    }

    fn decode(&self, blocks: &[u8], width: u32, height: u32) -> CodecResult<Vec<u8>> {
        let (w, h) = (width as usize, height as usize);
        let mut pixels = vec![0u32; w * h];

        let result = match self.format {
            TextureFormat::Etc1 => texture2ddecoder::decode_etc1(blocks, w, h, &mut pixels),
            TextureFormat::Etc2Rgb => texture2ddecoder::decode_etc2_rgb(blocks, w, h, &mut pixels),
            TextureFormat::Etc2A1 => texture2ddecoder::decode_etc2_rgba1(blocks, w, h, &mut pixels),
            TextureFormat::Etc2Rgba | TextureFormat::Etc2A8 => {
                texture2ddecoder::decode_etc2_rgba8(blocks, w, h, &mut pixels)
            }
            TextureFormat::Astc => Err("ASTC payload given to the ETC codec"),
        };
        result.map_err(|e| CodecError::DecodeFailed {
            reason: format!("{}: {e}", self.format),
        })?;

        Ok(bgra_u32_to_rgba8(&pixels))
    }
}
