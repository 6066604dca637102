//! Block codec engines and their execution contexts.
//!
//! The [`BlockCodec`] trait is the seam between the orchestrators and the
//! bit-level encoders/decoders, so the orchestrators never branch on the
//! concrete format.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐      ┌────────────────────────┐
//! │ Compressor           │─────▶│ CodecContextManager    │
//! └──────────────────────┘      │  CodecConfig → context │
//!                               └───────────┬────────────┘
//!                                           ▼
//!                               ┌────────────────────────┐
//!                               │ CodecContext           │
//!                               │  rayon pool + codec    │
//!                               └───────────┬────────────┘
//!                                           ▼
//!                               ┌────────────────────────┐
//!                               │ BlockCodec (trait)     │
//!                               └─────┬────────────┬─────┘
//!                                     ▼            ▼
//!                               ┌──────────┐ ┌──────────┐
//!                               │ EtcCodec │ │AstcCodec │
//!                               └──────────┘ └──────────┘
//! ```
//!
//! Encoders receive bands of whole blocks ([`RgbaBand`]) that were padded to
//! the footprint; decoders receive a complete 2D payload.

mod astc;
mod context;
mod eac;
mod etc;
mod punchthrough;

pub use astc::AstcCodec;
pub use context::{check_environment, CodecContext, CodecContextManager, SharedContext};
pub use etc::EtcCodec;

use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::format::{BlockFootprint, TextureFormat};
use crate::volume::CHANNELS;

/// Rows of tightly packed RGBA8 texels covering whole blocks.
///
/// `width` and `height` are multiples of the codec's footprint.
#[derive(Debug, Clone, Copy)]
pub struct RgbaBand<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
}

impl RgbaBand<'_> {
    /// Bytes per texel row.
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Copy the 4×4 block at block coordinates (`bx`, `by`), row-major.
    pub fn block4x4(&self, bx: usize, by: usize) -> [[u8; 4]; 16] {
        let mut texels = [[0u8; 4]; 16];
        let stride = self.stride();
        for y in 0..4 {
            let row = (by * 4 + y) * stride + bx * 4 * CHANNELS;
            for x in 0..4 {
                let at = row + x * CHANNELS;
                texels[y * 4 + x].copy_from_slice(&self.data[at..at + CHANNELS]);
            }
        }
        texels
    }
}

/// Bit-level encoder/decoder for one format and footprint.
///
/// Implementations must be `Send + Sync`: bands of one image are encoded
/// concurrently on the context's worker pool.
pub trait BlockCodec: Send + Sync {
    /// Format produced and consumed.
    fn format(&self) -> TextureFormat;

    /// Block footprint.
    fn footprint(&self) -> BlockFootprint;

    /// Encode a band of whole blocks into `out`, in block raster order.
    ///
    /// `out` holds exactly one block per footprint-sized tile of the band.
    fn encode_band(&self, band: &RgbaBand<'_>, out: &mut [u8]) -> CodecResult<()>;

    /// Decode a 2D payload into tightly packed RGBA8 texels.
    ///
    /// The payload length has been checked against the block grid.
    fn decode(&self, blocks: &[u8], width: u32, height: u32) -> CodecResult<Vec<u8>>;
}

/// Create the encoder for a validated config.
///
/// # Errors
///
/// `BadBlockSize` if the footprint is illegal for the format or not supported
/// by the encoder engine.
pub fn encoder_for(config: &CodecConfig) -> CodecResult<Box<dyn BlockCodec>> {
    let format = config.format();
    let footprint = config.footprint();
    match format {
        TextureFormat::Astc => Ok(Box::new(AstcCodec::encoder(footprint, config.effort())?)),
        _ => {
            check_etc_footprint(footprint)?;
            Ok(Box::new(EtcCodec::new(format, config.effort())))
        }
    }
}

/// Create the decoder for `format` and `footprint`.
///
/// # Errors
///
/// `BadBlockSize` if the footprint is illegal for the format.
pub fn decoder_for(
    format: TextureFormat,
    footprint: BlockFootprint,
) -> CodecResult<Box<dyn BlockCodec>> {
    match format {
        TextureFormat::Astc => Ok(Box::new(AstcCodec::decoder(footprint)?)),
        _ => {
            check_etc_footprint(footprint)?;
            Ok(Box::new(EtcCodec::new(format, 0)))
        }
    }
}

fn check_etc_footprint(footprint: BlockFootprint) -> CodecResult<()> {
    if footprint != BlockFootprint::ETC {
        return Err(CodecError::BadBlockSize {
            x: footprint.x,
            y: footprint.y,
            z: footprint.z,
            reason: "ETC formats use 4x4x1 blocks".to_string(),
        });
    }
    Ok(())
}

/// Pad an RGBA8 layer to `padded_width × padded_height` by repeating the
/// last column and row.
pub(crate) fn pad_layer(
    layer: &[u8],
    width: u32,
    height: u32,
    padded_width: u32,
    padded_height: u32,
) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let (pw, ph) = (padded_width as usize, padded_height as usize);
    if (w, h) == (pw, ph) {
        return layer.to_vec();
    }

    let mut out = vec![0u8; pw * ph * CHANNELS];
    for y in 0..ph {
        let src_row = &layer[y.min(h - 1) * w * CHANNELS..][..w * CHANNELS];
        let dst_row = &mut out[y * pw * CHANNELS..][..pw * CHANNELS];
        dst_row[..w * CHANNELS].copy_from_slice(src_row);
        let last = &src_row[(w - 1) * CHANNELS..];
        for x in w..pw {
            dst_row[x * CHANNELS..(x + 1) * CHANNELS].copy_from_slice(last);
        }
    }
    out
}

/// Convert decoder output (BGRA packed in little-endian `u32`) to RGBA8 bytes.
pub(crate) fn bgra_u32_to_rgba8(pixels: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() * CHANNELS);
    for pixel in pixels {
        let [b, g, r, a] = pixel.to_le_bytes();
        out.extend_from_slice(&[r, g, b, a]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_layer_replicates_edges() {
        // 1×1 red texel padded to 2×2
        let layer = vec![255, 0, 0, 255];
        let padded = pad_layer(&layer, 1, 1, 2, 2);
        assert_eq!(padded, [255, 0, 0, 255].repeat(4));
    }

    #[test]
    fn test_pad_layer_keeps_interior() {
        let layer: Vec<u8> = (0..2 * 2 * 4).map(|i| i as u8).collect();
        let padded = pad_layer(&layer, 2, 2, 3, 3);
        // Row 0: texels 0, 1, 1
        assert_eq!(&padded[0..12], &[0, 1, 2, 3, 4, 5, 6, 7, 4, 5, 6, 7]);
        // Row 2 repeats row 1
        assert_eq!(&padded[24..36], &padded[12..24]);
    }

    #[test]
    fn test_pad_layer_noop_when_aligned() {
        let layer = vec![9u8; 4 * 4 * 4];
        assert_eq!(pad_layer(&layer, 4, 4, 4, 4), layer);
    }

    #[test]
    fn test_block4x4_extraction() {
        let data: Vec<u8> = (0..8 * 4 * 4).map(|i| (i / 4) as u8).collect();
        let band = RgbaBand {
            data: &data,
            width: 8,
            height: 4,
        };
        let block = band.block4x4(1, 0);
        // Texel (4, 0) has index 4, texel (4, 1) has index 12
        assert_eq!(block[0], [4, 4, 4, 4]);
        assert_eq!(block[4], [12, 12, 12, 12]);
        assert_eq!(block[15], [31, 31, 31, 31]);
    }

    #[test]
    fn test_bgra_conversion() {
        let pixel = u32::from_le_bytes([1, 2, 3, 4]);
        assert_eq!(bgra_u32_to_rgba8(&[pixel]), vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_encoder_for_rejects_etc_footprint_mismatch() {
        assert!(matches!(
            check_etc_footprint(BlockFootprint::new_2d(8, 8)),
            Err(CodecError::BadBlockSize { .. })
        ));
        assert!(check_etc_footprint(BlockFootprint::ETC).is_ok());
    }

    #[test]
    fn test_decoder_for_formats() {
        for format in TextureFormat::ALL {
            let footprint = format.resolve_footprint(BlockFootprint::new_2d(4, 4));
            let codec = decoder_for(format, footprint).unwrap();
            assert_eq!(codec.format(), format);
            assert_eq!(codec.footprint(), footprint);
        }
    }
}
