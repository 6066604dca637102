//! Decompression orchestrator.
//!
//! Decoding needs no pooled context: each call builds the format's decoder,
//! checks the payload length against the block grid and decodes to 8-bit
//! RGBA.
//!
//! [`decompress`] accepts either a raw payload or a single container whose
//! header agrees with the caller's dimensions:
//!
//! | input length                    | treated as                          |
//! |---------------------------------|-------------------------------------|
//! | `output_byte_size`              | raw block payload                   |
//! | `HEADER_SIZE + output_byte_size`| container (magic and dims checked)  |
//! | anything else                   | `TruncatedOrCorrupt`                |

use std::path::Path;

use tracing::{debug, info};

use crate::codec::decoder_for;
use crate::container::{ContainerHeader, HEADER_SIZE};
use crate::error::{CodecError, CodecResult};
use crate::format::{BlockFootprint, TextureFormat};
use crate::grid::BlockGrid;
use crate::volume::{slice_path, write_rgba8, BitDepth, DynamicRange, PixelVolume, CHANNELS};

/// Decode a 2D texture of `width × height` texels.
///
/// `footprint` is ignored for fixed-footprint formats.
///
/// # Errors
///
/// - `InvalidDimensions` for a zero dimension
/// - `BadBlockSize` for an illegal footprint
/// - `TruncatedOrCorrupt` if the length fits neither a payload nor a matching
///   container
/// - `BadMagic` for a container of another format
/// - `DecodeFailed` if the decoder rejects the data
pub fn decompress(
    data: &[u8],
    format: TextureFormat,
    width: u32,
    height: u32,
    footprint: BlockFootprint,
) -> CodecResult<PixelVolume> {
    if width == 0 || height == 0 {
        return Err(CodecError::InvalidDimensions {
            width,
            height,
            depth: 1,
            reason: "texture must not be empty".to_string(),
        });
    }

    let footprint = format.resolve_footprint(footprint);
    let codec = decoder_for(format, footprint)?;
    let expected = BlockGrid::for_format(width, height, 1, format, footprint)
        .checked_output_byte_size()
        .ok_or_else(|| CodecError::InvalidDimensions {
            width,
            height,
            depth: 1,
            reason: "payload size overflows".to_string(),
        })?;
    let corrupt = || CodecError::TruncatedOrCorrupt {
        expected,
        actual: data.len(),
    };

    let payload = if data.len() == expected {
        data
    } else if data.len().checked_sub(HEADER_SIZE) == Some(expected) {
        let header = ContainerHeader::parse(data, format)?;
        if (header.width, header.height, header.depth) != (width, height, 1)
            || header.footprint != footprint
        {
            return Err(corrupt());
        }
        &data[HEADER_SIZE..]
    } else {
        return Err(corrupt());
    };

    let pixels = codec.decode(payload, width, height)?;
    debug!(format = %format, width, height, "Decoded texture");
    PixelVolume::from_rgba8(width, height, pixels)
}

/// Decode the first container in `bytes`, trusting its header.
///
/// Arrays are decoded slice by slice into a volume of the header's depth.
/// Bytes after the container (further mip levels) are ignored.
pub fn decompress_container(bytes: &[u8], format: TextureFormat) -> CodecResult<PixelVolume> {
    let header = ContainerHeader::parse(bytes, format)?;
    let codec = decoder_for(format, header.footprint)?;
    let grid = header.grid(format)?;

    let body = &bytes[HEADER_SIZE..];
    if body.len() < grid.output_byte_size() {
        return Err(CodecError::TruncatedOrCorrupt {
            expected: grid.output_byte_size().saturating_add(HEADER_SIZE),
            actual: bytes.len(),
        });
    }
    if body.len() > grid.output_byte_size() {
        debug!(
            trailing = body.len() - grid.output_byte_size(),
            "Ignoring bytes after first container"
        );
    }

    let layers = body[..grid.output_byte_size()]
        .chunks_exact(grid.layer_byte_size())
        .map(|layer| codec.decode(layer, header.width, header.height))
        .collect::<CodecResult<Vec<_>>>()?;

    PixelVolume::from_layers(
        header.width,
        header.height,
        BitDepth::U8,
        CHANNELS as u8,
        DynamicRange::Ldr,
        layers,
    )
}

/// Decode like [`decompress`] and write the result as an image file.
pub fn decompress_to_file(
    data: &[u8],
    format: TextureFormat,
    width: u32,
    height: u32,
    footprint: BlockFootprint,
    output: &Path,
) -> CodecResult<()> {
    let volume = decompress(data, format, width, height, footprint)?;
    write_volume(volume, output)
}

/// Write a decoded volume as image files.
///
/// A single layer goes to `output`; array layers go to numbered slice files
/// next to it (`out.png` → `out_0.png`, `out_1.png`, ...).
pub fn write_volume(mut volume: PixelVolume, output: &Path) -> CodecResult<()> {
    let (width, height, depth) = (volume.width(), volume.height(), volume.depth());
    if volume.bit_depth() != BitDepth::U8 {
        volume = volume.to_rgba8().into_owned();
    }

    if depth == 1 {
        write_rgba8(output, width, height, volume.into_bytes())?;
    } else {
        for (z, layer) in volume.into_layers().into_iter().enumerate() {
            write_rgba8(&slice_path(output, z as u32)?, width, height, layer)?;
        }
    }

    info!(output = %output.display(), width, height, depth, "Decoded image written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::compress;
    use crate::config::CodecConfig;
    use crate::volume::{FileImageLoader, ImageLoader};

    fn encoded(format: TextureFormat, width: u32, height: u32, value: u8) -> Vec<u8> {
        let volume =
            PixelVolume::from_rgba8(width, height, vec![value; (width * height * 4) as usize])
                .unwrap();
        compress(&volume, &CodecConfig::new(format))
            .unwrap()
            .remove(0)
            .to_bytes()
    }

    #[test]
    fn test_exact_payload_accepted() {
        let container = encoded(TextureFormat::Etc1, 8, 8, 100);
        let payload = &container[HEADER_SIZE..];

        let volume =
            decompress(payload, TextureFormat::Etc1, 8, 8, BlockFootprint::ETC).unwrap();
        assert_eq!((volume.width(), volume.height(), volume.depth()), (8, 8, 1));
        assert_eq!(volume.layer_byte_size(), 8 * 8 * 4);
    }

    #[test]
    fn test_one_byte_short_rejected() {
        let container = encoded(TextureFormat::Etc1, 8, 8, 100);
        let payload = &container[HEADER_SIZE..container.len() - 1];

        match decompress(payload, TextureFormat::Etc1, 8, 8, BlockFootprint::ETC) {
            Err(CodecError::TruncatedOrCorrupt { expected, actual }) => {
                assert_eq!(expected, 32);
                assert_eq!(actual, 31);
            }
            other => panic!("Expected TruncatedOrCorrupt, got {:?}", other),
        }
    }

    #[test]
    fn test_container_accepted() {
        let container = encoded(TextureFormat::Etc2Rgba, 4, 4, 60);
        let volume =
            decompress(&container, TextureFormat::Etc2Rgba, 4, 4, BlockFootprint::ETC).unwrap();
        assert!(volume.layer(0).chunks_exact(4).all(|px| px[3] == 60));
    }

    #[test]
    fn test_container_of_other_format_rejected() {
        // ETC1 and ETC2 RGB blocks have the same size but different magics
        let container = encoded(TextureFormat::Etc1, 4, 4, 60);
        assert!(matches!(
            decompress(&container, TextureFormat::Etc2Rgb, 4, 4, BlockFootprint::ETC),
            Err(CodecError::BadMagic { .. })
        ));
    }

    #[test]
    fn test_container_dimension_mismatch_rejected() {
        // 8×4 and 4×8 share a payload size
        let container = encoded(TextureFormat::Etc1, 8, 4, 60);
        assert!(matches!(
            decompress(&container, TextureFormat::Etc1, 4, 8, BlockFootprint::ETC),
            Err(CodecError::TruncatedOrCorrupt { .. })
        ));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            decompress(&[], TextureFormat::Etc1, 0, 4, BlockFootprint::ETC),
            Err(CodecError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_illegal_astc_footprint_rejected() {
        assert!(matches!(
            decompress(&[0; 16], TextureFormat::Astc, 4, 4, BlockFootprint::new_2d(7, 7)),
            Err(CodecError::BadBlockSize { .. })
        ));
    }

    #[test]
    fn test_astc_round_trip() {
        let container = encoded(TextureFormat::Astc, 9, 5, 180);
        let volume = decompress(
            &container,
            TextureFormat::Astc,
            9,
            5,
            BlockFootprint::new_2d(4, 4),
        )
        .unwrap();
        for value in volume.layer(0) {
            assert!(value.abs_diff(180) <= 4 || *value == 255);
        }
    }

    #[test]
    fn test_decompress_container_array() {
        let volume = PixelVolume::from_layers(
            4,
            4,
            BitDepth::U8,
            4,
            DynamicRange::Ldr,
            vec![vec![0; 64], vec![128; 64], vec![255; 64]],
        )
        .unwrap();
        let bytes = compress(&volume, &CodecConfig::new(TextureFormat::Etc1))
            .unwrap()
            .remove(0)
            .to_bytes();

        let decoded = decompress_container(&bytes, TextureFormat::Etc1).unwrap();
        assert_eq!(decoded.depth(), 3);
        let red = |z: u32| decoded.layer(z)[0];
        assert!(red(0) < red(1) && red(1) < red(2));
    }

    #[test]
    fn test_decompress_container_truncated() {
        let bytes = encoded(TextureFormat::Etc1, 8, 8, 1);
        assert!(matches!(
            decompress_container(&bytes[..bytes.len() - 8], TextureFormat::Etc1),
            Err(CodecError::TruncatedOrCorrupt { .. })
        ));
    }

    /// Hand-built ETC1 header with arbitrary 24-bit dimensions.
    fn raw_etc1_header(width: u32, height: u32, depth: u32) -> Vec<u8> {
        let mut bytes = crate::format::ETC1_MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[4, 4, 1]);
        for dim in [width, height, depth] {
            bytes.extend_from_slice(&dim.to_le_bytes()[..3]);
        }
        bytes
    }

    #[test]
    fn test_decompress_container_zero_dimension_header() {
        for (w, h, d) in [(0, 4, 1), (4, 0, 1), (4, 4, 0)] {
            let mut bytes = raw_etc1_header(w, h, d);
            bytes.extend_from_slice(&[0; 8]);
            assert!(matches!(
                decompress_container(&bytes, TextureFormat::Etc1),
                Err(CodecError::InvalidDimensions { .. })
            ));
        }
    }

    #[test]
    fn test_decompress_container_oversized_header() {
        let bytes = raw_etc1_header(0xFF_FFFF, 0xFF_FFFF, 0xFF_FFFF);
        assert!(matches!(
            decompress_container(&bytes, TextureFormat::Etc1),
            Err(CodecError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_decompress_oversized_dimensions() {
        assert!(matches!(
            decompress(&[0; 8], TextureFormat::Etc2Rgba, u32::MAX, u32::MAX, BlockFootprint::ETC),
            Err(CodecError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_decompress_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.png");
        let container = encoded(TextureFormat::Etc2Rgb, 6, 3, 90);

        decompress_to_file(
            &container,
            TextureFormat::Etc2Rgb,
            6,
            3,
            BlockFootprint::ETC,
            &output,
        )
        .unwrap();
        let image = FileImageLoader.load(&output).unwrap();
        assert_eq!((image.width(), image.height()), (6, 3));
    }

    #[test]
    fn test_write_volume_array_slices() {
        let dir = tempfile::tempdir().unwrap();
        let volume = PixelVolume::from_layers(
            2,
            2,
            BitDepth::U8,
            4,
            DynamicRange::Ldr,
            vec![vec![1; 16], vec![2; 16]],
        )
        .unwrap();

        write_volume(volume, &dir.path().join("out.png")).unwrap();
        assert!(dir.path().join("out_0.png").exists());
        assert!(dir.path().join("out_1.png").exists());
        assert!(!dir.path().join("out.png").exists());
    }
}
