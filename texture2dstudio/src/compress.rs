//! Compression orchestrator.
//!
//! Turns a [`PixelVolume`] into one [`CompressedContainer`] per mip level:
//!
//! ```text
//! PixelVolume ──► to_rgba8 ──► level 0 ──► encode ──► container 0
//!                                 │
//!                                 ▼ (mipmap: 2×2 box filter)
//!                              level 1 ──► encode ──► container 1
//!                                 ⋮
//!                              1×1     ──► encode ──► container N
//! ```
//!
//! Every level is encoded by the pooled [`CodecContext`] for the config, so
//! repeated calls with the same settings reuse the worker pool.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::codec::{CodecContext, CodecContextManager};
use crate::config::CodecConfig;
use crate::container::{encode_stream, CompressedContainer, ContainerHeader};
use crate::error::{CodecError, CodecResult};
use crate::volume::{FileImageLoader, ImageAssembler, ImageLoader, PixelVolume};

/// Compresses volumes and image files with pooled codec contexts.
///
/// # Example
///
/// ```
/// use texture2dstudio::{CodecConfig, Compressor, PixelVolume, TextureFormat};
///
/// let compressor = Compressor::new();
/// let volume = PixelVolume::from_rgba8(16, 16, vec![128; 16 * 16 * 4]).unwrap();
/// let config = CodecConfig::new(TextureFormat::Etc1).with_mipmap(true);
///
/// let levels = compressor.compress(&volume, &config).unwrap();
/// let widths: Vec<u32> = levels.iter().map(|c| c.header().width).collect();
/// assert_eq!(widths, vec![16, 8, 4, 2, 1]);
/// ```
#[derive(Debug, Default)]
pub struct Compressor<L = FileImageLoader> {
    manager: CodecContextManager,
    assembler: ImageAssembler<L>,
}

impl Compressor {
    /// Create a compressor that loads files from disk.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: ImageLoader> Compressor<L> {
    /// Create a compressor that loads images through `loader`.
    pub fn with_loader(loader: L) -> Self {
        Self {
            manager: CodecContextManager::new(),
            assembler: ImageAssembler::new(loader),
        }
    }

    /// Get the context pool.
    pub fn manager(&self) -> &CodecContextManager {
        &self.manager
    }

    /// Compress `volume`, returning containers in descending level size.
    ///
    /// # Errors
    ///
    /// Any config, context or encode error. No partial result is returned.
    pub fn compress(
        &self,
        volume: &PixelVolume,
        config: &CodecConfig,
    ) -> CodecResult<Vec<CompressedContainer>> {
        let context = self.manager.acquire(config)?;
        let context = context.lock();
        encode_levels(&context, volume)
    }

    /// Load `input` (one image, or `slices` array slices), compress it and
    /// write every level to `output`.
    ///
    /// Levels are written back to back, each with its 16-byte header unless
    /// `header` is false.
    pub fn compress_file(
        &self,
        input: &Path,
        output: &Path,
        config: &CodecConfig,
        slices: u32,
        header: bool,
    ) -> CodecResult<()> {
        config.validate()?;
        let volume = self.assembler.assemble(input, slices)?;
        let containers = self.compress(&volume, config)?;
        let bytes = encode_stream(&containers, header);

        fs::write(output, &bytes).map_err(|e| CodecError::io(output, e))?;
        info!(
            input = %input.display(),
            output = %output.display(),
            format = %config.format(),
            levels = containers.len(),
            bytes = bytes.len(),
            "Compressed texture written"
        );
        Ok(())
    }
}

/// Compress `volume` with a one-shot context.
pub fn compress(volume: &PixelVolume, config: &CodecConfig) -> CodecResult<Vec<CompressedContainer>> {
    let context = CodecContext::create(*config)?;
    let result = encode_levels(&context, volume);
    context.destroy();
    result
}

fn encode_levels(
    context: &CodecContext,
    volume: &PixelVolume,
) -> CodecResult<Vec<CompressedContainer>> {
    let config = context.config();
    if volume.is_hdr() {
        warn!(
            format = %config.format(),
            "HDR input clamped to LDR for encoding"
        );
    }

    let mut level: Cow<'_, PixelVolume> = volume.to_rgba8();
    let mut containers = Vec::new();
    loop {
        containers.push(encode_level(context, &level)?);
        if !config.mipmap() || (level.width(), level.height()) == (1, 1) {
            break;
        }
        level = Cow::Owned(level.downsample()?);
    }

    info!(
        format = %config.format(),
        width = volume.width(),
        height = volume.height(),
        depth = volume.depth(),
        levels = containers.len(),
        "Compression complete"
    );
    Ok(containers)
}

fn encode_level(context: &CodecContext, level: &PixelVolume) -> CodecResult<CompressedContainer> {
    let config = context.config();
    let format = config.format();
    let header = ContainerHeader::new(
        format,
        config.footprint(),
        level.width(),
        level.height(),
        level.depth(),
    )?;
    let grid = header.grid(format)?;

    let mut payload = vec![0u8; grid.output_byte_size()];
    context.encode(level, &mut payload)?;
    debug!(
        width = level.width(),
        height = level.height(),
        blocks = grid.total_blocks(),
        bytes = payload.len(),
        "Encoded level"
    );

    CompressedContainer::new(format, header, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::HEADER_SIZE;
    use crate::format::{BlockFootprint, TextureFormat};
    use crate::grid::BlockGrid;
    use crate::volume::{write_rgba8, BitDepth, DynamicRange};

    fn gray(width: u32, height: u32) -> PixelVolume {
        PixelVolume::from_rgba8(width, height, vec![128; (width * height * 4) as usize]).unwrap()
    }

    #[test]
    fn test_single_level_without_mipmap() {
        let containers = compress(&gray(10, 6), &CodecConfig::new(TextureFormat::Etc1)).unwrap();
        assert_eq!(containers.len(), 1);

        let header = containers[0].header();
        assert_eq!((header.width, header.height, header.depth), (10, 6, 1));
        assert_eq!(containers[0].payload().len(), 3 * 2 * 8);
    }

    #[test]
    fn test_mipmap_chain_sizes() {
        let config = CodecConfig::new(TextureFormat::Etc2Rgba).with_mipmap(true);
        let containers = compress(&gray(16, 16), &config).unwrap();

        let dims: Vec<(u32, u32)> = containers
            .iter()
            .map(|c| (c.header().width, c.header().height))
            .collect();
        assert_eq!(dims, vec![(16, 16), (8, 8), (4, 4), (2, 2), (1, 1)]);

        for container in &containers {
            let h = container.header();
            let grid =
                BlockGrid::for_format(h.width, h.height, 1, TextureFormat::Etc2Rgba, h.footprint);
            assert_eq!(container.payload().len(), grid.output_byte_size());
        }
    }

    #[test]
    fn test_mipmap_chain_non_square() {
        let config = CodecConfig::new(TextureFormat::Etc1).with_mipmap(true);
        let containers = compress(&gray(8, 2), &config).unwrap();
        let dims: Vec<(u32, u32)> = containers
            .iter()
            .map(|c| (c.header().width, c.header().height))
            .collect();
        assert_eq!(dims, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn test_astc_footprint_in_header() {
        let config =
            CodecConfig::new(TextureFormat::Astc).with_footprint(BlockFootprint::new_2d(6, 6));
        let containers = compress(&gray(10, 10), &config).unwrap();

        let header = containers[0].header();
        assert_eq!(header.footprint, BlockFootprint::new_2d(6, 6));
        assert_eq!(header.magic, TextureFormat::Astc.magic());
        assert_eq!(containers[0].payload().len(), 2 * 2 * 16);
    }

    #[test]
    fn test_array_volume_keeps_depth() {
        let volume = PixelVolume::from_layers(
            4,
            4,
            BitDepth::U8,
            4,
            DynamicRange::Ldr,
            vec![vec![10; 64], vec![20; 64], vec![30; 64]],
        )
        .unwrap();
        let config = CodecConfig::new(TextureFormat::Etc1).with_mipmap(true);
        let containers = compress(&volume, &config).unwrap();

        assert_eq!(containers.len(), 3);
        for container in &containers {
            assert_eq!(container.header().depth, 3);
        }
        assert_eq!(containers[0].payload().len(), 3 * 8);
    }

    #[test]
    fn test_hdr_input_is_clamped() {
        let volume = PixelVolume::from_layers(
            4,
            4,
            BitDepth::F32,
            4,
            DynamicRange::Hdr,
            vec![[2.0f32; 64].iter().flat_map(|v| v.to_le_bytes()).collect()],
        )
        .unwrap();
        let containers = compress(&volume, &CodecConfig::new(TextureFormat::Etc1)).unwrap();
        assert_eq!(containers[0].payload().len(), 8);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CodecConfig::new(TextureFormat::Etc1).with_effort(200);
        assert!(matches!(
            compress(&gray(4, 4), &config),
            Err(CodecError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_compressor_reuses_context() {
        let compressor = Compressor::new();
        let config = CodecConfig::new(TextureFormat::Etc1);
        compressor.compress(&gray(4, 4), &config).unwrap();
        compressor.compress(&gray(8, 8), &config).unwrap();
        assert_eq!(compressor.manager().len(), 1);

        let other = config.with_effort(80);
        compressor.compress(&gray(4, 4), &other).unwrap();
        assert_eq!(compressor.manager().len(), 2);
    }

    #[test]
    fn test_compress_file_with_and_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        write_rgba8(&input, 8, 8, vec![200; 8 * 8 * 4]).unwrap();
        let compressor = Compressor::new();
        let config = CodecConfig::new(TextureFormat::Etc1);

        let with_header = dir.path().join("with.bin");
        compressor
            .compress_file(&input, &with_header, &config, 1, true)
            .unwrap();
        let bytes = fs::read(&with_header).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + 4 * 8);
        assert_eq!(
            ContainerHeader::parse(&bytes, TextureFormat::Etc1)
                .unwrap()
                .width,
            8
        );

        let raw = dir.path().join("raw.bin");
        compressor
            .compress_file(&input, &raw, &config, 1, false)
            .unwrap();
        assert_eq!(fs::read(&raw).unwrap(), bytes[HEADER_SIZE..].to_vec());
    }

    #[test]
    fn test_compress_file_array() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..3 {
            let path = dir.path().join(format!("tex_{}.png", i));
            write_rgba8(&path, 4, 4, vec![50 * i as u8; 64]).unwrap();
        }
        let output = dir.path().join("tex.etc");
        Compressor::new()
            .compress_file(
                &dir.path().join("tex.png"),
                &output,
                &CodecConfig::new(TextureFormat::Etc2Rgb),
                3,
                true,
            )
            .unwrap();

        let bytes = fs::read(&output).unwrap();
        let header = ContainerHeader::parse(&bytes, TextureFormat::Etc2Rgb).unwrap();
        assert_eq!(header.depth, 3);
        assert_eq!(bytes.len(), HEADER_SIZE + 3 * 8);
    }

    #[test]
    fn test_compress_file_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.bin");
        let result = Compressor::new().compress_file(
            &dir.path().join("missing.png"),
            &output,
            &CodecConfig::new(TextureFormat::Etc1),
            1,
            true,
        );
        assert!(matches!(result, Err(CodecError::Io { .. })));
        assert!(!output.exists());
    }
}
