//! Flat, signature-stable entry points.
//!
//! Byte-oriented functions take an encoded image file (PNG, JPEG, ...) or a
//! compressed payload and return a `CodecResult`. The `*_file` and
//! `*_to_file` variants return a status code instead: `1` on success and `0`
//! on failure, with the failure logged through `tracing::error!`.
//!
//! # Example
//!
//! ```
//! use texture2dstudio::api;
//! # use image::{ImageFormat, RgbaImage};
//! # let mut png = std::io::Cursor::new(Vec::new());
//! # RgbaImage::from_pixel(8, 8, image::Rgba([90, 90, 90, 255]))
//! #     .write_to(&mut png, ImageFormat::Png)
//! #     .unwrap();
//! # let png = png.into_inner();
//!
//! let compressed = api::compress_etc1(&png, false, 0, 1, false).unwrap();
//! assert_eq!(compressed.len(), 4 * 8);
//!
//! let rgba = api::decompress_etc1(&compressed, 8, 8).unwrap();
//! assert_eq!(rgba.len(), 8 * 8 * 4);
//! ```

use std::fs;
use std::path::Path;

use tracing::error;

use crate::compress::{compress, Compressor};
use crate::config::CodecConfig;
use crate::container::encode_stream;
use crate::decompress::{decompress, decompress_to_file};
use crate::error::{CodecError, CodecResult};
use crate::format::{BlockFootprint, TextureFormat};
use crate::volume::load_from_memory;

/// Status returned by the file variants on success.
pub const STATUS_OK: i32 = 1;

/// Status returned by the file variants on failure.
pub const STATUS_FAILED: i32 = 0;

fn etc_config(format: TextureFormat, mipmap: bool, effort: u32, jobs: usize) -> CodecConfig {
    CodecConfig::new(format)
        .with_mipmap(mipmap)
        .with_effort(effort)
        .with_thread_count(jobs)
}

fn astc_config(effort: u32, block_x: u32, block_y: u32, block_z: u32) -> CodecConfig {
    CodecConfig::new(TextureFormat::Astc)
        .with_effort(effort)
        .with_footprint(BlockFootprint::new(block_x, block_y, block_z))
}

fn compress_bytes(data: &[u8], config: &CodecConfig, header: bool) -> CodecResult<Vec<u8>> {
    config.validate()?;
    let volume = load_from_memory(data)?;
    let containers = compress(&volume, config)?;
    Ok(encode_stream(&containers, header))
}

fn status(operation: &str, output: &Path, result: CodecResult<()>) -> i32 {
    match result {
        Ok(()) => STATUS_OK,
        Err(e) => {
            error!(operation, output = %output.display(), error = %e, "Operation failed");
            STATUS_FAILED
        }
    }
}

/// Compress an encoded image to ETC1.
pub fn compress_etc1(
    data: &[u8],
    mipmap: bool,
    effort: u32,
    jobs: usize,
    header: bool,
) -> CodecResult<Vec<u8>> {
    compress_bytes(data, &etc_config(TextureFormat::Etc1, mipmap, effort, jobs), header)
}

/// Compress an encoded image to ETC2 RGB.
pub fn compress_etc2_rgb(
    data: &[u8],
    mipmap: bool,
    effort: u32,
    jobs: usize,
    header: bool,
) -> CodecResult<Vec<u8>> {
    compress_bytes(
        data,
        &etc_config(TextureFormat::Etc2Rgb, mipmap, effort, jobs),
        header,
    )
}

/// Compress an encoded image to ETC2 RGBA8.
pub fn compress_etc2_rgba(
    data: &[u8],
    mipmap: bool,
    effort: u32,
    jobs: usize,
    header: bool,
) -> CodecResult<Vec<u8>> {
    compress_bytes(
        data,
        &etc_config(TextureFormat::Etc2Rgba, mipmap, effort, jobs),
        header,
    )
}

/// Compress an encoded image to ASTC with the given block footprint.
///
/// Encoding supports 2D footprints up to 8×8 (`block_z` must be 1). Larger
/// or 3D footprints fail with `BadBlockSize`, although [`decompress_astc`]
/// decodes every legal 2D footprint.
pub fn compress_astc(
    data: &[u8],
    effort: u32,
    block_x: u32,
    block_y: u32,
    block_z: u32,
    header: bool,
) -> CodecResult<Vec<u8>> {
    compress_bytes(data, &astc_config(effort, block_x, block_y, block_z), header)
}

fn compress_file(input: &Path, output: &Path, config: &CodecConfig) -> CodecResult<()> {
    Compressor::new().compress_file(input, output, config, 1, true)
}

/// Compress an image file to an ETC1 container file.
pub fn compress_etc1_file(
    input: &Path,
    output: &Path,
    mipmap: bool,
    effort: u32,
    jobs: usize,
) -> i32 {
    let config = etc_config(TextureFormat::Etc1, mipmap, effort, jobs);
    status("compress_etc1_file", output, compress_file(input, output, &config))
}

/// Compress an image file to an ETC2 RGB container file.
pub fn compress_etc2_rgb_file(
    input: &Path,
    output: &Path,
    mipmap: bool,
    effort: u32,
    jobs: usize,
) -> i32 {
    let config = etc_config(TextureFormat::Etc2Rgb, mipmap, effort, jobs);
    status(
        "compress_etc2_rgb_file",
        output,
        compress_file(input, output, &config),
    )
}

/// Compress an image file to an ETC2 RGBA8 container file.
pub fn compress_etc2_rgba_file(
    input: &Path,
    output: &Path,
    mipmap: bool,
    effort: u32,
    jobs: usize,
) -> i32 {
    let config = etc_config(TextureFormat::Etc2Rgba, mipmap, effort, jobs);
    status(
        "compress_etc2_rgba_file",
        output,
        compress_file(input, output, &config),
    )
}

/// Compress an image file to an ASTC container file.
///
/// Same footprint limits as [`compress_astc`].
pub fn compress_astc_file(
    input: &Path,
    output: &Path,
    effort: u32,
    block_x: u32,
    block_y: u32,
    block_z: u32,
) -> i32 {
    let config = astc_config(effort, block_x, block_y, block_z);
    status(
        "compress_astc_file",
        output,
        compress_file(input, output, &config),
    )
}

fn decompress_rgba8(
    data: &[u8],
    format: TextureFormat,
    width: u32,
    height: u32,
    footprint: BlockFootprint,
) -> CodecResult<Vec<u8>> {
    Ok(decompress(data, format, width, height, footprint)?.into_bytes())
}

/// Decode ETC1 data to RGBA8.
pub fn decompress_etc1(data: &[u8], width: u32, height: u32) -> CodecResult<Vec<u8>> {
    decompress_rgba8(data, TextureFormat::Etc1, width, height, BlockFootprint::ETC)
}

/// Decode ETC2 RGB data to RGBA8.
pub fn decompress_etc2(data: &[u8], width: u32, height: u32) -> CodecResult<Vec<u8>> {
    decompress_rgba8(data, TextureFormat::Etc2Rgb, width, height, BlockFootprint::ETC)
}

/// Decode ETC2 punch-through alpha data to RGBA8.
pub fn decompress_etc2a1(data: &[u8], width: u32, height: u32) -> CodecResult<Vec<u8>> {
    decompress_rgba8(data, TextureFormat::Etc2A1, width, height, BlockFootprint::ETC)
}

/// Decode ETC2 RGBA8 (EAC alpha) data to RGBA8.
pub fn decompress_etc2a8(data: &[u8], width: u32, height: u32) -> CodecResult<Vec<u8>> {
    decompress_rgba8(data, TextureFormat::Etc2A8, width, height, BlockFootprint::ETC)
}

/// Decode ASTC data with a 2D footprint to RGBA8.
pub fn decompress_astc(
    data: &[u8],
    width: u32,
    height: u32,
    block_width: u32,
    block_height: u32,
) -> CodecResult<Vec<u8>> {
    decompress_rgba8(
        data,
        TextureFormat::Astc,
        width,
        height,
        BlockFootprint::new_2d(block_width, block_height),
    )
}

fn to_file(
    operation: &str,
    data: &[u8],
    output: &Path,
    format: TextureFormat,
    width: u32,
    height: u32,
    footprint: BlockFootprint,
) -> i32 {
    let result = decompress_to_file(data, format, width, height, footprint, output);
    status(operation, output, result)
}

/// Decode ETC1 data and write it as an image file.
pub fn decompress_etc1_to_file(data: &[u8], output: &Path, width: u32, height: u32) -> i32 {
    to_file(
        "decompress_etc1_to_file",
        data,
        output,
        TextureFormat::Etc1,
        width,
        height,
        BlockFootprint::ETC,
    )
}

/// Decode ETC2 RGB data and write it as an image file.
pub fn decompress_etc2_to_file(data: &[u8], output: &Path, width: u32, height: u32) -> i32 {
    to_file(
        "decompress_etc2_to_file",
        data,
        output,
        TextureFormat::Etc2Rgb,
        width,
        height,
        BlockFootprint::ETC,
    )
}

/// Decode ETC2 punch-through alpha data and write it as an image file.
pub fn decompress_etc2a1_to_file(data: &[u8], output: &Path, width: u32, height: u32) -> i32 {
    to_file(
        "decompress_etc2a1_to_file",
        data,
        output,
        TextureFormat::Etc2A1,
        width,
        height,
        BlockFootprint::ETC,
    )
}

/// Decode ETC2 RGBA8 data and write it as an image file.
pub fn decompress_etc2a8_to_file(data: &[u8], output: &Path, width: u32, height: u32) -> i32 {
    to_file(
        "decompress_etc2a8_to_file",
        data,
        output,
        TextureFormat::Etc2A8,
        width,
        height,
        BlockFootprint::ETC,
    )
}

/// Decode ASTC data and write it as an image file.
pub fn decompress_astc_to_file(
    data: &[u8],
    output: &Path,
    width: u32,
    height: u32,
    block_width: u32,
    block_height: u32,
) -> i32 {
    to_file(
        "decompress_astc_to_file",
        data,
        output,
        TextureFormat::Astc,
        width,
        height,
        BlockFootprint::new_2d(block_width, block_height),
    )
}

/// Read a whole file for the byte-oriented functions.
pub fn read_input(path: &Path) -> CodecResult<Vec<u8>> {
    fs::read(path).map_err(|e| CodecError::io(path, e))
}
