//! Image loading and writing through the `image` crate.

use std::path::Path;

use half::f16;
use image::{DynamicImage, RgbaImage};
use tracing::debug;

use super::{BitDepth, DynamicRange, PixelVolume, CHANNELS};
use crate::error::{CodecError, CodecResult};

/// Source of uncompressed images.
///
/// Implementations normalize every image to four channels. The default
/// implementation is [`FileImageLoader`]; tests substitute in-memory loaders.
pub trait ImageLoader: Send + Sync {
    /// Load the image at `path` as a volume (normally of depth 1).
    fn load(&self, path: &Path) -> CodecResult<PixelVolume>;
}

/// Loads PNG, JPEG, HDR, EXR and the other formats the `image` crate decodes.
///
/// LDR images become 8-bit RGBA. 32-bit float images (HDR, EXR) become
/// half-float RGBA.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileImageLoader;

impl ImageLoader for FileImageLoader {
    fn load(&self, path: &Path) -> CodecResult<PixelVolume> {
        let image = image::open(path).map_err(|e| CodecError::from_image(path, e))?;
        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            color = ?image.color(),
            "Loaded source image"
        );
        volume_from_image(image)
    }
}

/// Decode an encoded image file held in memory.
pub fn load_from_memory(bytes: &[u8]) -> CodecResult<PixelVolume> {
    let image = image::load_from_memory(bytes).map_err(|e| match e {
        image::ImageError::IoError(source) => CodecError::ImageDecode(source.to_string()),
        other => CodecError::ImageDecode(other.to_string()),
    })?;
    volume_from_image(image)
}

/// Write tightly packed RGBA8 texels as an image file.
///
/// The file format is chosen from the extension of `path`.
pub fn write_rgba8(path: &Path, width: u32, height: u32, pixels: Vec<u8>) -> CodecResult<()> {
    let image = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
        CodecError::InvalidDimensions {
            width,
            height,
            depth: 1,
            reason: "pixel buffer does not match dimensions".to_string(),
        }
    })?;

    image.save(path).map_err(|e| match e {
        image::ImageError::IoError(source) => CodecError::io(path, source),
        other => CodecError::io(path, std::io::Error::other(other.to_string())),
    })
}

fn volume_from_image(image: DynamicImage) -> CodecResult<PixelVolume> {
    let component_count = image.color().channel_count();
    let (width, height) = (image.width(), image.height());
    let is_hdr = matches!(
        image,
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_)
    );

    if is_hdr {
        let texels: Vec<u8> = image
            .to_rgba32f()
            .into_raw()
            .into_iter()
            .flat_map(|v| f16::from_f32(v).to_bits().to_le_bytes())
            .collect();
        debug_assert_eq!(texels.len(), width as usize * height as usize * CHANNELS * 2);

        PixelVolume::from_layers(
            width,
            height,
            BitDepth::F16,
            component_count,
            DynamicRange::Hdr,
            vec![texels],
        )
    } else {
        PixelVolume::from_layers(
            width,
            height,
            BitDepth::U8,
            component_count,
            DynamicRange::Ldr,
            vec![image.to_rgba8().into_raw()],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb32FImage, RgbImage};
    use std::io::Cursor;

    fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_load_from_memory_rgb_normalized_to_rgba() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30])));
        let volume = load_from_memory(&png_bytes(&image)).unwrap();

        assert_eq!(volume.width(), 3);
        assert_eq!(volume.height(), 2);
        assert_eq!(volume.component_count(), 3);
        assert_eq!(volume.bit_depth(), BitDepth::U8);
        assert_eq!(&volume.layer(0)[0..4], &[10, 20, 30, 255]);
        assert_eq!(volume.layer_byte_size(), 3 * 2 * 4);
    }

    #[test]
    fn test_load_from_memory_garbage() {
        let result = load_from_memory(b"definitely not an image");
        assert!(matches!(result, Err(CodecError::ImageDecode(_))));
    }

    #[test]
    fn test_hdr_image_becomes_half_float() {
        let image =
            DynamicImage::ImageRgb32F(Rgb32FImage::from_pixel(2, 2, image::Rgb([2.0, 0.5, 0.0])));
        let volume = volume_from_image(image).unwrap();

        assert!(volume.is_hdr());
        assert_eq!(volume.bit_depth(), BitDepth::F16);
        assert_eq!(volume.component_count(), 3);

        let red = u16::from_le_bytes([volume.layer(0)[0], volume.layer(0)[1]]);
        assert_eq!(f16::from_bits(red).to_f32(), 2.0);
    }

    #[test]
    fn test_file_loader_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileImageLoader.load(&dir.path().join("missing.png"));
        assert!(matches!(result, Err(CodecError::Io { .. })));
    }

    #[test]
    fn test_write_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let pixels: Vec<u8> = (0..4 * 4 * 4).map(|i| i as u8).collect();

        write_rgba8(&path, 4, 4, pixels.clone()).unwrap();
        let volume = FileImageLoader.load(&path).unwrap();
        assert_eq!(volume.layer(0), pixels.as_slice());
    }

    #[test]
    fn test_write_rejects_mismatched_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_rgba8(&dir.path().join("x.png"), 4, 4, vec![0; 3]);
        assert!(matches!(result, Err(CodecError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_write_to_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("x.png");
        let result = write_rgba8(&path, 1, 1, vec![0; 4]);
        assert!(matches!(result, Err(CodecError::Io { .. })));
    }
}
