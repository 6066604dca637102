//! Pixel volumes and image assembly.
//!
//! A [`PixelVolume`] is the uncompressed input (or decoded output) of the
//! codecs: `depth` layers of `width × height` texels, always normalized to
//! four channels. Layers are stored as little-endian bytes whose element
//! width depends on the [`BitDepth`].
//!
//! Volumes come from the [`ImageAssembler`], which loads one image or an
//! array of same-shaped slices through an [`ImageLoader`].

mod assembler;
mod loader;
mod mipmap;

pub use assembler::{slice_path, ImageAssembler};
pub use loader::{load_from_memory, write_rgba8, FileImageLoader, ImageLoader};
pub use mipmap::next_level_dims;

use std::borrow::Cow;

use half::f16;

use crate::error::{CodecError, CodecResult};

/// Channels per texel after normalization.
pub const CHANNELS: usize = 4;

/// Storage precision of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitDepth {
    /// 8-bit unsigned normalized.
    U8,
    /// 16-bit half float.
    F16,
    /// 32-bit float.
    F32,
}

impl BitDepth {
    /// Bytes per channel element.
    pub fn bytes_per_channel(self) -> usize {
        match self {
            BitDepth::U8 => 1,
            BitDepth::F16 => 2,
            BitDepth::F32 => 4,
        }
    }

    /// Bits per channel element.
    pub fn bits(self) -> u32 {
        self.bytes_per_channel() as u32 * 8
    }
}

/// Dynamic range of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicRange {
    Ldr,
    Hdr,
}

/// Uncompressed texel volume with one buffer per depth layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelVolume {
    width: u32,
    height: u32,
    bit_depth: BitDepth,
    component_count: u8,
    dynamic_range: DynamicRange,
    layers: Vec<Vec<u8>>,
}

impl PixelVolume {
    /// Build a volume from per-layer buffers.
    ///
    /// # Errors
    ///
    /// - `InvalidDimensions` for zero width, height or layer count, or a layer
    ///   whose length is not `width * height * 4` elements
    /// - `InvalidConfig` for a component count outside 1..=4
    pub fn from_layers(
        width: u32,
        height: u32,
        bit_depth: BitDepth,
        component_count: u8,
        dynamic_range: DynamicRange,
        layers: Vec<Vec<u8>>,
    ) -> CodecResult<Self> {
        let depth = layers.len() as u32;
        if width == 0 || height == 0 || depth == 0 {
            return Err(CodecError::InvalidDimensions {
                width,
                height,
                depth,
                reason: "volume must not be empty".to_string(),
            });
        }
        if !(1..=CHANNELS as u8).contains(&component_count) {
            return Err(CodecError::InvalidConfig(format!(
                "component count {} out of range 1..=4",
                component_count
            )));
        }

        let expected = layer_len(width, height, bit_depth);
        if let Some(bad) = layers.iter().position(|l| l.len() != expected) {
            return Err(CodecError::InvalidDimensions {
                width,
                height,
                depth,
                reason: format!(
                    "layer {} holds {} bytes, expected {}",
                    bad,
                    layers[bad].len(),
                    expected
                ),
            });
        }

        Ok(Self {
            width,
            height,
            bit_depth,
            component_count,
            dynamic_range,
            layers,
        })
    }

    /// Build a single-layer LDR volume from tightly packed RGBA8 texels.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> CodecResult<Self> {
        Self::from_layers(
            width,
            height,
            BitDepth::U8,
            CHANNELS as u8,
            DynamicRange::Ldr,
            vec![pixels],
        )
    }

    /// Width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of layers.
    pub fn depth(&self) -> u32 {
        self.layers.len() as u32
    }

    /// Channel storage precision.
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Channel count of the source image (storage is always 4 channels).
    pub fn component_count(&self) -> u8 {
        self.component_count
    }

    /// Dynamic range of the source image.
    pub fn dynamic_range(&self) -> DynamicRange {
        self.dynamic_range
    }

    /// Returns true for HDR content.
    pub fn is_hdr(&self) -> bool {
        self.dynamic_range == DynamicRange::Hdr
    }

    /// Bytes of one layer.
    pub fn layer_byte_size(&self) -> usize {
        layer_len(self.width, self.height, self.bit_depth)
    }

    /// Borrow layer `z`.
    ///
    /// # Panics
    ///
    /// Panics if `z >= depth`.
    pub fn layer(&self, z: u32) -> &[u8] {
        &self.layers[z as usize]
    }

    /// Borrow all layers.
    pub fn layers(&self) -> &[Vec<u8>] {
        &self.layers
    }

    /// Consume the volume, returning its layers.
    pub fn into_layers(self) -> Vec<Vec<u8>> {
        self.layers
    }

    /// Concatenate all layers into one buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        if self.layers.len() == 1 {
            return self.layers.into_iter().next().unwrap_or_default();
        }
        self.layers.concat()
    }

    /// View this volume as 8-bit RGBA.
    ///
    /// Float channels are clamped to [0, 1] and rounded. 8-bit volumes are
    /// borrowed unchanged.
    pub fn to_rgba8(&self) -> Cow<'_, PixelVolume> {
        if self.bit_depth == BitDepth::U8 {
            return Cow::Borrowed(self);
        }

        let layers = self
            .layers
            .iter()
            .map(|layer| match self.bit_depth {
                BitDepth::F16 => layer
                    .chunks_exact(2)
                    .map(|c| unorm8(f16::from_bits(u16::from_le_bytes([c[0], c[1]])).to_f32()))
                    .collect(),
                BitDepth::F32 => layer
                    .chunks_exact(4)
                    .map(|c| unorm8(f32::from_le_bytes([c[0], c[1], c[2], c[3]])))
                    .collect(),
                BitDepth::U8 => layer.clone(),
            })
            .collect();

        Cow::Owned(Self {
            width: self.width,
            height: self.height,
            bit_depth: BitDepth::U8,
            component_count: self.component_count,
            dynamic_range: DynamicRange::Ldr,
            layers,
        })
    }

    /// Produce the next mip level with a 2×2 box filter.
    ///
    /// Width and height become `floor(dim / 2)` (minimum 1); each layer is
    /// filtered independently, so the depth is unchanged. Only 8-bit volumes
    /// are supported; convert with [`PixelVolume::to_rgba8`] first.
    pub fn downsample(&self) -> CodecResult<PixelVolume> {
        if self.bit_depth != BitDepth::U8 {
            return Err(CodecError::InvalidConfig(
                "mip generation requires an 8-bit volume".to_string(),
            ));
        }
        let (width, height) = next_level_dims(self.width, self.height);
        let layers = self
            .layers
            .iter()
            .map(|layer| mipmap::box_filter_rgba8(layer, self.width, self.height))
            .collect();

        Ok(Self {
            width,
            height,
            bit_depth: self.bit_depth,
            component_count: self.component_count,
            dynamic_range: self.dynamic_range,
            layers,
        })
    }
}

fn layer_len(width: u32, height: u32, bit_depth: BitDepth) -> usize {
    width as usize * height as usize * CHANNELS * bit_depth.bytes_per_channel()
}

#[inline]
fn unorm8(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
