//! Assembly of image arrays into one volume.
//!
//! A 2D image is loaded directly. An array of `N` slices is loaded from files
//! named after a pattern with the slice index inserted before the extension:
//!
//! ```text
//! pattern: textures/terrain.png
//! slices:  textures/terrain_0.png, textures/terrain_1.png, ...
//! ```
//!
//! Every slice must match slice 0 in width, height, component count and
//! dynamic range, and must itself be 2D.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{FileImageLoader, ImageLoader, PixelVolume};
use crate::error::{CodecError, CodecResult};

/// Path of slice `index` for an array `pattern`.
///
/// # Errors
///
/// `InvalidPattern` if the pattern has no file extension.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use texture2dstudio::volume::slice_path;
///
/// let slice = slice_path(Path::new("foo/bar.png"), 2).unwrap();
/// assert_eq!(slice, Path::new("foo/bar_2.png"));
/// ```
pub fn slice_path(pattern: &Path, index: u32) -> CodecResult<PathBuf> {
    let invalid = || CodecError::InvalidPattern(pattern.display().to_string());
    let ext = pattern.extension().ok_or_else(invalid)?;
    let stem = pattern.file_stem().ok_or_else(invalid)?;

    let mut name = stem.to_os_string();
    name.push(format!("_{}.", index));
    name.push(ext);
    Ok(pattern.with_file_name(name))
}

/// Loads single images or slice arrays into a [`PixelVolume`].
#[derive(Debug, Clone, Default)]
pub struct ImageAssembler<L = FileImageLoader> {
    loader: L,
}

impl<L: ImageLoader> ImageAssembler<L> {
    /// Create an assembler backed by `loader`.
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Load `pattern` as a single image (`slices == 1`) or as an array of
    /// `slices` images.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `slices` is zero
    /// - `InvalidPattern` if an array pattern has no extension
    /// - `NestedVolumeNotSupported` if an array slice has depth other than 1
    /// - `InconsistentArray` if a slice differs from slice 0
    /// - any error from the loader
    pub fn assemble(&self, pattern: &Path, slices: u32) -> CodecResult<PixelVolume> {
        match slices {
            0 => Err(CodecError::InvalidConfig(
                "slice count must be at least 1".to_string(),
            )),
            1 => self.loader.load(pattern),
            _ => self.assemble_array(pattern, slices),
        }
    }

    fn assemble_array(&self, pattern: &Path, slices: u32) -> CodecResult<PixelVolume> {
        let mut loaded: Vec<PixelVolume> = Vec::with_capacity(slices as usize);

        for index in 0..slices {
            let path = slice_path(pattern, index)?;
            let slice = self.loader.load(&path)?;

            if slice.depth() != 1 {
                return Err(CodecError::NestedVolumeNotSupported { index });
            }
            if let Some(first) = loaded.first() {
                check_consistent(first, &slice, index)?;
            }

            debug!(path = %path.display(), index, "Loaded array slice");
            loaded.push(slice);
        }

        let first = &loaded[0];
        let (width, height) = (first.width(), first.height());
        let bit_depth = first.bit_depth();
        let component_count = first.component_count();
        let dynamic_range = first.dynamic_range();

        // Each slice contributes its single layer
        let layers = loaded
            .into_iter()
            .flat_map(PixelVolume::into_layers)
            .collect();
        let volume = PixelVolume::from_layers(
            width,
            height,
            bit_depth,
            component_count,
            dynamic_range,
            layers,
        )?;

        info!(
            pattern = %pattern.display(),
            width,
            height,
            depth = volume.depth(),
            bits = bit_depth.bits(),
            "Assembled image array"
        );
        Ok(volume)
    }
}

fn check_consistent(first: &PixelVolume, slice: &PixelVolume, index: u32) -> CodecResult<()> {
    if first.dynamic_range() != slice.dynamic_range()
        || first.component_count() != slice.component_count()
        || first.bit_depth() != slice.bit_depth()
    {
        return Err(CodecError::InconsistentArray {
            index,
            reason: "different formats".to_string(),
        });
    }
    if first.width() != slice.width() || first.height() != slice.height() {
        return Err(CodecError::InconsistentArray {
            index,
            reason: format!(
                "different dimensions ({}×{} vs {}×{})",
                first.width(),
                first.height(),
                slice.width(),
                slice.height()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::{BitDepth, DynamicRange};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// In-memory loader that records every path it is asked for.
    #[derive(Default)]
    struct MemoryLoader {
        images: HashMap<PathBuf, PixelVolume>,
        requests: Mutex<Vec<PathBuf>>,
    }

    impl MemoryLoader {
        fn with(mut self, path: &str, volume: PixelVolume) -> Self {
            self.images.insert(PathBuf::from(path), volume);
            self
        }
    }

    impl ImageLoader for MemoryLoader {
        fn load(&self, path: &Path) -> CodecResult<PixelVolume> {
            self.requests.lock().push(path.to_path_buf());
            self.images.get(path).cloned().ok_or_else(|| {
                CodecError::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                )
            })
        }
    }

    fn rgba_slice(size: u32, value: u8) -> PixelVolume {
        PixelVolume::from_rgba8(size, size, vec![value; (size * size * 4) as usize]).unwrap()
    }

    #[test]
    fn test_slice_path() {
        assert_eq!(
            slice_path(Path::new("foo/bar.png"), 0).unwrap(),
            PathBuf::from("foo/bar_0.png")
        );
        assert_eq!(
            slice_path(Path::new("a.b.tga"), 11).unwrap(),
            PathBuf::from("a.b_11.tga")
        );
    }

    #[test]
    fn test_slice_path_without_extension() {
        let result = slice_path(Path::new("foo/bar"), 0);
        assert!(matches!(result, Err(CodecError::InvalidPattern(_))));
    }

    #[test]
    fn test_single_image_loaded_directly() {
        let loader = MemoryLoader::default().with("img.png", rgba_slice(4, 9));
        let assembler = ImageAssembler::new(loader);

        let volume = assembler.assemble(Path::new("img.png"), 1).unwrap();
        assert_eq!(volume.depth(), 1);
        assert_eq!(
            *assembler.loader.requests.lock(),
            vec![PathBuf::from("img.png")]
        );
    }

    #[test]
    fn test_zero_slices_rejected() {
        let assembler = ImageAssembler::new(MemoryLoader::default());
        let result = assembler.assemble(Path::new("img.png"), 0);
        assert!(matches!(result, Err(CodecError::InvalidConfig(_))));
    }

    #[test]
    fn test_three_slices_assembled() {
        let loader = MemoryLoader::default()
            .with("arr_0.png", rgba_slice(4, 1))
            .with("arr_1.png", rgba_slice(4, 2))
            .with("arr_2.png", rgba_slice(4, 3));
        let assembler = ImageAssembler::new(loader);

        let volume = assembler.assemble(Path::new("arr.png"), 3).unwrap();
        assert_eq!(volume.depth(), 3);
        assert_eq!((volume.width(), volume.height()), (4, 4));
        for z in 0..3 {
            assert_eq!(volume.layer(z), rgba_slice(4, z as u8 + 1).layer(0));
        }
    }

    #[test]
    fn test_mismatched_dimensions_rejected() {
        let loader = MemoryLoader::default()
            .with("arr_0.png", rgba_slice(4, 1))
            .with("arr_1.png", rgba_slice(4, 1))
            .with("arr_2.png", rgba_slice(4, 1))
            .with("arr_3.png", rgba_slice(8, 1));
        let assembler = ImageAssembler::new(loader);

        match assembler.assemble(Path::new("arr.png"), 4) {
            Err(CodecError::InconsistentArray { index, reason }) => {
                assert_eq!(index, 3);
                assert!(reason.contains("dimensions"));
            }
            other => panic!("Expected InconsistentArray, got {:?}", other),
        }
    }

    #[test]
    fn test_mismatched_format_rejected() {
        let hdr = PixelVolume::from_layers(
            4,
            4,
            BitDepth::F16,
            4,
            DynamicRange::Hdr,
            vec![vec![0; 4 * 4 * 4 * 2]],
        )
        .unwrap();
        let loader = MemoryLoader::default()
            .with("arr_0.png", rgba_slice(4, 1))
            .with("arr_1.png", hdr);
        let assembler = ImageAssembler::new(loader);

        assert!(matches!(
            assembler.assemble(Path::new("arr.png"), 2),
            Err(CodecError::InconsistentArray { index: 1, .. })
        ));
    }

    #[test]
    fn test_nested_volume_rejected() {
        let nested = PixelVolume::from_layers(
            4,
            4,
            BitDepth::U8,
            4,
            DynamicRange::Ldr,
            vec![vec![0; 64], vec![0; 64]],
        )
        .unwrap();
        let loader = MemoryLoader::default()
            .with("arr_0.png", rgba_slice(4, 1))
            .with("arr_1.png", nested);
        let assembler = ImageAssembler::new(loader);

        assert!(matches!(
            assembler.assemble(Path::new("arr.png"), 2),
            Err(CodecError::NestedVolumeNotSupported { index: 1 })
        ));
    }

    #[test]
    fn test_missing_slice_stops_loading() {
        let loader = MemoryLoader::default()
            .with("arr_0.png", rgba_slice(4, 1))
            .with("arr_2.png", rgba_slice(4, 1));
        let assembler = ImageAssembler::new(loader);

        assert!(matches!(
            assembler.assemble(Path::new("arr.png"), 3),
            Err(CodecError::Io { .. })
        ));
        assert_eq!(assembler.loader.requests.lock().len(), 2);
    }

    #[test]
    fn test_pattern_without_extension_rejected_before_loading() {
        let assembler = ImageAssembler::new(MemoryLoader::default());
        assert!(matches!(
            assembler.assemble(Path::new("arr"), 2),
            Err(CodecError::InvalidPattern(_))
        ));
        assert!(assembler.loader.requests.lock().is_empty());
    }
}
