//! Types shared across CLI commands.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use texture2dstudio::TextureFormat;

use crate::error::CliError;

/// Texture format selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FormatArg {
    /// ETC1 RGB (8 bytes per 4x4 block)
    Etc1,
    /// ETC2 RGB (8 bytes per 4x4 block)
    Etc2Rgb,
    /// ETC2 RGBA8 with EAC alpha (16 bytes per 4x4 block)
    Etc2Rgba,
    /// ETC2 RGB with 1-bit punch-through alpha (8 bytes per 4x4 block)
    Etc2A1,
    /// ETC2 RGBA8, decoded as A8 (16 bytes per 4x4 block)
    Etc2A8,
    /// ASTC LDR (16 bytes per block, footprint from --block)
    Astc,
}

impl From<FormatArg> for TextureFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Etc1 => TextureFormat::Etc1,
            FormatArg::Etc2Rgb => TextureFormat::Etc2Rgb,
            FormatArg::Etc2Rgba => TextureFormat::Etc2Rgba,
            FormatArg::Etc2A1 => TextureFormat::Etc2A1,
            FormatArg::Etc2A8 => TextureFormat::Etc2A8,
            FormatArg::Astc => TextureFormat::Astc,
        }
    }
}

/// Read a whole input file.
pub fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Human-readable byte size.
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    match bytes {
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{} B", b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_arg_conversion() {
        assert_eq!(TextureFormat::from(FormatArg::Etc2A1), TextureFormat::Etc2A1);
        assert_eq!(TextureFormat::from(FormatArg::Astc), TextureFormat::Astc);
    }

    #[test]
    fn test_format_arg_names_match_library() {
        for arg in FormatArg::value_variants() {
            let name = arg.to_possible_value().unwrap().get_name().to_string();
            assert_eq!(name, TextureFormat::from(*arg).name());
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_file(&dir.path().join("missing")),
            Err(CliError::Read { .. })
        ));
    }
}
