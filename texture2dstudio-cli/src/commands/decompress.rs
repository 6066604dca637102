//! Decompress command.

use std::path::PathBuf;

use clap::Args;
use texture2dstudio::{
    decompress, decompress_container, write_volume, BlockFootprint, PixelVolume, TextureFormat,
};

use super::common::{read_file, FormatArg};
use crate::error::CliError;

/// Arguments for the decompress command.
#[derive(Debug, Args)]
pub struct DecompressArgs {
    /// Texture format of the input
    #[arg(long, value_enum)]
    pub format: FormatArg,

    /// Compressed input (container or bare payload)
    #[arg(long)]
    pub input: PathBuf,

    /// Output image; arrays are written as `<stem>_<i>.<ext>`
    #[arg(long)]
    pub output: PathBuf,

    /// Image width (required for bare payloads)
    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    /// Image height (required for bare payloads)
    #[arg(long, requires = "width")]
    pub height: Option<u32>,

    /// ASTC block footprint as WxH
    #[arg(long, default_value = "4x4")]
    pub block: String,
}

/// Decode the input the way the arguments describe.
fn decode(args: &DecompressArgs, data: &[u8]) -> Result<PixelVolume, CliError> {
    let format = TextureFormat::from(args.format);
    let volume = match (args.width, args.height) {
        (Some(width), Some(height)) => {
            let footprint = if format.is_etc() {
                BlockFootprint::ETC
            } else {
                BlockFootprint::parse(&args.block)?
            };
            decompress(data, format, width, height, footprint)?
        }
        (None, None) => decompress_container(data, format)?,
        _ => {
            return Err(CliError::Args(
                "--width and --height must be given together".to_string(),
            ))
        }
    };
    Ok(volume)
}

/// Run the decompress command.
pub fn run(args: DecompressArgs) -> Result<(), CliError> {
    let data = read_file(&args.input)?;
    let volume = decode(&args, &data)?;

    println!(
        "Decoded {} ({}x{}, {} slice{})",
        args.input.display(),
        volume.width(),
        volume.height(),
        volume.depth(),
        if volume.depth() == 1 { "" } else { "s" }
    );
    write_volume(volume, &args.output)?;
    println!("Wrote {}", args.output.display());
    Ok(())
}
