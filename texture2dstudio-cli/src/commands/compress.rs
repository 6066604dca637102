//! Compress command.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use texture2dstudio::config::DEFAULT_EFFORT;
use texture2dstudio::{BlockFootprint, CodecConfig, Compressor, TextureFormat};

use super::common::{format_size, FormatArg};
use crate::error::CliError;

/// Arguments for the compress command.
#[derive(Debug, Args)]
pub struct CompressArgs {
    /// Target texture format
    #[arg(long, value_enum)]
    pub format: FormatArg,

    /// Input image (for arrays: base name, slices are `<stem>_<i>.<ext>`)
    #[arg(long)]
    pub input: PathBuf,

    /// Output file
    #[arg(long)]
    pub output: PathBuf,

    /// Number of array slices to load
    #[arg(long, default_value_t = 1)]
    pub slices: u32,

    /// Effort level, 0 (fastest) to 100 (best)
    #[arg(long, default_value_t = DEFAULT_EFFORT)]
    pub effort: u32,

    /// Worker thread count
    #[arg(long, default_value_t = 1)]
    pub jobs: usize,

    /// ASTC block footprint as WxH or WxHxD
    #[arg(long, default_value = "4x4")]
    pub block: String,

    /// Generate a full mip chain
    #[arg(long)]
    pub mipmap: bool,

    /// Write bare payloads without the 16-byte headers
    #[arg(long)]
    pub no_header: bool,
}

impl CompressArgs {
    /// Build the codec configuration these arguments describe.
    pub fn to_config(&self) -> Result<CodecConfig, CliError> {
        let format = TextureFormat::from(self.format);
        let footprint = BlockFootprint::parse(&self.block)?;
        if format.is_etc() && footprint != BlockFootprint::ETC {
            return Err(CliError::Args(format!(
                "--block {} does not apply to {}",
                self.block, format
            )));
        }

        let config = CodecConfig::new(format)
            .with_footprint(footprint)
            .with_effort(self.effort)
            .with_mipmap(self.mipmap)
            .with_thread_count(self.jobs);
        config.validate()?;
        Ok(config)
    }
}

/// Run the compress command.
pub fn run(args: CompressArgs) -> Result<(), CliError> {
    let config = args.to_config()?;

    println!("Compressing {}", args.input.display());
    println!("  Format:  {}", config.format());
    if config.format() == TextureFormat::Astc {
        println!("  Block:   {}", config.footprint());
    }
    println!("  Effort:  {}", config.effort());
    println!("  Threads: {}", config.thread_count());
    if args.slices > 1 {
        println!("  Slices:  {}", args.slices);
    }

    Compressor::new().compress_file(
        &args.input,
        &args.output,
        &config,
        args.slices,
        !args.no_header,
    )?;

    let written = fs::metadata(&args.output)
        .map(|m| format_size(m.len() as usize))
        .unwrap_or_else(|_| "unknown size".to_string());
    println!("Wrote {} ({})", args.output.display(), written);
    Ok(())
}
