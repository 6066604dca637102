//! Inspect command: print the headers of a compressed texture file.

use std::path::PathBuf;

use clap::Args;
use texture2dstudio::{ContainerHeader, HEADER_SIZE};

use super::common::{format_size, read_file};
use crate::error::CliError;

/// Arguments for the inspect command.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Compressed texture file
    pub path: PathBuf,
}

/// One container found while walking a file.
#[derive(Debug, PartialEq, Eq)]
pub struct LevelInfo {
    pub offset: usize,
    pub header: ContainerHeader,
    pub payload_size: usize,
}

/// Walk every container in `bytes`, stopping at the first truncated level.
pub fn scan_levels(bytes: &[u8]) -> Result<(Vec<LevelInfo>, usize), CliError> {
    let format = ContainerHeader::detect_format(bytes)?;
    let mut levels = Vec::new();
    let mut offset = 0;

    while offset + HEADER_SIZE <= bytes.len() {
        let header = ContainerHeader::parse(&bytes[offset..], format)?;
        let payload_size = header.grid(format)?.output_byte_size();
        if payload_size > bytes.len() - offset - HEADER_SIZE {
            break;
        }
        levels.push(LevelInfo {
            offset,
            header,
            payload_size,
        });
        offset += HEADER_SIZE + payload_size;
    }

    Ok((levels, bytes.len() - offset))
}

/// Run the inspect command.
pub fn run(args: InspectArgs) -> Result<(), CliError> {
    let bytes = read_file(&args.path)?;
    let format = ContainerHeader::detect_format(&bytes)?;
    let (levels, trailing) = scan_levels(&bytes)?;

    println!("File:   {}", args.path.display());
    println!("Size:   {}", format_size(bytes.len()));
    println!("Format: {}", format);
    println!();

    for (i, level) in levels.iter().enumerate() {
        let h = &level.header;
        println!(
            "Level {:>2} @ {:>8}: {}x{}x{}  block {}  payload {}",
            i,
            level.offset,
            h.width,
            h.height,
            h.depth,
            h.footprint,
            format_size(level.payload_size)
        );
    }

    if trailing > 0 {
        println!();
        println!("Warning: {} trailing bytes do not form a complete level", trailing);
    }
    Ok(())
}
