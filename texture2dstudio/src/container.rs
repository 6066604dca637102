//! Compressed texture container.
//!
//! A container is a fixed 16-byte header followed by the raw block payload:
//!
//! ```text
//! offset  size  field
//! 0       4     magic (u32, little-endian)
//! 4       1     block_x
//! 5       1     block_y
//! 6       1     block_z
//! 7       3     dim_x (24-bit little-endian, texels)
//! 10      3     dim_y
//! 13      3     dim_z
//! 16      ..    payload
//! ```
//!
//! There is no version field. The format is identified by the magic alone and
//! the block count is inferred from the dimensions and footprint.

use crate::error::{CodecError, CodecResult};
use crate::format::{BlockFootprint, TextureFormat};
use crate::grid::BlockGrid;

/// Size of the container header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Largest dimension a 24-bit header field can hold.
pub const MAX_DIMENSION: u32 = 0x00FF_FFFF;

/// Container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub magic: u32,
    pub footprint: BlockFootprint,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl ContainerHeader {
    /// Create a header for `format`.
    ///
    /// # Errors
    ///
    /// - `InvalidDimensions` if a dimension is zero or exceeds [`MAX_DIMENSION`]
    /// - `BadBlockSize` if a block dimension does not fit in one byte
    pub fn new(
        format: TextureFormat,
        footprint: BlockFootprint,
        width: u32,
        height: u32,
        depth: u32,
    ) -> CodecResult<Self> {
        for dim in [width, height, depth] {
            if dim == 0 || dim > MAX_DIMENSION {
                return Err(CodecError::InvalidDimensions {
                    width,
                    height,
                    depth,
                    reason: format!("each dimension must be in 1..={}", MAX_DIMENSION),
                });
            }
        }
        for b in [footprint.x, footprint.y, footprint.z] {
            if b == 0 || b > u8::MAX as u32 {
                return Err(CodecError::BadBlockSize {
                    x: footprint.x,
                    y: footprint.y,
                    z: footprint.z,
                    reason: "block dimensions must be in 1..=255".to_string(),
                });
            }
        }

        Ok(Self {
            magic: format.magic(),
            footprint,
            width,
            height,
            depth,
        })
    }

    /// Serialize to the 16-byte wire layout.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4] = self.footprint.x as u8;
        out[5] = self.footprint.y as u8;
        out[6] = self.footprint.z as u8;
        write_u24(&mut out[7..10], self.width);
        write_u24(&mut out[10..13], self.height);
        write_u24(&mut out[13..16], self.depth);
        out
    }

    /// Parse a header, requiring the magic of `format`.
    ///
    /// # Errors
    ///
    /// - `TruncatedHeader` if fewer than [`HEADER_SIZE`] bytes are available
    /// - `BadMagic` if the magic does not belong to `format`
    pub fn parse(bytes: &[u8], format: TextureFormat) -> CodecResult<Self> {
        let header = Self::parse_any(bytes)?;
        if header.magic != format.magic() {
            return Err(CodecError::BadMagic {
                expected: format.magic(),
                found: header.magic,
            });
        }
        Ok(header)
    }

    /// Parse a header without checking the magic.
    pub fn parse_any(bytes: &[u8]) -> CodecResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(CodecError::TruncatedHeader {
                len: bytes.len(),
                required: HEADER_SIZE,
            });
        }

        Ok(Self {
            magic: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            footprint: BlockFootprint::new(bytes[4] as u32, bytes[5] as u32, bytes[6] as u32),
            width: read_u24(&bytes[7..10]),
            height: read_u24(&bytes[10..13]),
            depth: read_u24(&bytes[13..16]),
        })
    }

    /// Identify the format of a container from its magic.
    pub fn detect_format(bytes: &[u8]) -> CodecResult<TextureFormat> {
        let header = Self::parse_any(bytes)?;
        TextureFormat::from_magic(header.magic).ok_or(CodecError::BadMagic {
            expected: TextureFormat::Astc.magic(),
            found: header.magic,
        })
    }

    /// Block grid implied by the header for `format`.
    ///
    /// Headers come from untrusted bytes, so the grid is checked before use.
    ///
    /// # Errors
    ///
    /// - `BadBlockSize` for a zero block dimension
    /// - `InvalidDimensions` for a zero texel dimension, or a payload size
    ///   that does not fit in `usize`
    pub fn grid(&self, format: TextureFormat) -> CodecResult<BlockGrid> {
        let fp = self.footprint;
        if fp.x == 0 || fp.y == 0 || fp.z == 0 {
            return Err(CodecError::BadBlockSize {
                x: fp.x,
                y: fp.y,
                z: fp.z,
                reason: "header declares a zero block dimension".to_string(),
            });
        }
        let invalid = |reason: &str| CodecError::InvalidDimensions {
            width: self.width,
            height: self.height,
            depth: self.depth,
            reason: reason.to_string(),
        };
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(invalid("header declares an empty texture"));
        }

        let grid = BlockGrid::for_format(self.width, self.height, self.depth, format, fp);
        if grid.checked_output_byte_size().is_none() {
            return Err(invalid("payload size overflows"));
        }
        Ok(grid)
    }
}

fn write_u24(out: &mut [u8], value: u32) {
    out[0] = (value & 0xFF) as u8;
    out[1] = ((value >> 8) & 0xFF) as u8;
    out[2] = ((value >> 16) & 0xFF) as u8;
}

fn read_u24(bytes: &[u8]) -> u32 {
    bytes[0] as u32 | (bytes[1] as u32) << 8 | (bytes[2] as u32) << 16
}

/// Header plus block payload of one compressed texture (or mip level).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedContainer {
    format: TextureFormat,
    header: ContainerHeader,
    payload: Vec<u8>,
}

impl CompressedContainer {
    /// Pair a header with its payload.
    ///
    /// # Errors
    ///
    /// `TruncatedOrCorrupt` if the payload length differs from the grid size.
    pub fn new(
        format: TextureFormat,
        header: ContainerHeader,
        payload: Vec<u8>,
    ) -> CodecResult<Self> {
        let expected = header.grid(format)?.output_byte_size();
        if payload.len() != expected {
            return Err(CodecError::TruncatedOrCorrupt {
                expected,
                actual: payload.len(),
            });
        }
        Ok(Self {
            format,
            header,
            payload,
        })
    }

    /// Parse a complete container (header and payload, nothing else).
    pub fn parse(bytes: &[u8], format: TextureFormat) -> CodecResult<Self> {
        let header = ContainerHeader::parse(bytes, format)?;
        Self::new(format, header, bytes[HEADER_SIZE..].to_vec())
    }

    /// Get the format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Get the header.
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Get the block payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the container, returning the payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Serialized size including the header.
    pub fn len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Always false: a container holds at least one block.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Serialize header and payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(&self.header.to_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Concatenate containers in order, with or without their headers.
pub fn encode_stream(containers: &[CompressedContainer], header: bool) -> Vec<u8> {
    let total: usize = containers
        .iter()
        .map(|c| {
            if header {
                c.len()
            } else {
                c.payload().len()
            }
        })
        .sum();

    let mut out = Vec::with_capacity(total);
    for container in containers {
        if header {
            out.extend_from_slice(&container.header().to_bytes());
        }
        out.extend_from_slice(container.payload());
    }
    out
}
