//! Texture2DStudio - ETC1/ETC2/ASTC texture compression
//!
//! This library compresses images into GPU block-compressed textures and
//! decodes them back to RGBA. It assembles single images or slice arrays into
//! volumes, generates mip chains, runs block encoders on a bounded worker
//! pool, and wraps each level in a 16-byte container header.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌────────────────────┐   ┌─────────────────────┐
//! │ ImageAssembler   │──▶│ Compressor         │──▶│ CompressedContainer │
//! │ (volume)         │   │ (compress)         │   │ (container)         │
//! └──────────────────┘   └─────────┬──────────┘   └──────────┬──────────┘
//!                                  │                         │
//!                                  ▼                         ▼
//!                        ┌────────────────────┐   ┌─────────────────────┐
//!                        │ CodecContextManager│   │ decompress          │
//!                        │ BlockCodec (codec) │◀──│ (decompress)        │
//!                        └────────────────────┘   └─────────────────────┘
//! ```
//!
//! The [`BlockGrid`] planner is shared by both directions.
//!
//! # Example
//!
//! ```
//! use texture2dstudio::{
//!     compress, decompress, BlockFootprint, CodecConfig, PixelVolume, TextureFormat,
//! };
//!
//! let volume = PixelVolume::from_rgba8(8, 8, vec![128; 8 * 8 * 4]).unwrap();
//! let config = CodecConfig::new(TextureFormat::Astc)
//!     .with_footprint(BlockFootprint::new_2d(4, 4));
//!
//! let containers = compress(&volume, &config).unwrap();
//! let bytes = containers[0].to_bytes();
//!
//! let decoded =
//!     decompress(&bytes, TextureFormat::Astc, 8, 8, BlockFootprint::new_2d(4, 4)).unwrap();
//! assert_eq!(decoded.width(), 8);
//! ```

pub mod api;
pub mod codec;
pub mod compress;
pub mod config;
pub mod container;
pub mod decompress;
pub mod error;
pub mod format;
pub mod grid;
pub mod volume;

pub use codec::{BlockCodec, CodecContext, CodecContextManager};
pub use compress::{compress, Compressor};
pub use config::{Channel, CodecConfig, Swizzle};
pub use container::{encode_stream, CompressedContainer, ContainerHeader, HEADER_SIZE};
pub use decompress::{decompress, decompress_container, decompress_to_file, write_volume};
pub use error::{CodecError, CodecResult};
pub use format::{BlockFootprint, TextureFormat};
pub use grid::BlockGrid;
pub use volume::{ImageAssembler, PixelVolume};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
