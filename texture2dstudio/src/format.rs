//! Texture format descriptors.
//!
//! Every block-compressed format handled by the crate is described by a
//! [`FormatDescriptor`]: how many bytes one block occupies, whether the block
//! footprint is fixed or chosen by the caller, and the magic constant that
//! identifies it in a container header. The orchestrators branch on the
//! descriptor instead of carrying one code path per format.

use std::fmt;

use crate::error::{CodecError, CodecResult};

/// Magic constant of `.astc` containers.
pub const ASTC_MAGIC: u32 = 0x5CA1_AB13;

/// Magic constant of ETC1 containers.
pub const ETC1_MAGIC: u32 = 0x5CA1_E7C1;

/// Magic constant of ETC2 RGB containers.
pub const ETC2_RGB_MAGIC: u32 = 0x5CA1_E7C2;

/// Magic constant of ETC2 punch-through alpha containers.
pub const ETC2_A1_MAGIC: u32 = 0x5CA1_E7C3;

/// Magic constant of ETC2 RGBA8 (EAC alpha) containers.
pub const ETC2_RGBA_MAGIC: u32 = 0x5CA1_E7C4;

/// Legal ASTC 2D block footprints.
pub const ASTC_2D_FOOTPRINTS: [(u32, u32); 14] = [
    (4, 4),
    (5, 4),
    (5, 5),
    (6, 5),
    (6, 6),
    (8, 5),
    (8, 6),
    (8, 8),
    (10, 5),
    (10, 6),
    (10, 8),
    (10, 10),
    (12, 10),
    (12, 12),
];

/// Block-compressed texture formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// ETC1 RGB, 8 bytes per 4×4 block.
    Etc1,
    /// ETC2 RGB, 8 bytes per 4×4 block.
    Etc2Rgb,
    /// ETC2 RGBA8 (ETC2 color + EAC alpha), 16 bytes per 4×4 block.
    Etc2Rgba,
    /// ETC2 RGB with punch-through (1-bit) alpha, 8 bytes per 4×4 block.
    Etc2A1,
    /// ETC2 with 8-bit EAC alpha; same bitstream as [`TextureFormat::Etc2Rgba`].
    Etc2A8,
    /// ASTC LDR, 16 bytes per block for every footprint.
    Astc,
}

/// How a format's block footprint is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FootprintRule {
    /// The footprint is fixed by the format.
    Fixed(BlockFootprint),
    /// The caller chooses the footprint.
    Configurable,
}

/// Static properties of a texture format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Bytes occupied by one compressed block.
    pub bytes_per_block: usize,
    /// Fixed or caller-chosen footprint.
    pub footprint: FootprintRule,
    /// Container magic constant.
    pub magic: u32,
}

impl TextureFormat {
    /// All formats, in declaration order.
    pub const ALL: [TextureFormat; 6] = [
        TextureFormat::Etc1,
        TextureFormat::Etc2Rgb,
        TextureFormat::Etc2Rgba,
        TextureFormat::Etc2A1,
        TextureFormat::Etc2A8,
        TextureFormat::Astc,
    ];

    /// Get the descriptor for this format.
    pub fn descriptor(self) -> FormatDescriptor {
        let etc = FootprintRule::Fixed(BlockFootprint::ETC);
        match self {
            TextureFormat::Etc1 => FormatDescriptor {
                bytes_per_block: 8,
                footprint: etc,
                magic: ETC1_MAGIC,
            },
            TextureFormat::Etc2Rgb => FormatDescriptor {
                bytes_per_block: 8,
                footprint: etc,
                magic: ETC2_RGB_MAGIC,
            },
            TextureFormat::Etc2A1 => FormatDescriptor {
                bytes_per_block: 8,
                footprint: etc,
                magic: ETC2_A1_MAGIC,
            },
            TextureFormat::Etc2Rgba | TextureFormat::Etc2A8 => FormatDescriptor {
                bytes_per_block: 16,
                footprint: etc,
                magic: ETC2_RGBA_MAGIC,
            },
            TextureFormat::Astc => FormatDescriptor {
                bytes_per_block: 16,
                footprint: FootprintRule::Configurable,
                magic: ASTC_MAGIC,
            },
        }
    }

    /// Bytes occupied by one compressed block.
    pub fn bytes_per_block(self) -> usize {
        self.descriptor().bytes_per_block
    }

    /// Container magic constant.
    pub fn magic(self) -> u32 {
        self.descriptor().magic
    }

    /// Returns true for the ETC1/ETC2 family.
    pub fn is_etc(self) -> bool {
        !matches!(self, TextureFormat::Astc)
    }

    /// Resolve the footprint to use for this format.
    ///
    /// Fixed-footprint formats ignore `requested`; configurable formats use it.
    pub fn resolve_footprint(self, requested: BlockFootprint) -> BlockFootprint {
        match self.descriptor().footprint {
            FootprintRule::Fixed(footprint) => footprint,
            FootprintRule::Configurable => requested,
        }
    }

    /// Identify a format from a container magic constant.
    ///
    /// ETC2 RGBA8 and ETC2 A8 share one magic; this returns `Etc2Rgba`.
    pub fn from_magic(magic: u32) -> Option<TextureFormat> {
        match magic {
            ASTC_MAGIC => Some(TextureFormat::Astc),
            ETC1_MAGIC => Some(TextureFormat::Etc1),
            ETC2_RGB_MAGIC => Some(TextureFormat::Etc2Rgb),
            ETC2_A1_MAGIC => Some(TextureFormat::Etc2A1),
            ETC2_RGBA_MAGIC => Some(TextureFormat::Etc2Rgba),
            _ => None,
        }
    }

    /// Short lowercase name, also used by the command line.
    pub fn name(self) -> &'static str {
        match self {
            TextureFormat::Etc1 => "etc1",
            TextureFormat::Etc2Rgb => "etc2-rgb",
            TextureFormat::Etc2Rgba => "etc2-rgba",
            TextureFormat::Etc2A1 => "etc2-a1",
            TextureFormat::Etc2A8 => "etc2-a8",
            TextureFormat::Astc => "astc",
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Texel dimensions of one compression block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockFootprint {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl BlockFootprint {
    /// The fixed ETC footprint.
    pub const ETC: BlockFootprint = BlockFootprint { x: 4, y: 4, z: 1 };

    /// Create a footprint.
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Create a 2D footprint (`z = 1`).
    pub const fn new_2d(x: u32, y: u32) -> Self {
        Self { x, y, z: 1 }
    }

    /// Number of texels in one block.
    pub fn texels(&self) -> u32 {
        self.x * self.y * self.z
    }

    /// Returns true if this is a legal ASTC 2D footprint.
    pub fn is_astc_2d(&self) -> bool {
        self.z == 1 && ASTC_2D_FOOTPRINTS.contains(&(self.x, self.y))
    }

    /// Parse `WxH` or `WxHxD`.
    ///
    /// # Example
    ///
    /// ```
    /// use texture2dstudio::BlockFootprint;
    ///
    /// assert_eq!(BlockFootprint::parse("6x6").unwrap(), BlockFootprint::new(6, 6, 1));
    /// assert_eq!(BlockFootprint::parse("4x4x4").unwrap(), BlockFootprint::new(4, 4, 4));
    /// ```
    pub fn parse(s: &str) -> CodecResult<Self> {
        let parts: Vec<&str> = s.split(['x', 'X']).collect();
        let invalid = || CodecError::InvalidConfig(format!("invalid block size '{}'", s));
        let dims: Vec<u32> = parts
            .iter()
            .map(|p| p.trim().parse::<u32>().map_err(|_| invalid()))
            .collect::<CodecResult<_>>()?;

        match dims.as_slice() {
            [x, y] => Ok(Self::new_2d(*x, *y)),
            [x, y, z] => Ok(Self::new(*x, *y, *z)),
            _ => Err(invalid()),
        }
    }
}

impl Default for BlockFootprint {
    fn default() -> Self {
        Self::ETC
    }
}

impl fmt::Display for BlockFootprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}
