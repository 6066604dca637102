//! Block grid planning.
//!
//! Computes how many blocks cover a texel volume and the exact byte size of
//! the compressed payload. Each axis is rounded up independently, so partial
//! blocks at the right, bottom and back edges count as whole blocks.

use crate::format::{BlockFootprint, TextureFormat};

/// Block grid covering a texel volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGrid {
    pub blocks_x: usize,
    pub blocks_y: usize,
    pub blocks_z: usize,
    pub bytes_per_block: usize,
}

impl BlockGrid {
    /// Plan the grid for a `width × height × depth` volume.
    ///
    /// Block dimensions must be positive; callers validate the
    /// [`CodecConfig`](crate::CodecConfig) first.
    ///
    /// # Example
    ///
    /// ```
    /// use texture2dstudio::{BlockFootprint, BlockGrid};
    ///
    /// let grid = BlockGrid::plan(10, 7, 1, BlockFootprint::new_2d(4, 4), 8);
    /// assert_eq!((grid.blocks_x, grid.blocks_y, grid.blocks_z), (3, 2, 1));
    /// assert_eq!(grid.output_byte_size(), 48);
    /// ```
    pub fn plan(
        width: u32,
        height: u32,
        depth: u32,
        footprint: BlockFootprint,
        bytes_per_block: usize,
    ) -> Self {
        debug_assert!(
            footprint.x > 0 && footprint.y > 0 && footprint.z > 0,
            "block dimensions must be positive"
        );

        Self {
            blocks_x: width.div_ceil(footprint.x) as usize,
            blocks_y: height.div_ceil(footprint.y) as usize,
            blocks_z: depth.div_ceil(footprint.z) as usize,
            bytes_per_block,
        }
    }

    /// Plan the grid using the format's bytes per block.
    pub fn for_format(
        width: u32,
        height: u32,
        depth: u32,
        format: TextureFormat,
        footprint: BlockFootprint,
    ) -> Self {
        Self::plan(width, height, depth, footprint, format.bytes_per_block())
    }

    /// Total number of blocks.
    pub fn total_blocks(&self) -> usize {
        self.blocks_x * self.blocks_y * self.blocks_z
    }

    /// Bytes of one row of blocks.
    pub fn row_byte_size(&self) -> usize {
        self.blocks_x * self.bytes_per_block
    }

    /// Bytes of one z layer of blocks.
    pub fn layer_byte_size(&self) -> usize {
        self.blocks_x * self.blocks_y * self.bytes_per_block
    }

    /// Exact size of the compressed payload.
    pub fn output_byte_size(&self) -> usize {
        self.total_blocks() * self.bytes_per_block
    }

    /// Payload size, or `None` if it does not fit in `usize`.
    ///
    /// Use this for dimensions read from untrusted headers.
    pub fn checked_output_byte_size(&self) -> Option<usize> {
        self.blocks_x
            .checked_mul(self.blocks_y)?
            .checked_mul(self.blocks_z)?
            .checked_mul(self.bytes_per_block)
    }
}
