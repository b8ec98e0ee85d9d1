use serde::{Deserialize, Serialize};

use crate::common::{ImagePos, TilePakError, TilePakResult};

/// block ids end up in `int16_t` map cells
pub const MAX_BLOCKS: usize = i16::MAX as usize + 1;

/// hardware limits of the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Platform {
	/// blocks per atlas row
	pub row_blocks: ImagePos,
	/// palette entries, transparency included
	pub max_colors: usize,
	/// side of one hardware tile in pixels
	pub hardware_tile: ImagePos,
	/// hardware tiles that fit into tile memory
	pub max_hardware_tiles: usize,
	pub block_sizes: Vec<ImagePos>,
}

impl Default for Platform {
	fn default() -> Self {
		Self {
			row_blocks: 32,
			max_colors: 256,
			hardware_tile: 8,
			max_hardware_tiles: 960,
			block_sizes: vec![8, 16, 32],
		}
	}
}

impl Platform {
	pub fn check_block_size(&self, block_size: ImagePos) -> TilePakResult<()> {
		if block_size == 0 || !self.block_sizes.contains(&block_size) {
			return Err(TilePakError::UnsupportedBlockSize(block_size, self.block_sizes.clone()));
		}
		Ok(())
	}
	/// how many unique blocks of `block_size` fit into tile memory, never
	/// more than [`MAX_BLOCKS`]
	pub fn block_budget(&self, block_size: ImagePos) -> usize {
		let factor = (block_size / self.hardware_tile.max(1)).max(1) as usize;
		(self.max_hardware_tiles / (factor * factor)).min(MAX_BLOCKS)
	}
}
