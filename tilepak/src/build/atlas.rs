use log::debug;

use crate::block::Block;
use crate::common::{CompositeImage, ImagePos, ImageSize, TilePakError, TilePakResult};
use crate::platform::Platform;

/// grid the unique blocks get laid out on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
	pub block_size: ImagePos,
	pub columns: ImagePos,
	pub rows: ImagePos,
}

impl AtlasLayout {
	/// one platform row wide, as many rows as needed (at least one)
	pub fn new(count: usize, block_size: ImagePos, platform: &Platform) -> TilePakResult<Self> {
		let budget = platform.block_budget(block_size);
		if count > budget {
			return Err(TilePakError::TooManyBlocks(count, budget));
		}
		let columns = platform.row_blocks.max(1);
		let rows = (count as ImagePos).div_ceil(columns).max(1);
		Ok(Self {
			block_size,
			columns,
			rows,
		})
	}
	/// size in pixels
	pub fn size(&self) -> ImageSize {
		(self.columns * self.block_size, self.rows * self.block_size)
	}
	pub fn capacity(&self) -> usize {
		self.columns as usize * self.rows as usize
	}
	/// pixel position of block `id`
	pub fn position(&self, id: usize) -> ImageSize {
		let id = id as ImagePos;
		((id % self.columns) * self.block_size, (id / self.columns) * self.block_size)
	}
}

/// paste `blocks` in order, unused slots stay transparent
pub fn build_atlas(blocks: &[Block], layout: &AtlasLayout) -> CompositeImage {
	let mut atlas = CompositeImage::new(layout.size());
	for (id, block) in blocks.iter().enumerate() {
		let (x0, y0) = layout.position(id);
		for (i, &pixel) in block.pixels().iter().enumerate() {
			let i = i as ImagePos;
			atlas.put_pixel(x0 + i % block.side(), y0 + i / block.side(), pixel);
		}
	}
	debug!(
		"atlas {}×{} px, {} of {} slots used",
		atlas.size.0,
		atlas.size.1,
		blocks.len(),
		layout.capacity()
	);
	atlas
}
