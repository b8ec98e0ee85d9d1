use std::path::PathBuf;

use log::debug;

use crate::block::Block;
use crate::common::{CompositeImage, ImagePos, ImageRect, TilePakError, TilePakResult};

pub mod atlas;
pub mod dedup;

#[derive(Debug)]
pub enum ImageSource {
	Path(PathBuf),
	Raw(CompositeImage),
}

impl ImageSource {
	/// decode into rgba, invisible pixels folded together
	pub fn load(&self) -> TilePakResult<CompositeImage> {
		let mut image: CompositeImage = match self {
			ImageSource::Path(v) => {
				debug!("loading {:?}", v);
				image::io::Reader::open(v)?.decode()?.to_rgba8().into()
			}
			ImageSource::Raw(v) => v.clone(),
		};
		image.normalize_transparency();
		Ok(image)
	}
}

/// rectangles of every `block_size` square, row major
fn block_rects(columns: ImagePos, rows: ImagePos, block_size: ImagePos) -> Vec<ImageRect> {
	(0..rows)
		.flat_map(|y| (0..columns).map(move |x| (x * block_size, y * block_size, block_size, block_size)))
		.collect()
}

/// an image cut into blocks
#[derive(Debug, Clone)]
pub struct SourceGrid {
	block_size: ImagePos,
	columns: ImagePos,
	rows: ImagePos,
	blocks: Vec<Block>,
}

impl SourceGrid {
	pub fn extract(image: &CompositeImage, block_size: ImagePos) -> TilePakResult<Self> {
		let (width, height) = image.size;
		if block_size == 0 {
			return Err(TilePakError::UnsupportedBlockSize(block_size, vec![]));
		}
		if width % block_size != 0 || height % block_size != 0 {
			return Err(TilePakError::InvalidDimensions(width, height, block_size));
		}
		let (columns, rows) = (width / block_size, height / block_size);
		let blocks = block_rects(columns, rows, block_size)
			.into_iter()
			.map(|rect| {
				let mut tile = CompositeImage::new((rect.2, rect.3));
				tile.copy_from(image, (0, 0), rect);
				Block::new(block_size, tile.pixels().collect())
			})
			.collect();
		debug!("cut {}×{} image into {}×{} blocks", width, height, columns, rows);
		Ok(Self {
			block_size,
			columns,
			rows,
			blocks,
		})
	}
	pub fn block_size(&self) -> ImagePos {
		self.block_size
	}
	pub fn columns(&self) -> ImagePos {
		self.columns
	}
	pub fn rows(&self) -> ImagePos {
		self.rows
	}
	pub fn len(&self) -> usize {
		self.blocks.len()
	}
	pub fn is_empty(&self) -> bool {
		self.blocks.is_empty()
	}
	/// block by row major index, the editor's local tile id
	pub fn block(&self, index: usize) -> Option<&Block> {
		self.blocks.get(index)
	}
	pub fn get(&self, row: ImagePos, column: ImagePos) -> Option<&Block> {
		if row >= self.rows || column >= self.columns {
			return None;
		}
		self.block((row * self.columns + column) as usize)
	}
	pub fn blocks(&self) -> &[Block] {
		&self.blocks
	}
}
