use std::collections::HashMap;

use log::{debug, trace};
use serde::Serialize;

use super::SourceGrid;
use crate::block::{Block, Orientation};
use crate::common::Pixel;

/// where a source block ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlockMatch {
	pub canonical_id: usize,
	/// turns the source block into the canonical one, and back
	pub orientation: Orientation,
}

/// registry of unique blocks in discovery order
///
/// canonical blocks are never mirrors of each other, so at most one of them
/// can match an incoming block under any orientation. that makes a lookup by
/// [`Block::canonical_key`] give the same answer as scanning the registry in
/// order, without the quadratic cost.
#[derive(Debug, Default)]
pub struct Deduper {
	unique: Vec<Block>,
	index: HashMap<Vec<Pixel>, usize>,
}

impl Deduper {
	pub fn new() -> Self {
		Self::default()
	}
	/// match one block, registering it when nothing in the registry fits
	pub fn match_block(&mut self, block: &Block) -> BlockMatch {
		let key = block.canonical_key();
		if let Some(&canonical_id) = self.index.get(&key) {
			let canonical = &self.unique[canonical_id];
			if let Some(orientation) = Orientation::ALL.into_iter().find(|&o| block.matches(canonical, o)) {
				trace!("duplicate of {} ({:?})", canonical_id, orientation);
				return BlockMatch { canonical_id, orientation };
			}
		}
		let canonical_id = self.unique.len();
		trace!("unique {}", canonical_id);
		self.index.insert(key, canonical_id);
		self.unique.push(block.clone());
		BlockMatch {
			canonical_id,
			orientation: Orientation::Identity,
		}
	}
	/// one pass over the whole grid, in grid order
	pub fn match_grid(&mut self, grid: &SourceGrid) -> Vec<BlockMatch> {
		let matches = grid.blocks().iter().map(|block| self.match_block(block)).collect();
		debug!("{} blocks, {} unique", grid.len(), self.unique.len());
		matches
	}
	pub fn unique_blocks(&self) -> &[Block] {
		&self.unique
	}
	pub fn len(&self) -> usize {
		self.unique.len()
	}
	pub fn is_empty(&self) -> bool {
		self.unique.is_empty()
	}
	pub fn into_unique_blocks(self) -> Vec<Block> {
		self.unique
	}
}
