use std::fmt;

use serde::Serialize;

use crate::common::{ImagePos, Pixel};

/// mirror state relating a block to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Orientation {
	Identity,
	HFlip,
	VFlip,
	Both,
}

impl Orientation {
	/// match order, first hit wins
	pub const ALL: [Orientation; 4] = [Self::Identity, Self::HFlip, Self::VFlip, Self::Both];

	pub fn from_flips(h_flip: bool, v_flip: bool) -> Self {
		match (h_flip, v_flip) {
			(false, false) => Self::Identity,
			(true, false) => Self::HFlip,
			(false, true) => Self::VFlip,
			(true, true) => Self::Both,
		}
	}
	pub fn h_flip(self) -> bool {
		matches!(self, Self::HFlip | Self::Both)
	}
	pub fn v_flip(self) -> bool {
		matches!(self, Self::VFlip | Self::Both)
	}
	/// bit 0 horizontal, bit 1 vertical
	pub fn flags(self) -> u8 {
		self.h_flip() as u8 | (self.v_flip() as u8) << 1
	}
	/// mirrors are involutions
	pub fn inverse(self) -> Self {
		self
	}
	/// apply `self`, then `other`
	pub fn then(self, other: Orientation) -> Self {
		Self::from_flips(self.h_flip() ^ other.h_flip(), self.v_flip() ^ other.v_flip())
	}
}

/// square block of pixels, row major
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Block {
	side: ImagePos,
	pixels: Vec<Pixel>,
}

impl fmt::Debug for Block {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!("Block({0}×{0})", self.side))
	}
}

impl Block {
	/// `pixels` must hold exactly `side * side` entries
	pub fn new(side: ImagePos, pixels: Vec<Pixel>) -> Self {
		assert_eq!(pixels.len(), side as usize * side as usize, "block pixel count");
		Self { side, pixels }
	}
	pub fn filled(side: ImagePos, pixel: Pixel) -> Self {
		Self::new(side, vec![pixel; side as usize * side as usize])
	}
	pub fn side(&self) -> ImagePos {
		self.side
	}
	pub fn pixels(&self) -> &[Pixel] {
		&self.pixels
	}
	pub fn pixel(&self, x: ImagePos, y: ImagePos) -> Pixel {
		self.pixels[(y * self.side + x) as usize]
	}
	/// pixel at (x, y) of this block seen through `orientation`
	fn oriented_pixel(&self, x: ImagePos, y: ImagePos, orientation: Orientation) -> Pixel {
		let last = self.side - 1;
		let x = if orientation.h_flip() { last - x } else { x };
		let y = if orientation.v_flip() { last - y } else { y };
		self.pixel(x, y)
	}
	pub fn oriented(&self, orientation: Orientation) -> Block {
		if orientation == Orientation::Identity {
			return self.clone();
		}
		let mut pixels = Vec::with_capacity(self.pixels.len());
		for y in 0..self.side {
			for x in 0..self.side {
				pixels.push(self.oriented_pixel(x, y, orientation));
			}
		}
		Self { side: self.side, pixels }
	}
	/// does this block, seen through `orientation`, equal `other` exactly
	pub fn matches(&self, other: &Block, orientation: Orientation) -> bool {
		if self.side != other.side {
			return false;
		}
		(0..self.side).all(|y| {
			(0..self.side).all(|x| self.oriented_pixel(x, y, orientation) == other.pixel(x, y))
		})
	}
	/// smallest pixel sequence among all four orientations
	///
	/// two blocks share a key iff one is a mirror of the other
	pub fn canonical_key(&self) -> Vec<Pixel> {
		Orientation::ALL
			.into_iter()
			.map(|o| self.oriented(o).pixels)
			.min()
			.unwrap_or_default()
	}
}
