use std::collections::HashMap;

use image::codecs::bmp::BmpEncoder;
use image::ColorType;
use log::debug;

use crate::common::{CompositeImage, ImagePos, ImageSize, TilePakError, TilePakResult};

/// what palette index 0 is written as
pub const TRANSPARENT: [u8; 3] = [255, 0, 255];
/// opaque pixels of the transparent color are nudged to this
pub const NEAR_TRANSPARENT: [u8; 3] = [255, 0, 254];

/// ordered distinct colors, index 0 is transparency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
	colors: Vec<[u8; 3]>,
}

/// image as palette indices, row major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
	pub size: ImageSize,
	pub indices: Vec<u8>,
}

fn encode_bmp(indices: &[u8], size: ImageSize, palette: &Palette) -> TilePakResult<Vec<u8>> {
	let mut out = Vec::new();
	BmpEncoder::new(&mut out).encode_with_palette(
		indices,
		size.0,
		size.1,
		ColorType::L8,
		Some(palette.colors.as_slice()),
	)?;
	Ok(out)
}

impl Palette {
	/// collect colors of `image` in first seen order and remap it
	pub fn extract(image: &CompositeImage, max_colors: usize) -> TilePakResult<(Palette, IndexedImage)> {
		let limit = max_colors.min(256);
		let mut colors = vec![TRANSPARENT];
		let mut lookup = HashMap::<[u8; 3], usize>::new();
		let mut indices = Vec::with_capacity(image.size.0 as usize * image.size.1 as usize);
		for [r, g, b, a] in image.pixels() {
			if a == 0 {
				indices.push(0);
				continue;
			}
			let rgb = if [r, g, b] == TRANSPARENT { NEAR_TRANSPARENT } else { [r, g, b] };
			let index = *lookup.entry(rgb).or_insert_with(|| {
				colors.push(rgb);
				colors.len() - 1
			});
			// past 255 only on the way to TooManyColors
			indices.push(index.min(255) as u8);
		}
		if colors.len() > limit {
			return Err(TilePakError::TooManyColors(colors.len(), limit));
		}
		debug!("{} palette entries", colors.len());
		Ok((Palette { colors }, IndexedImage { size: image.size, indices }))
	}
	pub fn colors(&self) -> &[[u8; 3]] {
		&self.colors
	}
	pub fn len(&self) -> usize {
		self.colors.len()
	}
	pub fn is_empty(&self) -> bool {
		self.colors.is_empty()
	}
	pub fn bpp(&self) -> u8 {
		if self.colors.len() <= 16 {
			4
		} else {
			8
		}
	}
	/// 8×8, 16×8 or 16×16 depending on color count
	pub fn swatch_size(&self) -> ImageSize {
		match self.colors.len() {
			0..=64 => (8, 8),
			65..=128 => (16, 8),
			_ => (16, 16),
		}
	}
	/// swatch bitmap, pixel i shows color i
	pub fn to_bmp(&self) -> TilePakResult<Vec<u8>> {
		let size = self.swatch_size();
		let area = (size.0 * size.1) as usize;
		let indices = (0..area)
			.map(|i| if i < self.colors.len() { i as u8 } else { 0 })
			.collect::<Vec<_>>();
		encode_bmp(&indices, size, self)
	}
}

impl IndexedImage {
	pub fn index(&self, x: ImagePos, y: ImagePos) -> u8 {
		self.indices[(y * self.size.0 + x) as usize]
	}
	pub fn to_bmp(&self, palette: &Palette) -> TilePakResult<Vec<u8>> {
		encode_bmp(&self.indices, self.size, palette)
	}
}
