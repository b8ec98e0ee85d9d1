use std::fmt;
use thiserror::Error;

pub type ImagePos = u32;
pub type ImageSize = (ImagePos, ImagePos);
pub type ImageRect = (ImagePos, ImagePos, ImagePos, ImagePos);

pub type Pixel = [u8; 4];

/// fully transparent, what every alpha 0 pixel gets folded into
pub const CLEAR: Pixel = [0, 0, 0, 0];

/// broad failure category of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	Config,
	Format,
	Capacity,
	Io,
}

#[derive(Error, Debug)]
pub enum TilePakError {
	#[error("image size {0}×{1} is not a multiple of block size {2}")]
	InvalidDimensions(ImagePos, ImagePos, ImagePos),
	#[error("block size {0} is not supported by the platform (supported: {1:?})")]
	UnsupportedBlockSize(ImagePos, Vec<ImagePos>),
	#[error("too many unique colors: {0} (platform limit is {1})")]
	TooManyColors(usize, usize),
	#[error("too many unique blocks: {0} (platform limit is {1})")]
	TooManyBlocks(usize, usize),
	#[error("io error: {0}")]
	IoError(#[from] std::io::Error),
	#[error("image error: {0}")]
	ImageError(#[from] image::ImageError),
}

impl TilePakError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::InvalidDimensions(..) | Self::UnsupportedBlockSize(..) | Self::ImageError(_) => {
				ErrorKind::Format
			}
			Self::TooManyColors(..) | Self::TooManyBlocks(..) => ErrorKind::Capacity,
			Self::IoError(err) if err.kind() == std::io::ErrorKind::NotFound => ErrorKind::Config,
			Self::IoError(_) => ErrorKind::Io,
		}
	}
}

pub type TilePakResult<T> = Result<T, TilePakError>;

/// composite image, rgba8
#[derive(Clone, PartialEq, Eq)]
pub struct CompositeImage {
	pub size: ImageSize,
	pub data: Vec<u8>,
}

impl fmt::Debug for CompositeImage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CompositeImage")
			.field("data", &self.data.len())
			.field("size", &self.size)
			.finish()
	}
}

impl CompositeImage {
	/// new fully transparent one with size
	pub fn new(size: ImageSize) -> Self {
		let area = size.0 as usize * size.1 as usize;
		Self {
			data: vec![0u8; area * 4],
			size,
		}
	}
	pub fn from_fn(size: ImageSize, mut f: impl FnMut(ImagePos, ImagePos) -> Pixel) -> Self {
		let mut image = Self::new(size);
		for y in 0..size.1 {
			for x in 0..size.0 {
				image.put_pixel(x, y, f(x, y));
			}
		}
		image
	}
	fn offset(&self, x: ImagePos, y: ImagePos) -> usize {
		(y as usize * self.size.0 as usize + x as usize) * 4
	}
	pub fn pixel(&self, x: ImagePos, y: ImagePos) -> Pixel {
		let i = self.offset(x, y);
		[self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
	}
	pub fn put_pixel(&mut self, x: ImagePos, y: ImagePos, pixel: Pixel) {
		let i = self.offset(x, y);
		self.data[i..i + 4].copy_from_slice(&pixel);
	}
	pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
		self.data.chunks_exact(4).map(|v| [v[0], v[1], v[2], v[3]])
	}
	/// fold every invisible pixel into [`CLEAR`]
	pub fn normalize_transparency(&mut self) {
		for px in self.data.chunks_exact_mut(4) {
			if px[3] == 0 {
				px.copy_from_slice(&CLEAR);
			}
		}
	}
	/// copy a rectangle of `other` to `self_offset`
	pub fn copy_from(
		&mut self,
		other: &CompositeImage,
		self_offset: ImageSize,
		other_uv: ImageRect,
	) {
		// bounds checking
		if other_uv.0 + other_uv.2 > other.size.0
			|| other_uv.1 + other_uv.3 > other.size.1
			|| self_offset.0 + other_uv.2 > self.size.0
			|| self_offset.1 + other_uv.3 > self.size.1
		{
			panic!("out of bounds copy");
		}
		let step = other_uv.2 as usize * 4;
		for y in 0..other_uv.3 {
			let s_start = other.offset(other_uv.0, y + other_uv.1);
			let d_start = self.offset(self_offset.0, y + self_offset.1);
			self.data[d_start..d_start + step]
				.copy_from_slice(&other.data[s_start..s_start + step]);
		}
	}
}

impl From<image::RgbaImage> for CompositeImage {
	fn from(image: image::RgbaImage) -> Self {
		let size = (image.width(), image.height());
		Self {
			size,
			data: image.into_raw(),
		}
	}
}
