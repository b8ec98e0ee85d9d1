//! block deduplication and atlas compositing for tile based maps

mod block;
pub mod build;
mod common;
mod palette;
mod platform;

pub use block::{Block, Orientation};
pub use build::atlas::{build_atlas, AtlasLayout};
pub use build::dedup::{BlockMatch, Deduper};
pub use build::{ImageSource, SourceGrid};
pub use common::{
	CompositeImage, ErrorKind, ImagePos, ImageRect, ImageSize, Pixel, TilePakError, TilePakResult, CLEAR,
};
pub use palette::{IndexedImage, Palette, NEAR_TRANSPARENT, TRANSPARENT};
pub use platform::{Platform, MAX_BLOCKS};
