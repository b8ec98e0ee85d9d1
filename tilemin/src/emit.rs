use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use tilepak::{BlockMatch, Palette, Platform};

use crate::config::Config;
use crate::error::{TileMinError, TileMinResult};
use crate::tiled::TiledMap;

/// one emitted cell: atlas block and how to mirror it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellIndex {
	pub tile: i16,
	pub flags: u8,
}

impl CellIndex {
	pub const EMPTY: CellIndex = CellIndex { tile: -1, flags: 0 };

	pub fn is_empty(&self) -> bool {
		self.tile < 0
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerIndex {
	/// usable as part of a c++ symbol
	pub name: String,
	pub cells: Vec<CellIndex>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapIndex {
	pub width: u32,
	pub height: u32,
	pub layers: Vec<LayerIndex>,
}

fn symbol(name: &str) -> String {
	let mut out: String = name
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
		.collect();
	if out.is_empty() {
		out.push('_');
	}
	out
}

impl MapIndex {
	/// `matches` is indexed by source block, `None` for blocks never matched
	pub fn build(map: &TiledMap, matches: &[Option<BlockMatch>], path: &Path) -> TileMinResult<Self> {
		let first_gid = map.tileset.first_gid();
		let mut taken = HashSet::new();
		let mut layers = Vec::with_capacity(map.layers.len());
		for layer in &map.layers {
			let mut name = symbol(&layer.name);
			if !taken.insert(name.clone()) {
				name = format!("{}_{}", name, layers.len());
				taken.insert(name.clone());
			}
			let cells = layer
				.cells
				.iter()
				.enumerate()
				.map(|(i, cell)| {
					if cell.is_empty() {
						return Ok(CellIndex::EMPTY);
					}
					let found = cell.local_id(first_gid).and_then(|id| matches.get(id).copied().flatten());
					let Some(found) = found else {
						return Err(TileMinError::format(
							path,
							format!(
								"layer `{}` cell ({}, {}) uses tile {} which is not in the tileset",
								layer.name,
								i as u32 % map.width,
								i as u32 / map.width,
								cell.gid
							),
						));
					};
					let tile = i16::try_from(found.canonical_id).map_err(|_| {
						TileMinError::format(path, format!("tile id {} does not fit a map cell", found.canonical_id))
					})?;
					Ok(CellIndex {
						tile,
						flags: found.orientation.then(cell.orientation).flags(),
					})
				})
				.collect::<TileMinResult<Vec<_>>>()?;
			layers.push(LayerIndex { name, cells });
		}
		Ok(Self {
			width: map.width,
			height: map.height,
			layers,
		})
	}
}

pub fn header(config: &Config, index: &MapIndex, tile_count: usize, tile_size: u32) -> String {
	let guard = config.include_guard();
	let mut out = String::new();
	out.push_str(&format!("/*\n * {}\n *\n", config.header_line));
	out.push_str(&format!(" * Copyright (c) {} {}\n *\n", config.author, config.mail));
	out.push_str(&format!(" * Map data for {}, generated by tilemin.\n */\n\n", config.project));
	out.push_str(&format!("#ifndef {0}\n#define {0}\n\n", guard));
	out.push_str("#include <cstdint>\n\n");
	out.push_str(&format!("namespace {} {{\n", config.namespace_path()));
	out.push_str("    struct cell_t {\n        int16_t tile;\n        uint8_t flags;\n    };\n\n");
	out.push_str("    constexpr uint8_t h_flip = 1;\n    constexpr uint8_t v_flip = 2;\n\n");
	out.push_str(&format!("    constexpr int width = {};\n", index.width));
	out.push_str(&format!("    constexpr int height = {};\n", index.height));
	out.push_str(&format!("    constexpr int tile_count = {};\n", tile_count));
	out.push_str(&format!("    constexpr int tile_size = {};\n", tile_size));
	for layer in &index.layers {
		out.push_str(&format!("\n    constexpr cell_t layer_{}[width * height] = {{\n", layer.name));
		for row in layer.cells.chunks(index.width.max(1) as usize) {
			let row: Vec<_> = row.iter().map(|c| format!("{{{}, {}}}", c.tile, c.flags)).collect();
			out.push_str(&format!("        {},\n", row.join(", ")));
		}
		out.push_str("    };\n");
	}
	out.push_str(&format!("}}\n\n#endif // {}\n", guard));
	out
}

fn bpp_mode(palette: &Palette) -> String {
	format!("bpp_{}", palette.bpp())
}

/// import settings next to the atlas bitmap
#[derive(Debug, Serialize)]
pub struct TilesImport {
	#[serde(rename = "type")]
	pub kind: &'static str,
	pub bpp_mode: String,
}

impl TilesImport {
	pub fn new(palette: &Palette) -> Self {
		Self {
			kind: "regular_bg_tiles",
			bpp_mode: bpp_mode(palette),
		}
	}
}

/// import settings next to the palette bitmap
#[derive(Debug, Serialize)]
pub struct PaletteImport {
	#[serde(rename = "type")]
	pub kind: &'static str,
	pub bpp_mode: String,
	pub colors_count: String,
}

impl PaletteImport {
	pub fn new(palette: &Palette) -> Self {
		Self {
			kind: "bg_palette",
			bpp_mode: bpp_mode(palette),
			colors_count: palette.len().to_string(),
		}
	}
}

/// run settings that shape the outputs, stale outputs are detected by them
#[derive(Debug, Serialize)]
pub struct Stamp<'a> {
	pub map: &'a Path,
	pub namespace: Option<&'a str>,
	pub used_only: bool,
	pub save_temp_files: bool,
	pub platform: &'a Platform,
	pub author: &'a str,
	pub mail: &'a str,
	pub header_line: &'a str,
}

impl<'a> Stamp<'a> {
	pub fn new(config: &'a Config, map: &'a Path) -> Self {
		Self {
			map,
			namespace: config.namespace.as_deref(),
			used_only: config.used_only,
			save_temp_files: config.save_temp_files,
			platform: &config.platform,
			author: &config.author,
			mail: &config.mail,
			header_line: &config.header_line,
		}
	}
	pub fn to_vec(&self) -> TileMinResult<Vec<u8>> {
		Ok(serde_json::to_vec_pretty(self)?)
	}
}

/// what every source block matched, kept for debugging
#[derive(Debug, Serialize)]
pub struct MatchTable<'a> {
	pub block_size: u32,
	pub columns: u32,
	pub rows: u32,
	pub unique: usize,
	pub blocks: &'a [Option<BlockMatch>],
}
