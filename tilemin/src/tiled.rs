//! the parts of Tiled's tmx and tsx formats a tile layer map needs
//!
//! only csv encoded, finite, orthogonal maps with exactly one tileset are
//! accepted. object layers, image layers and groups are skipped.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use tilepak::Orientation;
use xml_dom::level2::{Node, NodeType, RefNode};

use crate::error::{read_text, TileMinError, TileMinResult};

pub const FLIPPED_HORIZONTALLY: u32 = 0x8000_0000;
pub const FLIPPED_VERTICALLY: u32 = 0x4000_0000;
pub const FLIPPED_DIAGONALLY: u32 = 0x2000_0000;
/// hexagonal maps only
pub const ROTATED_HEXAGONAL: u32 = 0x1000_0000;
const GID_MASK: u32 = 0x0FFF_FFFF;

/// one cell of a tile layer, gid 0 is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapCell {
	pub gid: u32,
	pub orientation: Orientation,
}

impl MapCell {
	pub const EMPTY: MapCell = MapCell {
		gid: 0,
		orientation: Orientation::Identity,
	};

	/// split a raw csv value into gid and flip bits
	pub fn parse(raw: u32) -> Result<Self, String> {
		if raw & (FLIPPED_DIAGONALLY | ROTATED_HEXAGONAL) != 0 {
			return Err(format!("tile {:#010x} is rotated, only mirroring is supported", raw));
		}
		Ok(Self {
			gid: raw & GID_MASK,
			orientation: Orientation::from_flips(raw & FLIPPED_HORIZONTALLY != 0, raw & FLIPPED_VERTICALLY != 0),
		})
	}
	pub fn is_empty(&self) -> bool {
		self.gid == 0
	}
	/// index into the tileset image, row major
	pub fn local_id(&self, first_gid: u32) -> Option<usize> {
		if self.is_empty() {
			return None;
		}
		self.gid.checked_sub(first_gid).map(|v| v as usize)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayer {
	pub name: String,
	/// row major, `width * height` long
	pub cells: Vec<MapCell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tileset {
	pub tile_width: u32,
	pub tile_height: u32,
	pub columns: Option<u32>,
	pub tile_count: Option<u32>,
	/// as written in the file, relative to it
	pub image: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TilesetRef {
	/// a tsx file, relative to the map
	External { first_gid: u32, source: PathBuf },
	Embedded { first_gid: u32, tileset: Tileset },
}

impl TilesetRef {
	pub fn first_gid(&self) -> u32 {
		match self {
			Self::External { first_gid, .. } | Self::Embedded { first_gid, .. } => *first_gid,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiledMap {
	pub width: u32,
	pub height: u32,
	pub tile_width: u32,
	pub tile_height: u32,
	pub tileset: TilesetRef,
	pub layers: Vec<TileLayer>,
}

fn attribute(node: &RefNode, name: &str) -> Option<String> {
	for (key, value) in &node.attributes() {
		if key.local_name() == name {
			return value.first_child().and_then(|v| v.node_value());
		}
	}
	None
}

fn elements(node: &RefNode) -> impl Iterator<Item = RefNode> {
	node.child_nodes().into_iter().filter(|n| n.node_type() == NodeType::Element)
}

fn text(node: &RefNode) -> String {
	node.child_nodes()
		.into_iter()
		.filter(|n| n.node_type() == NodeType::Text)
		.filter_map(|n| n.node_value())
		.collect()
}

/// reads one document and reports errors against its path
struct Document<'a> {
	path: &'a Path,
}

impl<'a> Document<'a> {
	fn error(&self, reason: impl Into<String>) -> TileMinError {
		TileMinError::format(self.path, reason)
	}
	fn root(&self, source: &str, name: &str) -> TileMinResult<RefNode> {
		let dom = xml_dom::parser::read_xml(source).map_err(|err| self.error(format!("malformed xml: {}", err)))?;
		let root = elements(&dom).next().ok_or_else(|| self.error("empty document"))?;
		if root.local_name() != name {
			return Err(self.error(format!("expected <{}>, found <{}>", name, root.local_name())));
		}
		Ok(root)
	}
	fn number(&self, node: &RefNode, name: &str) -> TileMinResult<Option<u32>> {
		attribute(node, name)
			.map(|v| {
				v.trim().parse::<u32>().map_err(|_| {
					self.error(format!("<{}> attribute `{}` is not a number: {:?}", node.local_name(), name, v))
				})
			})
			.transpose()
	}
	fn required(&self, node: &RefNode, name: &str) -> TileMinResult<u32> {
		self.number(node, name)?
			.ok_or_else(|| self.error(format!("<{}> is missing `{}`", node.local_name(), name)))
	}
	fn tileset(&self, node: &RefNode) -> TileMinResult<Tileset> {
		for name in ["margin", "spacing"] {
			if self.number(node, name)?.unwrap_or(0) != 0 {
				return Err(self.error(format!("tileset {} is not supported", name)));
			}
		}
		let image = elements(node)
			.find(|n| n.local_name() == "image")
			.and_then(|n| attribute(&n, "source"))
			.ok_or_else(|| self.error("tileset has no <image source>"))?;
		Ok(Tileset {
			tile_width: self.required(node, "tilewidth")?,
			tile_height: self.required(node, "tileheight")?,
			columns: self.number(node, "columns")?,
			tile_count: self.number(node, "tilecount")?,
			image: PathBuf::from(image),
		})
	}
	fn tileset_ref(&self, node: &RefNode) -> TileMinResult<TilesetRef> {
		let first_gid = self.number(node, "firstgid")?.unwrap_or(1);
		Ok(match attribute(node, "source") {
			Some(source) => TilesetRef::External {
				first_gid,
				source: PathBuf::from(source),
			},
			None => TilesetRef::Embedded {
				first_gid,
				tileset: self.tileset(node)?,
			},
		})
	}
	fn layer(&self, node: &RefNode, index: usize, area: usize) -> TileMinResult<TileLayer> {
		let name = attribute(node, "name").unwrap_or_else(|| format!("layer{}", index));
		let data = elements(node)
			.find(|n| n.local_name() == "data")
			.ok_or_else(|| self.error(format!("layer `{}` has no <data>", name)))?;
		let encoding = attribute(&data, "encoding");
		if encoding.as_deref() != Some("csv") {
			return Err(self.error(format!(
				"layer `{}` is not csv encoded (encoding: {})",
				name,
				encoding.as_deref().unwrap_or("xml")
			)));
		}
		let cells = text(&data)
			.split(',')
			.map(str::trim)
			.filter(|v| !v.is_empty())
			.map(|v| {
				let raw = v
					.parse::<u32>()
					.map_err(|_| self.error(format!("layer `{}` has a bad cell {:?}", name, v)))?;
				MapCell::parse(raw).map_err(|reason| self.error(format!("layer `{}`: {}", name, reason)))
			})
			.collect::<TileMinResult<Vec<_>>>()?;
		if cells.len() != area {
			return Err(self.error(format!("layer `{}` has {} cells, expected {}", name, cells.len(), area)));
		}
		Ok(TileLayer { name, cells })
	}
	fn map(&self, source: &str) -> TileMinResult<TiledMap> {
		let root = self.root(source, "map")?;
		if attribute(&root, "infinite").as_deref() == Some("1") {
			return Err(self.error("infinite maps are not supported"));
		}
		if let Some(orientation) = attribute(&root, "orientation") {
			if orientation != "orthogonal" {
				return Err(self.error(format!("{} maps are not supported", orientation)));
			}
		}
		let width = self.required(&root, "width")?;
		let height = self.required(&root, "height")?;
		let area = width as usize * height as usize;
		let mut tilesets = vec![];
		let mut layers = vec![];
		for node in elements(&root) {
			match node.local_name().as_str() {
				"tileset" => tilesets.push(self.tileset_ref(&node)?),
				"layer" => layers.push(self.layer(&node, layers.len(), area)?),
				"group" => warn!("{}: group layers are skipped", self.path.display()),
				other => debug!("skipping <{}>", other),
			}
		}
		if tilesets.len() != 1 {
			return Err(self.error(format!("expected exactly one tileset, found {}", tilesets.len())));
		}
		if layers.is_empty() {
			return Err(self.error("map has no tile layers"));
		}
		Ok(TiledMap {
			width,
			height,
			tile_width: self.required(&root, "tilewidth")?,
			tile_height: self.required(&root, "tileheight")?,
			tileset: tilesets.remove(0),
			layers,
		})
	}
}

pub fn parse_map_str(source: &str, path: &Path) -> TileMinResult<TiledMap> {
	let map = Document { path }.map(source)?;
	debug!("{}: {}×{} cells, {} layers", path.display(), map.width, map.height, map.layers.len());
	Ok(map)
}

pub fn parse_map(path: &Path) -> TileMinResult<TiledMap> {
	parse_map_str(&read_text(path)?, path)
}

pub fn parse_tileset_str(source: &str, path: &Path) -> TileMinResult<Tileset> {
	let document = Document { path };
	let root = document.root(source, "tileset")?;
	document.tileset(&root)
}

pub fn parse_tileset(path: &Path) -> TileMinResult<Tileset> {
	parse_tileset_str(&read_text(path)?, path)
}
