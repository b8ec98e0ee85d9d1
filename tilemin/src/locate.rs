use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{read_text, TileMinError, TileMinResult};

/// per map descriptor in the ressources folder
#[derive(Debug, Deserialize)]
struct Descriptor {
	tmx: Option<PathBuf>,
}

/// `reference` as written inside `file`, resolved next to it
pub fn resolve(file: &Path, reference: &Path) -> PathBuf {
	match file.parent() {
		Some(parent) => parent.join(reference),
		None => reference.to_path_buf(),
	}
}

/// the map a run starts from, and the descriptor that named it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapLocation {
	pub descriptor: Option<PathBuf>,
	pub map: PathBuf,
}

pub fn locate(config: &Config) -> TileMinResult<MapLocation> {
	if let Some(map_file) = &config.map_file {
		let map = config.ressources_dir().join(map_file);
		debug!("map {} given directly", map.display());
		return Ok(MapLocation { descriptor: None, map });
	}
	let path = config.descriptor_path();
	let descriptor: Descriptor = serde_json::from_str(&read_text(&path)?).map_err(|source| TileMinError::Json {
		path: path.clone(),
		source,
	})?;
	let tmx = descriptor.tmx.ok_or_else(|| TileMinError::MissingKey {
		path: path.clone(),
		key: "tmx",
	})?;
	let map = resolve(&path, &tmx);
	debug!("{} names map {}", path.display(), map.display());
	Ok(MapLocation {
		descriptor: Some(path),
		map,
	})
}
