use std::path::PathBuf;

use artifact::Builder;
use log::{debug, info, warn};
use tilepak::{
	build_atlas, AtlasLayout, Block, BlockMatch, CompositeImage, Deduper, ImageSource, IndexedImage, Palette,
	SourceGrid,
};

use crate::config::Config;
use crate::emit::{header, MapIndex, MatchTable, PaletteImport, Stamp, TilesImport};
use crate::error::{TileMinError, TileMinResult};
use crate::locate::{locate, resolve, MapLocation};
use crate::tiled::{parse_map, parse_tileset, TiledMap, Tileset, TilesetRef};

/// a parsed map and every file it was read from
#[derive(Debug, Clone)]
pub struct Project {
	pub location: MapLocation,
	pub map: TiledMap,
	pub tileset: Tileset,
	/// `None` when embedded in the map
	pub tileset_path: Option<PathBuf>,
	pub image_path: PathBuf,
}

impl Project {
	/// files whose changes make the outputs stale
	pub fn inputs(&self, config: &Config) -> Vec<PathBuf> {
		self.location
			.descriptor
			.iter()
			.chain([&self.location.map])
			.chain(&self.tileset_path)
			.chain([&self.image_path])
			.chain(&config.platform_file)
			.cloned()
			.collect()
	}
}

pub fn load_project(config: &Config) -> TileMinResult<Project> {
	let location = locate(config)?;
	let map = parse_map(&location.map)?;
	let (tileset, tileset_path, image_path) = match &map.tileset {
		TilesetRef::External { source, .. } => {
			let path = resolve(&location.map, source);
			let tileset = parse_tileset(&path)?;
			let image = resolve(&path, &tileset.image);
			(tileset, Some(path), image)
		}
		TilesetRef::Embedded { tileset, .. } => {
			let image = resolve(&location.map, &tileset.image);
			(tileset.clone(), None, image)
		}
	};
	Ok(Project {
		location,
		map,
		tileset,
		tileset_path,
		image_path,
	})
}

/// everything a run produces, before anything is written
#[derive(Debug)]
pub struct Output {
	pub grid: SourceGrid,
	/// one per source block, `None` when skipped as unused
	pub matches: Vec<Option<BlockMatch>>,
	pub unique: Vec<Block>,
	pub layout: AtlasLayout,
	pub atlas: CompositeImage,
	pub palette: Palette,
	pub indexed: IndexedImage,
	pub index: MapIndex,
}

/// source blocks at least one cell points at
fn used_blocks(map: &TiledMap, count: usize) -> Vec<bool> {
	let first_gid = map.tileset.first_gid();
	let mut used = vec![false; count];
	for cell in map.layers.iter().flat_map(|l| &l.cells) {
		if let Some(slot) = cell.local_id(first_gid).and_then(|id| used.get_mut(id)) {
			*slot = true;
		}
	}
	used
}

pub fn process(config: &Config, project: &Project) -> TileMinResult<Output> {
	let tileset = &project.tileset;
	let tileset_file = project.tileset_path.as_ref().unwrap_or(&project.location.map);
	if tileset.tile_width != tileset.tile_height {
		return Err(TileMinError::format(
			tileset_file,
			format!("tiles must be square, found {}×{}", tileset.tile_width, tileset.tile_height),
		));
	}
	let block_size = tileset.tile_width;
	config
		.platform
		.check_block_size(block_size)
		.map_err(TileMinError::input(tileset_file))?;
	if (project.map.tile_width, project.map.tile_height) != (block_size, block_size) {
		warn!(
			"map cells are {}×{} but tiles are {}×{}",
			project.map.tile_width, project.map.tile_height, block_size, block_size
		);
	}

	let image = ImageSource::Path(project.image_path.clone())
		.load()
		.map_err(TileMinError::input(&project.image_path))?;
	let grid = SourceGrid::extract(&image, block_size).map_err(TileMinError::input(&project.image_path))?;
	if tileset.columns.map_or(false, |v| v != grid.columns()) {
		warn!(
			"tileset declares {:?} columns, image has {}",
			tileset.columns,
			grid.columns()
		);
	}

	let mut deduper = Deduper::new();
	let matches: Vec<_> = if config.used_only {
		let used = used_blocks(&project.map, grid.len());
		grid.blocks()
			.iter()
			.zip(used)
			.map(|(block, used)| used.then(|| deduper.match_block(block)))
			.collect()
	} else {
		deduper.match_grid(&grid).into_iter().map(Some).collect()
	};
	info!("{} source blocks, {} unique", grid.len(), deduper.len());

	let layout = AtlasLayout::new(deduper.len(), block_size, &config.platform)?;
	let atlas = build_atlas(deduper.unique_blocks(), &layout);
	let (palette, indexed) = Palette::extract(&atlas, config.platform.max_colors)?;
	info!("{} palette entries", palette.len());
	let index = MapIndex::build(&project.map, &matches, &project.location.map)?;
	Ok(Output {
		grid,
		matches,
		unique: deduper.into_unique_blocks(),
		layout,
		atlas,
		palette,
		indexed,
		index,
	})
}

/// put every output file in a builder, nothing is written yet
pub fn stage(config: &Config, project: &Project, output: &Output) -> TileMinResult<Builder> {
	let mut builder = Builder::new();
	builder.stage(config.atlas_path(), output.indexed.to_bmp(&output.palette)?)?;
	builder.stage(
		config.atlas_import_path(),
		serde_json::to_vec_pretty(&TilesImport::new(&output.palette))?,
	)?;
	builder.stage(config.palette_path(), output.palette.to_bmp()?)?;
	builder.stage(
		config.palette_import_path(),
		serde_json::to_vec_pretty(&PaletteImport::new(&output.palette))?,
	)?;
	builder.stage(
		config.header_path(),
		header(config, &output.index, output.unique.len(), output.layout.block_size),
	)?;
	if config.save_temp_files {
		let table = MatchTable {
			block_size: output.grid.block_size(),
			columns: output.grid.columns(),
			rows: output.grid.rows(),
			unique: output.unique.len(),
			blocks: &output.matches,
		};
		builder.stage(config.match_table_path(), serde_json::to_vec_pretty(&table)?)?;
	}
	builder.stage(config.stamp_path(), Stamp::new(config, &project.location.map).to_vec()?)?;
	Ok(builder)
}

/// outputs are newer than every input and were written with the same settings
pub fn is_fresh(config: &Config, project: &Project) -> TileMinResult<bool> {
	if !artifact::up_to_date(&config.output_paths(), &project.inputs(config)) {
		return Ok(false);
	}
	let stamp = Stamp::new(config, &project.location.map).to_vec()?;
	let same = artifact::stamp_matches(&config.stamp_path(), &stamp);
	if !same {
		debug!("settings changed since the last run");
	}
	Ok(same)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
	UpToDate,
	Written(Vec<PathBuf>),
}

pub fn run(config: &Config) -> TileMinResult<RunStatus> {
	let project = load_project(config)?;
	if !config.force && is_fresh(config, &project)? {
		info!("{} is up to date", config.project);
		return Ok(RunStatus::UpToDate);
	}
	let output = process(config, &project)?;
	let builder = stage(config, &project, &output)?;
	debug!("writing {} files", builder.len());
	let written = builder.build()?;
	info!("{}: wrote {} files", config.project, written.len());
	Ok(RunStatus::Written(written))
}
