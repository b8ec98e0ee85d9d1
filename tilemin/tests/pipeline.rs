use std::fs;
use std::path::Path;

use image::{Rgba, RgbaImage};
use tempfile::TempDir;
use tilemin::emit::CellIndex;
use tilemin::{load_project, process, run, Config, RunStatus, TileMinError};
use tilepak::{BlockMatch, ErrorKind, Orientation};

const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// 2×2 tiles of 8px: a marked tile, its mirror, solid red, invisible
fn tiles() -> RgbaImage {
	RgbaImage::from_fn(16, 16, |x, y| match (x / 8, y / 8, x % 8, y % 8) {
		(0, 0, 0, 0) | (1, 0, 7, 0) => BLUE,
		(_, 0, ..) => GREEN,
		(0, 1, ..) => RED,
		_ => Rgba([9, 9, 9, 0]),
	})
}

const MAP: &str = "1,2,0,\n3,2147483650,4";

fn write_map(path: &Path, tileset: &str, csv: &str) {
	let tmx = format!(
		r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" renderorder="right-down" width="3" height="2" tilewidth="8" tileheight="8" infinite="0">
 {}
 <layer id="1" name="ground" width="3" height="2">
  <data encoding="csv">
{}
</data>
 </layer>
</map>
"#,
		tileset, csv
	);
	fs::write(path, tmx).unwrap();
}

fn project_with(csv: &str, image: RgbaImage, tile: u32) -> (TempDir, Config) {
	let dir = tempfile::tempdir().unwrap();
	let config = Config::new("demo", dir.path());
	let ressources = config.ressources_dir();
	fs::create_dir_all(ressources.join("tiles")).unwrap();
	image.save(ressources.join("tiles/demo.png")).unwrap();
	fs::write(
		ressources.join("demo.tsx"),
		format!(
			r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" name="demo" tilewidth="{0}" tileheight="{0}" columns="2">
 <image source="tiles/demo.png"/>
</tileset>
"#,
			tile
		),
	)
	.unwrap();
	write_map(&ressources.join("demo.tmx"), r#"<tileset firstgid="1" source="demo.tsx"/>"#, csv);
	fs::write(config.descriptor_path(), r#"{"tmx": "demo.tmx"}"#).unwrap();
	(dir, config)
}

fn project() -> (TempDir, Config) {
	project_with(MAP, tiles(), 8)
}

#[test]
fn full_run_writes_every_output() {
	let (_dir, config) = project();
	let RunStatus::Written(written) = run(&config).unwrap() else {
		panic!("nothing written");
	};
	assert_eq!(written, config.output_paths());

	let atlas = image::open(config.atlas_path()).unwrap().to_rgb8();
	assert_eq!(atlas.dimensions(), (256, 8));
	assert_eq!(atlas.get_pixel(0, 0).0, [0, 0, 255]);
	assert_eq!(atlas.get_pixel(7, 0).0, [0, 255, 0]);
	assert_eq!(atlas.get_pixel(8, 0).0, [255, 0, 0]);
	// transparent block and padding
	assert_eq!(atlas.get_pixel(20, 3).0, [255, 0, 255]);
	assert_eq!(atlas.get_pixel(255, 7).0, [255, 0, 255]);

	let palette = image::open(config.palette_path()).unwrap().to_rgb8();
	assert_eq!(palette.dimensions(), (8, 8));
	assert_eq!(palette.get_pixel(1, 0).0, [0, 0, 255]);
	assert_eq!(palette.get_pixel(3, 0).0, [255, 0, 0]);

	let tiles: serde_json::Value = serde_json::from_slice(&fs::read(config.atlas_import_path()).unwrap()).unwrap();
	assert_eq!(tiles, serde_json::json!({"type": "regular_bg_tiles", "bpp_mode": "bpp_4"}));
	let colors: serde_json::Value =
		serde_json::from_slice(&fs::read(config.palette_import_path()).unwrap()).unwrap();
	assert_eq!(colors["type"], "bg_palette");
	assert_eq!(colors["colors_count"], "4");

	let header = fs::read_to_string(config.header_path()).unwrap();
	assert!(header.contains("namespace tilemaps::demo {"));
	assert!(header.contains("constexpr int width = 3;"));
	assert!(header.contains("constexpr int tile_count = 3;"));
	assert!(header.contains("{0, 0}, {0, 1}, {-1, 0},\n        {1, 0}, {0, 0}, {2, 0},"));
}

#[test]
fn blocks_match_in_grid_order() {
	let (_dir, config) = project();
	let output = process(&config, &load_project(&config).unwrap()).unwrap();
	let expected = [
		(0, Orientation::Identity),
		(0, Orientation::HFlip),
		(1, Orientation::Identity),
		(2, Orientation::Identity),
	]
	.map(|(canonical_id, orientation)| Some(BlockMatch { canonical_id, orientation }));
	assert_eq!(output.matches, expected);
	assert_eq!(output.unique.len(), 3);
	assert_eq!((output.layout.columns, output.layout.rows), (32, 1));
}

#[test]
fn empty_cells_become_sentinels() {
	let (_dir, config) = project();
	let output = process(&config, &load_project(&config).unwrap()).unwrap();
	assert_eq!((output.index.width, output.index.height), (3, 2));
	let cells = &output.index.layers[0].cells;
	assert_eq!(cells.len(), 6);
	assert_eq!(cells[2], CellIndex::EMPTY);
	assert_eq!(cells.iter().filter(|c| c.is_empty()).count(), 1);
}

#[test]
fn index_reconstructs_the_map() {
	let (_dir, config) = project();
	let project = load_project(&config).unwrap();
	let output = process(&config, &project).unwrap();
	let first_gid = project.map.tileset.first_gid();
	for (layer, index) in project.map.layers.iter().zip(&output.index.layers) {
		for (cell, emitted) in layer.cells.iter().zip(&index.cells) {
			let Some(local) = cell.local_id(first_gid) else {
				assert!(emitted.is_empty());
				continue;
			};
			let shown = output.grid.block(local).unwrap().oriented(cell.orientation);
			let flip = Orientation::from_flips(emitted.flags & 1 != 0, emitted.flags & 2 != 0);
			let rebuilt = output.unique[emitted.tile as usize].oriented(flip);
			assert_eq!(rebuilt, shown);
		}
	}
}

#[test]
fn palette_overflow_writes_nothing() {
	let (dir, mut config) = project();
	config.platform.max_colors = 3;
	let err = run(&config).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Capacity);
	assert!(!config.atlas_path().exists());
	assert!(!config.header_path().exists());
	assert!(!dir.path().join("include").exists());
}

#[test]
fn block_budget_overflow_writes_nothing() {
	let (dir, mut config) = project();
	config.platform.max_hardware_tiles = 2;
	let err = run(&config).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Capacity);
	for path in config.output_paths() {
		assert!(!path.exists(), "{} written", path.display());
	}
	assert!(!dir.path().join("include").exists());
}

#[test]
fn changed_settings_regenerate() {
	let (_dir, mut config) = project_with("1,1,0,\n1,1,1", tiles(), 8);
	run(&config).unwrap();
	assert!(fs::read_to_string(config.header_path()).unwrap().contains("constexpr int tile_count = 3;"));

	config.namespace = Some("game".into());
	assert!(matches!(run(&config).unwrap(), RunStatus::Written(_)));
	assert!(fs::read_to_string(config.header_path())
		.unwrap()
		.contains("namespace game::tilemaps::demo {"));
	assert_eq!(run(&config).unwrap(), RunStatus::UpToDate);

	config.used_only = true;
	assert!(matches!(run(&config).unwrap(), RunStatus::Written(_)));
	assert!(fs::read_to_string(config.header_path()).unwrap().contains("constexpr int tile_count = 1;"));

	config.platform.max_colors = 200;
	assert!(matches!(run(&config).unwrap(), RunStatus::Written(_)));
	assert_eq!(run(&config).unwrap(), RunStatus::UpToDate);
}

#[test]
fn used_only_skips_unreferenced_blocks() {
	let (_dir, mut config) = project_with("1,3,0,\n0,3,0", tiles(), 8);
	config.used_only = true;
	let output = process(&config, &load_project(&config).unwrap()).unwrap();
	assert_eq!(output.unique.len(), 2);
	assert_eq!(output.matches[1], None);
	assert_eq!(output.matches[3], None);
	assert_eq!(output.index.layers[0].cells[4], CellIndex { tile: 1, flags: 0 });
}

#[test]
fn up_to_date_runs_are_skipped() {
	let (_dir, mut config) = project();
	assert!(matches!(run(&config).unwrap(), RunStatus::Written(_)));
	assert_eq!(run(&config).unwrap(), RunStatus::UpToDate);
	config.force = true;
	assert!(matches!(run(&config).unwrap(), RunStatus::Written(_)));
}

#[test]
fn match_table_is_optional() {
	let (_dir, mut config) = project();
	config.save_temp_files = true;
	run(&config).unwrap();
	let table: serde_json::Value = serde_json::from_slice(&fs::read(config.match_table_path()).unwrap()).unwrap();
	assert_eq!(table["unique"], 3);
	assert_eq!(table["blocks"].as_array().unwrap().len(), 4);
	assert_eq!(table["blocks"][1]["orientation"], "HFlip");
}

#[test]
fn map_file_with_embedded_tileset() {
	let (_dir, mut config) = project();
	let ressources = config.ressources_dir();
	write_map(
		&ressources.join("alt.tmx"),
		r#"<tileset firstgid="1" name="demo" tilewidth="8" tileheight="8" columns="2"><image source="tiles/demo.png"/></tileset>"#,
		"4,4,4,\n4,4,1",
	);
	fs::remove_file(config.descriptor_path()).unwrap();
	config.map_file = Some("alt.tmx".into());
	let project = load_project(&config).unwrap();
	assert!(project.tileset_path.is_none());
	let output = process(&config, &project).unwrap();
	assert_eq!(output.index.layers[0].cells[0], CellIndex { tile: 2, flags: 0 });
}

#[test]
fn ragged_images_are_format_errors() {
	let (_dir, config) = project_with(MAP, RgbaImage::new(20, 16), 8);
	let err = run(&config).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Format);
	assert!(matches!(err, TileMinError::Input { ref path, .. } if path.ends_with("tiles/demo.png")));
	assert!(!config.atlas_path().exists());
}

#[test]
fn unsupported_block_sizes_are_format_errors() {
	let (_dir, config) = project_with(MAP, RgbaImage::new(24, 24), 12);
	assert_eq!(run(&config).unwrap_err().kind(), ErrorKind::Format);
}

#[test]
fn missing_image_is_a_config_error() {
	let (_dir, config) = project();
	fs::remove_file(config.ressources_dir().join("tiles/demo.png")).unwrap();
	assert_eq!(run(&config).unwrap_err().kind(), ErrorKind::Config);
}
