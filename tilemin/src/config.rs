use std::path::{Path, PathBuf};

use clap::Parser;
use log::debug;
use tilepak::Platform;

use crate::error::{read_text, TileMinError, TileMinResult};

/// Tiled map minimizer, writes deduplicated tiles, a palette and a map header
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
	/// Project name, picks the descriptor and names every output
	pub project: String,
	/// Repository root holding graphics/ressources
	#[arg(short = 'C', long, default_value = ".")]
	pub root: PathBuf,
	/// Use this map instead of the one named by the descriptor
	#[arg(long)]
	pub map_file: Option<PathBuf>,
	/// Namespace prefix for generated symbols, `a::b` allowed
	#[arg(short, long)]
	pub namespace: Option<String>,
	/// Toml file overriding platform limits
	#[arg(long)]
	pub platform: Option<PathBuf>,
	/// Only deduplicate tiles the map actually uses
	#[arg(long)]
	pub used_only: bool,
	/// Deduplicate the whole tileset image, the default
	#[arg(long, conflicts_with = "used_only")]
	pub no_minimization: bool,
	/// Regenerate even when outputs are up to date
	#[arg(short, long)]
	pub force: bool,
	/// Also write the tile match table
	#[arg(short, long)]
	pub save_temp_files: bool,
	/// Author name for the copyright line of generated files
	#[arg(short, long, default_value = DEFAULT_AUTHOR)]
	pub author: String,
	/// Author mail for the copyright line of generated files
	#[arg(short, long, default_value = DEFAULT_MAIL)]
	pub mail: String,
	/// First line of the comment atop generated files
	#[arg(long, default_value = DEFAULT_HEADER_LINE)]
	pub header_line: String,
	/// More output, repeatable
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,
}

/// everything a run needs, resolved once
#[derive(Debug, Clone)]
pub struct Config {
	pub project: String,
	pub root: PathBuf,
	pub map_file: Option<PathBuf>,
	pub namespace: Option<String>,
	pub platform: Platform,
	pub platform_file: Option<PathBuf>,
	pub used_only: bool,
	pub force: bool,
	pub save_temp_files: bool,
	pub author: String,
	pub mail: String,
	pub header_line: String,
}

pub const DEFAULT_AUTHOR: &str = "Butano Auxiliary";
pub const DEFAULT_MAIL: &str = "butano_auxiliary@gba.org";
pub const DEFAULT_HEADER_LINE: &str = "This file is part of a super awesome GBA project!";

const CPP_KEYWORDS: &[&str] = &[
	"alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break", "case", "catch",
	"char", "char8_t", "char16_t", "char32_t", "class", "compl", "concept", "const", "consteval", "constexpr",
	"constinit", "const_cast", "continue", "co_await", "co_return", "co_yield", "decltype", "default", "delete",
	"do", "double", "dynamic_cast", "else", "enum", "explicit", "export", "extern", "false", "float", "for",
	"friend", "goto", "if", "inline", "int", "long", "mutable", "namespace", "new", "noexcept", "not", "not_eq",
	"nullptr", "operator", "or", "or_eq", "private", "protected", "public", "register", "reinterpret_cast",
	"requires", "return", "short", "signed", "sizeof", "static", "static_assert", "static_cast", "struct",
	"switch", "template", "this", "thread_local", "throw", "true", "try", "typedef", "typeid", "typename",
	"union", "unsigned", "using", "virtual", "void", "volatile", "wchar_t", "while", "xor", "xor_eq",
];

fn is_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
		&& !CPP_KEYWORDS.contains(&name)
}

pub fn load_platform(path: &Path) -> TileMinResult<Platform> {
	let text = read_text(path)?;
	let platform = toml::from_str(&text).map_err(|source| TileMinError::Platform {
		path: path.to_path_buf(),
		source,
	})?;
	debug!("platform {:?}", platform);
	Ok(platform)
}

impl Config {
	/// default platform, every switch off
	pub fn new(project: impl Into<String>, root: impl Into<PathBuf>) -> Self {
		Self {
			project: project.into(),
			root: root.into(),
			map_file: None,
			namespace: None,
			platform: Platform::default(),
			platform_file: None,
			used_only: false,
			force: false,
			save_temp_files: false,
			author: DEFAULT_AUTHOR.into(),
			mail: DEFAULT_MAIL.into(),
			header_line: DEFAULT_HEADER_LINE.into(),
		}
	}
	pub fn from_args(args: Args) -> TileMinResult<Self> {
		let platform = match &args.platform {
			Some(path) => load_platform(path)?,
			None => Platform::default(),
		};
		let config = Self {
			project: args.project,
			root: args.root,
			map_file: args.map_file,
			namespace: args.namespace,
			platform,
			platform_file: args.platform,
			used_only: args.used_only,
			force: args.force,
			save_temp_files: args.save_temp_files,
			author: args.author,
			mail: args.mail,
			header_line: args.header_line,
		};
		config.validate()?;
		Ok(config)
	}
	/// project and namespace end up as c++ symbols
	pub fn validate(&self) -> TileMinResult<()> {
		if !is_identifier(&self.project) {
			return Err(TileMinError::InvalidName {
				what: "project name",
				name: self.project.clone(),
			});
		}
		if let Some(namespace) = &self.namespace {
			if !namespace.split("::").all(is_identifier) {
				return Err(TileMinError::InvalidName {
					what: "namespace",
					name: namespace.clone(),
				});
			}
		}
		Ok(())
	}
	pub fn graphics_dir(&self) -> PathBuf {
		self.root.join("graphics")
	}
	pub fn ressources_dir(&self) -> PathBuf {
		self.graphics_dir().join("ressources")
	}
	pub fn include_dir(&self) -> PathBuf {
		self.root.join("include")
	}
	pub fn descriptor_path(&self) -> PathBuf {
		self.ressources_dir().join(format!("{}.json", self.project))
	}
	pub fn atlas_path(&self) -> PathBuf {
		self.graphics_dir().join(format!("{}.bmp", self.project))
	}
	pub fn atlas_import_path(&self) -> PathBuf {
		self.graphics_dir().join(format!("{}.json", self.project))
	}
	pub fn palette_path(&self) -> PathBuf {
		self.graphics_dir().join(format!("{}_palette.bmp", self.project))
	}
	pub fn palette_import_path(&self) -> PathBuf {
		self.graphics_dir().join(format!("{}_palette.json", self.project))
	}
	pub fn header_path(&self) -> PathBuf {
		self.include_dir().join(format!("{}.hpp", self.project))
	}
	pub fn match_table_path(&self) -> PathBuf {
		self.ressources_dir().join(format!("{}_tiles.json", self.project))
	}
	/// settings of the run that wrote the outputs
	pub fn stamp_path(&self) -> PathBuf {
		self.ressources_dir().join(format!("{}.stamp", self.project))
	}
	/// every file a run writes
	pub fn output_paths(&self) -> Vec<PathBuf> {
		let mut paths = vec![
			self.atlas_path(),
			self.atlas_import_path(),
			self.palette_path(),
			self.palette_import_path(),
			self.header_path(),
		];
		if self.save_temp_files {
			paths.push(self.match_table_path());
		}
		paths.push(self.stamp_path());
		paths
	}
	/// `ns::tilemaps::project`
	pub fn namespace_path(&self) -> String {
		match &self.namespace {
			Some(namespace) => format!("{}::tilemaps::{}", namespace, self.project),
			None => format!("tilemaps::{}", self.project),
		}
	}
	pub fn include_guard(&self) -> String {
		format!("{}_HPP", self.namespace_path().replace("::", "_").to_uppercase())
	}
}
