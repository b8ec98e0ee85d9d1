use std::io;
use std::path::{Path, PathBuf};

use artifact::ArtifactError;
use thiserror::Error;
use tilepak::{ErrorKind, TilePakError};

#[derive(Error, Debug)]
pub enum TileMinError {
	#[error("{} not found", .0.display())]
	MissingFile(PathBuf),
	#[error("failed to read {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("{}: missing required key `{key}`", path.display())]
	MissingKey { path: PathBuf, key: &'static str },
	#[error("{}: malformed json: {source}", path.display())]
	Json {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
	#[error("{}: malformed platform file: {source}", path.display())]
	Platform {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
	#[error("invalid {what} {name:?}, expected a c++ identifier")]
	InvalidName { what: &'static str, name: String },
	#[error("{}: {reason}", path.display())]
	Format { path: PathBuf, reason: String },
	#[error("{}: {source}", path.display())]
	Input {
		path: PathBuf,
		#[source]
		source: TilePakError,
	},
	#[error(transparent)]
	TilePak(#[from] TilePakError),
	#[error(transparent)]
	Artifact(#[from] ArtifactError),
	#[error("failed to serialize output: {0}")]
	Serialize(#[from] serde_json::Error),
}

impl TileMinError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::MissingFile(_)
			| Self::MissingKey { .. }
			| Self::Json { .. }
			| Self::Platform { .. }
			| Self::InvalidName { .. } => ErrorKind::Config,
			Self::Read { source, .. } if source.kind() == io::ErrorKind::NotFound => ErrorKind::Config,
			Self::Read { .. } | Self::Artifact(_) | Self::Serialize(_) => ErrorKind::Io,
			Self::Format { .. } => ErrorKind::Format,
			Self::Input { source, .. } | Self::TilePak(source) => source.kind(),
		}
	}
	pub(crate) fn format(path: &Path, reason: impl Into<String>) -> Self {
		Self::Format {
			path: path.to_path_buf(),
			reason: reason.into(),
		}
	}
	pub(crate) fn input(path: &Path) -> impl FnOnce(TilePakError) -> Self + '_ {
		move |source| Self::Input {
			path: path.to_path_buf(),
			source,
		}
	}
}

pub type TileMinResult<T> = Result<T, TileMinError>;

/// read a text file, a missing one is a [`TileMinError::MissingFile`]
pub(crate) fn read_text(path: &Path) -> TileMinResult<String> {
	std::fs::read_to_string(path).map_err(|source| match source.kind() {
		io::ErrorKind::NotFound => TileMinError::MissingFile(path.to_path_buf()),
		_ => TileMinError::Read {
			path: path.to_path_buf(),
			source,
		},
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kinds_follow_the_cause() {
		assert_eq!(TileMinError::MissingFile("a.json".into()).kind(), ErrorKind::Config);
		assert_eq!(TileMinError::format(Path::new("a.tmx"), "nope").kind(), ErrorKind::Format);
		assert_eq!(TileMinError::TilePak(TilePakError::TooManyColors(300, 256)).kind(), ErrorKind::Capacity);
		let err = TileMinError::input(Path::new("a.png"))(TilePakError::InvalidDimensions(17, 32, 16));
		assert_eq!(err.kind(), ErrorKind::Format);
		assert!(err.to_string().starts_with("a.png: "));
	}

	#[test]
	fn missing_files_are_named() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nothing.tmx");
		let err = read_text(&path).unwrap_err();
		assert!(matches!(err, TileMinError::MissingFile(ref p) if p == &path));
		assert!(err.to_string().contains("nothing.tmx"));
	}
}
