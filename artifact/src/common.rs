use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
	#[error("{} is staged twice", .0.display())]
	DuplicatePath(PathBuf),
	#[error("failed to write {}: {source}", path.display())]
	Write {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;

pub(crate) struct Artifact {
	pub path: PathBuf,
	pub data: Vec<u8>,
}
