use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, warn};

use crate::common::{Artifact, ArtifactError, ArtifactResult};

/// collects output files, nothing touches the disk until [`Builder::build`]
#[derive(Default)]
pub struct Builder {
	entries: Vec<Artifact>,
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
	let mut name = path.file_name().map(|v| v.to_os_string()).unwrap_or_default();
	name.push(suffix);
	path.with_file_name(name)
}

fn write_temp(path: &Path, data: &[u8]) -> io::Result<PathBuf> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)?;
	}
	let temp = sibling(path, ".tmp");
	fs::write(&temp, data)?;
	Ok(temp)
}

fn discard(paths: &[PathBuf]) {
	for path in paths {
		if let Err(err) = fs::remove_file(path) {
			if err.kind() != io::ErrorKind::NotFound {
				warn!("could not remove {}: {}", path.display(), err);
			}
		}
	}
}

fn restore(backup: &Path, path: &Path) {
	if let Err(err) = fs::rename(backup, path) {
		warn!("could not restore {} from {}: {}", path.display(), backup.display(), err);
	}
}

/// a destination that was moved in, and what it replaced
struct Swap {
	path: PathBuf,
	backup: Option<PathBuf>,
}

/// move `temp` onto `path`, keeping an existing file as a `.bak` sibling
fn swap_in(temp: &Path, path: &Path) -> io::Result<Option<PathBuf>> {
	let backup = match fs::symlink_metadata(path) {
		Ok(meta) if meta.is_dir() => {
			return Err(io::Error::new(io::ErrorKind::Other, "destination is a directory"));
		}
		Ok(_) => {
			let backup = sibling(path, ".bak");
			fs::rename(path, &backup)?;
			Some(backup)
		}
		Err(err) if err.kind() == io::ErrorKind::NotFound => None,
		Err(err) => return Err(err),
	};
	if let Err(err) = fs::rename(temp, path) {
		if let Some(backup) = &backup {
			restore(backup, path);
		}
		return Err(err);
	}
	Ok(backup)
}

/// undo swaps, newest first
fn roll_back(swaps: &[Swap]) {
	for swap in swaps.iter().rev() {
		discard(std::slice::from_ref(&swap.path));
		if let Some(backup) = &swap.backup {
			restore(backup, &swap.path);
		}
	}
}

impl Builder {
	pub fn new() -> Self {
		Self::default()
	}
	pub fn stage(&mut self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) -> ArtifactResult<()> {
		let path = path.into();
		if self.entries.iter().any(|ent| ent.path == path) {
			return Err(ArtifactError::DuplicatePath(path));
		}
		self.entries.push(Artifact {
			path,
			data: data.into(),
		});
		Ok(())
	}
	pub fn paths(&self) -> impl Iterator<Item = &Path> {
		self.entries.iter().map(|ent| ent.path.as_path())
	}
	pub fn len(&self) -> usize {
		self.entries.len()
	}
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
	/// write everything next to its destination, then move it all in place
	///
	/// on failure every destination keeps its previous contents, files that
	/// did not exist before stay absent
	pub fn build(self) -> ArtifactResult<Vec<PathBuf>> {
		let mut temps = Vec::with_capacity(self.entries.len());
		for ent in &self.entries {
			match write_temp(&ent.path, &ent.data) {
				Ok(temp) => temps.push(temp),
				Err(source) => {
					discard(&temps);
					discard(&[sibling(&ent.path, ".tmp")]);
					return Err(ArtifactError::Write {
						path: ent.path.clone(),
						source,
					});
				}
			}
		}
		let mut swaps = Vec::with_capacity(temps.len());
		for (i, (temp, ent)) in temps.iter().zip(&self.entries).enumerate() {
			match swap_in(temp, &ent.path) {
				Ok(backup) => swaps.push(Swap {
					path: ent.path.clone(),
					backup,
				}),
				Err(source) => {
					roll_back(&swaps);
					discard(&temps[i..]);
					return Err(ArtifactError::Write {
						path: ent.path.clone(),
						source,
					});
				}
			}
		}
		let backups: Vec<_> = swaps.into_iter().filter_map(|v| v.backup).collect();
		discard(&backups);
		for ent in &self.entries {
			debug!("wrote {}", ent.path.display());
		}
		Ok(self.entries.into_iter().map(|ent| ent.path).collect())
	}
}

fn modified(path: &Path) -> Option<SystemTime> {
	fs::metadata(path).and_then(|v| v.modified()).ok()
}

/// every output exists and none is older than any input
pub fn up_to_date<O, I>(outputs: &[O], inputs: &[I]) -> bool
where
	O: AsRef<Path>,
	I: AsRef<Path>,
{
	let mut oldest = None::<SystemTime>;
	for out in outputs {
		match modified(out.as_ref()) {
			Some(time) => oldest = Some(oldest.map_or(time, |v| v.min(time))),
			None => return false,
		}
	}
	let Some(oldest) = oldest else {
		return false;
	};
	inputs
		.iter()
		.all(|input| modified(input.as_ref()).map_or(false, |time| time <= oldest))
}

/// `path` holds exactly `expected`
pub fn stamp_matches(path: &Path, expected: &[u8]) -> bool {
	fs::read(path).map_or(false, |v| v == expected)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	fn touch(path: &Path, time: SystemTime) {
		fs::write(path, b"x").unwrap();
		fs::File::options().write(true).open(path).unwrap().set_modified(time).unwrap();
	}

	#[test]
	fn writes_every_staged_file() {
		let dir = tempfile::tempdir().unwrap();
		let mut builder = Builder::new();
		builder.stage(dir.path().join("a/one.txt"), "one").unwrap();
		builder.stage(dir.path().join("b/c/two.txt"), vec![2u8, 2]).unwrap();
		assert_eq!(builder.len(), 2);
		let written = builder.build().unwrap();
		assert_eq!(written.len(), 2);
		assert_eq!(fs::read(dir.path().join("a/one.txt")).unwrap(), b"one");
		assert_eq!(fs::read(dir.path().join("b/c/two.txt")).unwrap(), [2, 2]);
		assert!(!dir.path().join("a/one.txt.tmp").exists());
	}

	#[test]
	fn duplicate_paths_are_refused() {
		let mut builder = Builder::new();
		builder.stage("out/x.bin", "a").unwrap();
		let err = builder.stage("out/x.bin", "b").unwrap_err();
		assert!(matches!(err, ArtifactError::DuplicatePath(_)));
	}

	#[test]
	fn failed_build_leaves_nothing_behind() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("blocker"), "file, not a directory").unwrap();
		let mut builder = Builder::new();
		builder.stage(dir.path().join("first.txt"), "first").unwrap();
		builder.stage(dir.path().join("blocker/second.txt"), "second").unwrap();
		let err = builder.build().unwrap_err();
		assert!(matches!(err, ArtifactError::Write { .. }));
		assert!(!dir.path().join("first.txt").exists());
		assert!(!dir.path().join("first.txt.tmp").exists());
	}

	#[test]
	fn failed_swap_restores_earlier_destinations() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("a.txt"), "old").unwrap();
		fs::create_dir(dir.path().join("b")).unwrap();
		fs::write(dir.path().join("b/keep.txt"), "keep").unwrap();
		let mut builder = Builder::new();
		builder.stage(dir.path().join("a.txt"), "new").unwrap();
		builder.stage(dir.path().join("c.txt"), "fresh").unwrap();
		builder.stage(dir.path().join("b"), "not a directory").unwrap();
		let err = builder.build().unwrap_err();
		assert!(matches!(err, ArtifactError::Write { ref path, .. } if path.ends_with("b")));
		assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "old");
		assert!(!dir.path().join("c.txt").exists());
		assert_eq!(fs::read_to_string(dir.path().join("b/keep.txt")).unwrap(), "keep");
		for leftover in ["a.txt.bak", "a.txt.tmp", "c.txt.tmp", "b.tmp"] {
			assert!(!dir.path().join(leftover).exists(), "{} left behind", leftover);
		}
	}

	#[test]
	fn replaced_files_leave_no_backups() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("out.txt");
		fs::write(&path, "old").unwrap();
		let mut builder = Builder::new();
		builder.stage(&path, "new").unwrap();
		builder.build().unwrap();
		assert_eq!(fs::read_to_string(&path).unwrap(), "new");
		assert!(!dir.path().join("out.txt.bak").exists());
	}

	#[test]
	fn stamps_compare_contents() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("run.stamp");
		assert!(!stamp_matches(&path, b"a"));
		fs::write(&path, "a").unwrap();
		assert!(stamp_matches(&path, b"a"));
		assert!(!stamp_matches(&path, b"b"));
	}

	#[test]
	fn freshness_follows_modification_times() {
		let dir = tempfile::tempdir().unwrap();
		let (input, output) = (dir.path().join("in"), dir.path().join("out"));
		let now = SystemTime::now();
		assert!(!up_to_date(&[&output], &[&input]));
		touch(&input, now - Duration::from_secs(60));
		touch(&output, now);
		assert!(up_to_date(&[&output], &[&input]));
		touch(&input, now + Duration::from_secs(60));
		assert!(!up_to_date(&[&output], &[&input]));
		// missing input
		assert!(!up_to_date(&[&output], &[dir.path().join("gone")]));
	}
}
