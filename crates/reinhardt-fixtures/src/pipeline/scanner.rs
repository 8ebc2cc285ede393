//! Fixtures root directory scanning.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{FixtureError, FixtureResult};

/// Lists the immediate subdirectories of `root` in file-name order.
///
/// Non-directory entries are ignored. Symbolic links are not followed.
///
/// # Errors
///
/// Returns [`FixtureError::Filesystem`] if `root` does not exist, is not a
/// directory, or cannot be read.
pub fn scan_fixture_dirs(root: &Path) -> FixtureResult<Vec<PathBuf>> {
	let fs_error = |e: std::io::Error| FixtureError::Filesystem(format!("{}: {}", root.display(), e));

	let metadata = fs::metadata(root).map_err(fs_error)?;
	if !metadata.is_dir() {
		return Err(FixtureError::Filesystem(format!(
			"{}: not a directory",
			root.display()
		)));
	}

	let mut dirs = Vec::new();
	for entry in fs::read_dir(root).map_err(fs_error)? {
		let entry = entry.map_err(fs_error)?;
		if entry.file_type().map_err(fs_error)?.is_dir() {
			dirs.push(entry.path());
		}
	}
	dirs.sort();

	debug!(root = %root.display(), count = dirs.len(), "scanned fixture directories");
	Ok(dirs)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tempfile::TempDir;

	#[rstest]
	fn test_lists_only_directories_sorted() {
		let root = TempDir::new().unwrap();
		fs::create_dir(root.path().join("users")).unwrap();
		fs::create_dir(root.path().join("orders")).unwrap();
		fs::write(root.path().join("README.md"), "not a fixture dir").unwrap();

		let dirs = scan_fixture_dirs(root.path()).unwrap();
		let names: Vec<_> = dirs
			.iter()
			.map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
			.collect();
		assert_eq!(names, vec!["orders", "users"]);
	}

	#[rstest]
	fn test_empty_root() {
		let root = TempDir::new().unwrap();
		assert!(scan_fixture_dirs(root.path()).unwrap().is_empty());
	}

	#[rstest]
	fn test_missing_root() {
		let result = scan_fixture_dirs(Path::new("/nonexistent/fixtures"));
		assert!(matches!(result, Err(FixtureError::Filesystem(_))));
	}

	#[rstest]
	fn test_root_is_a_file() {
		let root = TempDir::new().unwrap();
		let file = root.path().join("fixtures.yml");
		fs::write(&file, "entity: User").unwrap();

		let result = scan_fixture_dirs(&file);
		assert!(matches!(result, Err(FixtureError::Filesystem(_))));
	}
}
