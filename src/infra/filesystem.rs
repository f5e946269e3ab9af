//! Filesystem operations
//!
//! Small directory helpers shared by the hardware and library models.

use std::io;
use std::path::{Path, PathBuf};

/// Immediate subdirectories of `path`, sorted by name
///
/// Symlinks to directories count as directories.
pub fn list_subdirectories(path: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    for entry in walkdir::WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_dir() {
            let name = entry.file_name().to_string_lossy().into_owned();
            dirs.push((name, entry.into_path()));
        }
    }
    Ok(dirs)
}

/// Like [`list_subdirectories`], but an absent directory yields nothing
pub fn list_subdirectories_if_exists(path: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    if path.is_dir() {
        list_subdirectories(path)
    } else {
        tracing::debug!("{} does not exist", path.display());
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_lists_only_directories_sorted() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("zeta")).unwrap();
        fs::create_dir(root.path().join("alpha")).unwrap();
        fs::create_dir_all(root.path().join("alpha/nested")).unwrap();
        fs::write(root.path().join("file.txt"), "").unwrap();

        let names: Vec<String> = list_subdirectories(root.path())
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_missing_directory() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("missing");
        assert!(list_subdirectories(&missing).is_err());
        assert!(list_subdirectories_if_exists(&missing).unwrap().is_empty());
    }
}
