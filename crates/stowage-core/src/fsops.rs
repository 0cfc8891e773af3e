//! Filesystem operations drivers delegate to.
//!
//! Drivers do not touch the filesystem directly. They hold a
//! [`FileSystemOperator`] rooted at their backing directory and forward to
//! it, which keeps the filesystem surface mockable and the driver itself a
//! thin lifecycle wrapper.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Filesystem surface a backup store driver needs from its backing tree.
///
/// Deliberately narrow: listing a directory doubles as the liveness probe
/// for remote-backed trees, so it is the one operation every driver relies
/// on during initialization.
pub trait FileSystemOperator: Send + Sync {
    /// List the names of entries directly under `path`.
    ///
    /// `path` is relative to the operator's root; `""` lists the root
    /// itself. Names are returned sorted and do not include `.` or `..`.
    fn list(&self, path: &str) -> io::Result<Vec<String>>;
}

/// [`FileSystemOperator`] backed by a directory on the local filesystem.
///
/// The root is usually a mount point owned by a driver, but nothing here
/// assumes that; any readable directory works.
#[derive(Debug, Clone)]
pub struct LocalFileSystemOperator {
    root: PathBuf,
}

impl LocalFileSystemOperator {
    /// Create an operator rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory all relative paths resolve under.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSystemOperator for LocalFileSystemOperator {
    fn list(&self, path: &str) -> io::Result<Vec<String>> {
        let dir = join_under(&self.root, path);
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort_unstable();
        Ok(names)
    }
}

/// Join `relative` beneath `base`, never escaping to the filesystem root.
///
/// [`Path::join`] replaces the base entirely when handed an absolute path;
/// store-relative paths routinely arrive with a leading slash, so that
/// behavior would silently resolve them outside the store. Leading slashes
/// are stripped instead, and `""` resolves to `base` itself.
pub fn join_under(base: &Path, relative: &str) -> PathBuf {
    let trimmed = relative.trim_start_matches('/');
    if trimmed.is_empty() {
        base.to_path_buf()
    } else {
        base.join(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_join_under_relative() {
        assert_eq!(
            join_under(Path::new("/mnt/store"), "backups/vol1"),
            PathBuf::from("/mnt/store/backups/vol1")
        );
    }

    #[test]
    fn test_join_under_strips_leading_slashes() {
        assert_eq!(
            join_under(Path::new("/mnt/store"), "/backups"),
            PathBuf::from("/mnt/store/backups")
        );
        assert_eq!(
            join_under(Path::new("/mnt/store"), "//backups"),
            PathBuf::from("/mnt/store/backups")
        );
    }

    #[test]
    fn test_join_under_empty_is_base() {
        assert_eq!(
            join_under(Path::new("/mnt/store"), ""),
            PathBuf::from("/mnt/store")
        );
        assert_eq!(
            join_under(Path::new("/mnt/store"), "/"),
            PathBuf::from("/mnt/store")
        );
    }

    #[test]
    fn test_list_returns_sorted_names() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.img"), "b").unwrap();
        fs::write(temp.path().join("a.img"), "a").unwrap();
        fs::create_dir(temp.path().join("volumes")).unwrap();

        let ops = LocalFileSystemOperator::new(temp.path());
        let names = ops.list("").unwrap();
        assert_eq!(names, vec!["a.img", "b.img", "volumes"]);
    }

    #[test]
    fn test_list_subdirectory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("volumes")).unwrap();
        fs::write(temp.path().join("volumes").join("vol1.cfg"), "{}").unwrap();

        let ops = LocalFileSystemOperator::new(temp.path());
        assert_eq!(ops.list("volumes").unwrap(), vec!["vol1.cfg"]);
        // Leading slash stays inside the root.
        assert_eq!(ops.list("/volumes").unwrap(), vec!["vol1.cfg"]);
    }

    #[test]
    fn test_list_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let ops = LocalFileSystemOperator::new(temp.path());
        let err = ops.list("does-not-exist").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_list_on_file_fails() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("plain"), "not a dir").unwrap();
        let ops = LocalFileSystemOperator::new(temp.path());
        assert!(ops.list("plain").is_err());
    }
}
