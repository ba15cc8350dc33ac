//! Filesystem abstraction.
//!
//! All reads and writes the build performs go through [`FileSystem`], which
//! is the seam that lets the pipeline be exercised against scratch
//! directories in tests (and substituted entirely where needed). The
//! production implementation is a thin veneer over `std::fs` plus a sorted
//! recursive walk.

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Narrow filesystem contract used by the build pipeline.
pub trait FileSystem: Sync {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    fn remove_all(&self, path: &Path) -> io::Result<()>;
    /// All regular files under `dir`, recursively, in deterministic
    /// (lexicographic) order. A missing directory yields an empty list.
    fn walk_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Production implementation backed by `std::fs` and `walkdir`.
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        std::fs::write(path, bytes)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        match std::fs::remove_dir_all(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn walk_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(io::Error::other)?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}
