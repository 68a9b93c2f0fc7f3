//! FileSystem trait shared by every backend.

use std::io;
use std::path::{Path, PathBuf};

/// Async filesystem operations scoped to a project root.
///
/// Relative paths are resolved against [`FileSystem::project_root`]. Paths
/// that escape the root are rejected with `io::ErrorKind::PermissionDenied`.
///
/// Errors are plain `std::io::Error` so both backends map onto the same
/// error kinds (`NotFound`, `InvalidData`, ...).
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Read file contents as bytes.
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Read file contents as a string.
    ///
    /// # Errors
    ///
    /// Returns `io::ErrorKind::NotFound` if the file doesn't exist and
    /// `io::ErrorKind::InvalidData` if it is not valid UTF-8.
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write a file, replacing any previous contents.
    ///
    /// Parent directories are NOT created automatically.
    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Create a directory and all of its parents.
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// List every regular file below `dir`, recursively.
    ///
    /// Returned paths are absolute and sorted, so two listings of the same
    /// tree come back in the same order. Hidden entries are skipped; ignore
    /// files are not consulted since build output is usually git-ignored.
    async fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Root every relative path is resolved against.
    fn project_root(&self) -> &Path;
}
