//! Native filesystem implementation using std::fs + tokio.

use crate::FileSystem;
use ignore::WalkBuilder;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::task;

/// Native filesystem implementation using std::fs + tokio.
///
/// Blocking `std::fs` calls are wrapped in `tokio::task::spawn_blocking`
/// so reading a large build directory never stalls the runtime.
#[derive(Debug, Clone)]
pub struct NativeFileSystem {
    project_root: PathBuf,
}

impl NativeFileSystem {
    /// Create a filesystem scoped to `project_root`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither the root nor its parent can be
    /// canonicalized.
    pub fn new(project_root: impl AsRef<Path>) -> io::Result<Self> {
        let root = project_root.as_ref();
        let project_root = root.canonicalize().or_else(|_| {
            // Root may not exist yet (e.g. a fresh report directory)
            let parent = root.parent().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Project root does not exist: {}", root.display()),
                )
            })?;
            let name = root.file_name().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "Invalid project root path")
            })?;
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            Ok::<_, io::Error>(parent.canonicalize()?.join(name))
        })?;

        Ok(Self { project_root })
    }

    /// Resolve `path` against the root and make sure it stays inside it.
    ///
    /// # Security
    ///
    /// Existing paths are canonicalized so symlinks can't be used to escape
    /// the root; paths that don't exist yet are normalized lexically.
    fn validate_path(&self, path: &Path) -> io::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };

        let resolved = match absolute.canonicalize() {
            Ok(canonical) => canonical,
            Err(_) => match (absolute.parent(), absolute.file_name()) {
                (Some(parent), Some(name)) => match parent.canonicalize() {
                    Ok(parent) => parent.join(name),
                    Err(_) => normalize_lexically(&absolute),
                },
                _ => normalize_lexically(&absolute),
            },
        };

        if !resolved.starts_with(&self.project_root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "Path traversal detected: {} is outside project root {}",
                    resolved.display(),
                    self.project_root.display()
                ),
            ));
        }

        Ok(resolved)
    }
}

/// Resolves `.` and `..` components without touching the disk.
///
/// A `..` at the root is dropped, so the result never climbs above the
/// path's first component.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn join_error(e: task::JoinError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

#[async_trait::async_trait]
impl FileSystem for NativeFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || validated.try_exists())
            .await
            .map_err(join_error)?
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || std::fs::read(&validated))
            .await
            .map_err(join_error)?
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || std::fs::read_to_string(&validated))
            .await
            .map_err(join_error)?
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let validated = self.validate_path(path)?;
        let contents = contents.to_vec();
        task::spawn_blocking(move || std::fs::write(&validated, contents))
            .await
            .map_err(join_error)?
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || std::fs::create_dir_all(&validated))
            .await
            .map_err(join_error)?
    }

    async fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let validated = self.validate_path(dir)?;
        let project_root = self.project_root.clone();
        task::spawn_blocking(move || list_files_sync(&validated, &project_root))
            .await
            .map_err(join_error)?
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }
}

/// Synchronous directory walk.
fn list_files_sync(dir: &Path, project_root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut walker = WalkBuilder::new(dir);
    walker
        .follow_links(false)
        .hidden(true)
        .parents(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .sort_by_file_path(|a, b| a.cmp(b));

    let mut files = Vec::new();
    for result in walker.build() {
        let entry = result.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.into_path();
        if path.starts_with(project_root) {
            files.push(path);
        } else {
            tracing::warn!(path = %path.display(), "skipping file outside project root");
        }
    }

    files.sort();
    Ok(files)
}
