//! In-memory filesystem implementation.

use crate::FileSystem;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Filesystem backed by a path → bytes map.
///
/// Directories are implicit: a file at `/project/dist/a.js` makes
/// `/project/dist` exist. Cloning shares the underlying storage, so a test
/// can hand one clone to a writer and inspect the other.
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    project_root: PathBuf,
    files: Arc<RwLock<BTreeMap<PathBuf, Vec<u8>>>>,
}

impl MemoryFileSystem {
    /// Create an empty filesystem rooted at `project_root` (e.g. "/project").
    pub fn new(project_root: impl AsRef<Path>) -> io::Result<Self> {
        let project_root = normalize_path(project_root.as_ref())?;
        Ok(Self {
            project_root,
            files: Arc::new(RwLock::new(BTreeMap::new())),
        })
    }

    /// Add a file (used during setup).
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> io::Result<()> {
        let normalized = self.validate_path(path.as_ref())?;
        self.files.write().insert(normalized, contents.into());
        Ok(())
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    fn validate_path(&self, path: &Path) -> io::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };
        let normalized = normalize_path(&absolute)?;

        if !normalized.starts_with(&self.project_root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "Path traversal detected: {} is outside {}",
                    normalized.display(),
                    self.project_root.display()
                ),
            ));
        }

        Ok(normalized)
    }
}

/// Lexical normalization; `..` above the filesystem root is rejected.
fn normalize_path(path: &Path) -> io::Result<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    return Err(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        "Path attempts to escape project root using ..",
                    ));
                }
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

#[async_trait::async_trait]
impl FileSystem for MemoryFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let normalized = self.validate_path(path)?;
        let files = self.files.read();
        Ok(files.contains_key(&normalized) || files.keys().any(|p| p.starts_with(&normalized)))
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let normalized = self.validate_path(path)?;
        self.files.read().get(&normalized).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found: {}", normalized.display()),
            )
        })
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read(path).await?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let normalized = self.validate_path(path)?;
        self.files.write().insert(normalized, contents.to_vec());
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        // Directories are implicit
        self.validate_path(path).map(|_| ())
    }

    async fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let normalized = self.validate_path(dir)?;
        let files = self.files.read();
        Ok(files
            .keys()
            .filter(|path| path.starts_with(&normalized) && **path != normalized)
            .filter(|path| {
                !path
                    .strip_prefix(&normalized)
                    .map(|rest| {
                        rest.components().any(|c| {
                            c.as_os_str().to_string_lossy().starts_with('.')
                        })
                    })
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }
}
