use crate::types::RawConfig;
use heft_fs::FileSystem;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[cfg(feature = "native-fs")]
use heft_fs::NativeFileSystem;

/// Name of the config file looked up in the workspace root.
pub const CONFIG_FILE_NAME: &str = "heft.toml";

/// Errors that can occur while loading or resolving config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("Gzip level must be between 0 and 9, got {0}")]
    InvalidGzipLevel(u32),

    #[error("Report file name must be a plain, non-empty name, got '{0}'")]
    EmptyFileName(String),

    #[error("Invalid exclude pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Reads [`RawConfig`] layers through a [`FileSystem`].
pub struct ConfigLoader<F: FileSystem> {
    fs: Arc<F>,
}

#[cfg(feature = "native-fs")]
impl ConfigLoader<NativeFileSystem> {
    /// Loader over the native filesystem, scoped to `root`.
    pub fn native(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let fs = NativeFileSystem::new(root).map_err(ConfigError::Io)?;
        Ok(Self::new(Arc::new(fs)))
    }
}

impl<F: FileSystem> ConfigLoader<F> {
    pub fn new(fs: Arc<F>) -> Self {
        Self { fs }
    }

    /// Load config from a specific path.
    pub async fn load_from(&self, path: &Path) -> Result<RawConfig, ConfigError> {
        if !self.fs.exists(path).await.map_err(ConfigError::Io)? {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let contents = self.fs.read_to_string(path).await.map_err(ConfigError::Io)?;
        let config: RawConfig = toml::from_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `heft.toml` from the project root if there is one.
    pub async fn discover(&self) -> Result<Option<RawConfig>, ConfigError> {
        let path = self.fs.project_root().join(CONFIG_FILE_NAME);
        match self.load_from(&path).await {
            Ok(config) => Ok(Some(config)),
            Err(ConfigError::ConfigNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModeName;
    use heft_fs::MemoryFileSystem;

    fn loader_with(contents: &str) -> ConfigLoader<MemoryFileSystem> {
        let fs = MemoryFileSystem::new("/project").unwrap();
        fs.add_file(CONFIG_FILE_NAME, contents).unwrap();
        ConfigLoader::new(Arc::new(fs))
    }

    #[tokio::test]
    async fn test_discover_reads_root_config() {
        let loader = loader_with("mode = \"json\"\nfile_name = \"bundle\"\ngzip_level = 6\n");
        let raw = loader.discover().await.unwrap().unwrap();

        assert_eq!(raw.mode, Some(ModeName::Json));
        assert_eq!(raw.file_name.as_deref(), Some("bundle"));
        assert_eq!(raw.gzip_level, Some(6));
    }

    #[tokio::test]
    async fn test_discover_without_file() {
        let loader = ConfigLoader::new(Arc::new(MemoryFileSystem::new("/project").unwrap()));
        assert!(loader.discover().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_from_missing_path() {
        let loader = ConfigLoader::new(Arc::new(MemoryFileSystem::new("/project").unwrap()));
        let result = loader.load_from(Path::new("/project/other.toml")).await;
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_key_is_rejected() {
        let loader = loader_with("analyzer_mode = \"static\"\n");
        assert!(matches!(loader.discover().await, Err(ConfigError::TomlDe(_))));
    }

    #[tokio::test]
    async fn test_default_sizes_parse_lowercase() {
        let loader = loader_with("default_sizes = \"gzip\"\nexclude = [\"**/*.css\"]\n");
        let raw = loader.discover().await.unwrap().unwrap();
        assert_eq!(raw.default_sizes, Some(heft_core::SizeKind::Gzip));
        assert_eq!(raw.exclude, Some(vec!["**/*.css".to_string()]));
    }
}
