//! Configuration for Heft.
//!
//! Settings arrive in two loose layers, a `heft.toml` file and command-line
//! flags, both parsed into [`RawConfig`]. The layers are overlaid and then
//! resolved exactly once into an [`AnalyzerConfig`], which is what the rest
//! of the program passes around.

pub mod loader;
pub mod types;

pub use loader::{ConfigError, ConfigLoader, CONFIG_FILE_NAME};
pub use types::{AnalyzerConfig, AnalyzerMode, DefaultSizes, ModeName, RawConfig};
