use crate::loader::ConfigError;
use globset::Glob;
use heft_core::{AnalysisOptions, SizeKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which size the summary and the HTML page rank by.
pub type DefaultSizes = SizeKind;

/// Mode selector as written in `heft.toml` or on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeName {
    /// Serve the report over HTTP.
    Server,
    /// Write a self-contained HTML report.
    #[default]
    Static,
    /// Write the JSON report only.
    Json,
}

impl ModeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeName::Server => "server",
            ModeName::Static => "static",
            ModeName::Json => "json",
        }
    }
}

/// Loose settings layer.
///
/// Every field is optional so a file and a set of flags can be overlaid
/// before anything is validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    pub mode: Option<ModeName>,

    /// Report base name, without extension.
    pub file_name: Option<String>,

    /// Title of the HTML page.
    pub report_title: Option<String>,

    /// Where reports are written (default: the output directory).
    pub report_dir: Option<PathBuf>,

    pub host: Option<String>,
    pub port: Option<u16>,

    /// Open the report once written.
    pub open: Option<bool>,

    pub default_sizes: Option<DefaultSizes>,

    /// Print the size table after the run.
    pub summary: Option<bool>,

    /// Gzip level 0-9.
    pub gzip_level: Option<u32>,

    /// Keep reconstructed module text in the JSON report.
    pub retain_source: Option<bool>,

    /// Glob patterns for artifacts to skip.
    pub exclude: Option<Vec<String>>,
}

impl RawConfig {
    /// Layers `overrides` on top of `self`; any field set in `overrides` wins.
    pub fn overlay(self, overrides: RawConfig) -> RawConfig {
        RawConfig {
            mode: overrides.mode.or(self.mode),
            file_name: overrides.file_name.or(self.file_name),
            report_title: overrides.report_title.or(self.report_title),
            report_dir: overrides.report_dir.or(self.report_dir),
            host: overrides.host.or(self.host),
            port: overrides.port.or(self.port),
            open: overrides.open.or(self.open),
            default_sizes: overrides.default_sizes.or(self.default_sizes),
            summary: overrides.summary.or(self.summary),
            gzip_level: overrides.gzip_level.or(self.gzip_level),
            retain_source: overrides.retain_source.or(self.retain_source),
            exclude: overrides.exclude.or(self.exclude),
        }
    }
}

/// What to do with the finished analysis. Each variant only carries the
/// settings that mean something for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum AnalyzerMode {
    Server { host: String, port: u16, open: bool },
    Static {
        file_name: String,
        report_title: String,
        open: bool,
    },
    Json { file_name: String },
}

impl AnalyzerMode {
    /// The tag this mode was selected by.
    pub fn name(&self) -> ModeName {
        match self {
            AnalyzerMode::Server { .. } => ModeName::Server,
            AnalyzerMode::Static { .. } => ModeName::Static,
            AnalyzerMode::Json { .. } => ModeName::Json,
        }
    }

    /// Report base name for the file-writing modes.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            AnalyzerMode::Static { file_name, .. } | AnalyzerMode::Json { file_name } => {
                Some(file_name)
            }
            AnalyzerMode::Server { .. } => None,
        }
    }
}

/// Validated settings, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzerConfig {
    pub mode: AnalyzerMode,
    pub report_dir: Option<PathBuf>,
    pub default_sizes: DefaultSizes,
    pub summary: bool,
    pub gzip_level: u32,
    pub retain_source: bool,
    pub exclude: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            mode: AnalyzerMode::Static {
                file_name: default_file_name(),
                report_title: default_report_title(),
                open: false,
            },
            report_dir: None,
            default_sizes: DefaultSizes::default(),
            summary: default_true(),
            gzip_level: default_gzip_level(),
            retain_source: false,
            exclude: Vec::new(),
        }
    }
}

impl AnalyzerConfig {
    /// Validates a raw layer and fills in defaults.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::InvalidGzipLevel`] for a level above 9
    /// * [`ConfigError::EmptyFileName`] for a blank or path-like report name
    /// * [`ConfigError::InvalidPattern`] for an exclude glob that doesn't parse
    pub fn resolve(raw: RawConfig) -> Result<Self, ConfigError> {
        let mode_name = raw.mode.unwrap_or_default();

        let gzip_level = raw.gzip_level.unwrap_or_else(default_gzip_level);
        if gzip_level > 9 {
            return Err(ConfigError::InvalidGzipLevel(gzip_level));
        }

        let exclude = raw.exclude.unwrap_or_default();
        for pattern in &exclude {
            Glob::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        }

        let open = raw.open.unwrap_or(false);
        let mode = match mode_name {
            ModeName::Server => {
                ignored_for_mode(mode_name, "file_name", raw.file_name.is_some());
                ignored_for_mode(mode_name, "report_title", raw.report_title.is_some());
                AnalyzerMode::Server {
                    host: raw.host.unwrap_or_else(default_host),
                    port: raw.port.unwrap_or_else(default_port),
                    open,
                }
            }
            ModeName::Static => {
                ignored_for_mode(mode_name, "host", raw.host.is_some());
                ignored_for_mode(mode_name, "port", raw.port.is_some());
                AnalyzerMode::Static {
                    file_name: validate_file_name(raw.file_name)?,
                    report_title: raw.report_title.unwrap_or_else(default_report_title),
                    open,
                }
            }
            ModeName::Json => {
                ignored_for_mode(mode_name, "host", raw.host.is_some());
                ignored_for_mode(mode_name, "port", raw.port.is_some());
                ignored_for_mode(mode_name, "report_title", raw.report_title.is_some());
                ignored_for_mode(mode_name, "open", raw.open.is_some());
                AnalyzerMode::Json {
                    file_name: validate_file_name(raw.file_name)?,
                }
            }
        };

        Ok(Self {
            mode,
            report_dir: raw.report_dir,
            default_sizes: raw.default_sizes.unwrap_or_default(),
            summary: raw.summary.unwrap_or_else(default_true),
            gzip_level,
            retain_source: raw.retain_source.unwrap_or(false),
            exclude,
        })
    }

    /// Options for the analyzer, given the workspace root and output directory.
    pub fn analysis_options(&self, root: &Path, output_dir: &Path) -> AnalysisOptions {
        AnalysisOptions {
            root: root.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            gzip_level: self.gzip_level,
            retain_source: self.retain_source,
            exclude: self.exclude.clone(),
        }
    }

    /// Directory reports go to: `report_dir` (relative to the output
    /// directory) or the output directory itself.
    pub fn report_dir(&self, output_dir: &Path) -> PathBuf {
        match &self.report_dir {
            Some(dir) => output_dir.join(dir),
            None => output_dir.to_path_buf(),
        }
    }
}

fn ignored_for_mode(mode: ModeName, field: &str, is_set: bool) {
    if is_set {
        tracing::warn!(mode = mode.as_str(), field, "setting has no effect in this mode");
    }
}

fn validate_file_name(file_name: Option<String>) -> Result<String, ConfigError> {
    let file_name = file_name.unwrap_or_else(default_file_name);
    let trimmed = file_name.trim();
    if trimmed.is_empty() || trimmed.contains(['/', '\\']) {
        return Err(ConfigError::EmptyFileName(file_name));
    }
    Ok(trimmed.to_string())
}

// Default value functions
fn default_file_name() -> String {
    "stats".to_string()
}

fn default_report_title() -> String {
    "Heft bundle report".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_gzip_level() -> u32 {
    heft_core::metrics::DEFAULT_GZIP_LEVEL
}

fn default_true() -> bool {
    true
}
