//! Writes reports through the filesystem boundary.

use crate::error::{ReportError, Result};
use crate::html::render_html;
use crate::naming::ReportSequence;
use heft_core::{Analysis, SizeKind};
use heft_fs::FileSystem;
use std::path::PathBuf;
use std::sync::Arc;

/// Report file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    Json,
    Html,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
        }
    }
}

/// Persists analyses into one report directory.
pub struct ReportWriter<F: FileSystem> {
    fs: Arc<F>,
    dir: PathBuf,
    title: String,
    default_sizes: SizeKind,
}

impl<F: FileSystem> ReportWriter<F> {
    pub fn new(fs: Arc<F>, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dir: dir.into(),
            title: "Heft bundle report".to_string(),
            default_sizes: SizeKind::default(),
        }
    }

    /// Page title for HTML output.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Size the HTML page ranks by when it opens.
    pub fn with_default_sizes(mut self, default_sizes: SizeKind) -> Self {
        self.default_sizes = default_sizes;
        self
    }

    /// Writes `analysis` in every requested format under one shared stem.
    ///
    /// The stem is `name` unless one of its files already exists, in which
    /// case `sequence` supplies `name-<n>`. Returns the written paths in
    /// the order of `formats`.
    pub async fn write(
        &self,
        sequence: &mut ReportSequence,
        name: &str,
        analysis: &Analysis,
        formats: &[ReportFormat],
    ) -> Result<Vec<PathBuf>> {
        self.fs.create_dir_all(&self.dir).await?;

        let extensions: Vec<&str> = formats.iter().map(ReportFormat::extension).collect();
        let stem = sequence
            .reserve(self.fs.as_ref(), &self.dir, name, &extensions)
            .await?;

        let mut written = Vec::with_capacity(formats.len());
        for format in formats {
            let contents = match format {
                ReportFormat::Json => serde_json::to_string_pretty(analysis)?,
                ReportFormat::Html => render_html(&self.title, self.default_sizes, analysis)?,
            };
            let path = self.dir.join(format!("{}.{}", stem, format.extension()));
            self.fs
                .write(&path, contents.as_bytes())
                .await
                .map_err(|source| ReportError::Write {
                    path: path.clone(),
                    source,
                })?;
            tracing::info!(path = %path.display(), "wrote report");
            written.push(path);
        }

        Ok(written)
    }
}
