//! Bundle orchestrator.
//!
//! Measures each artifact (decode, reconstruct, measure per module) and
//! folds the results into a single path tree in discovery order.

use crate::decoder::{self, SourceMappings};
use crate::error::{Error, Result};
use crate::fragment;
use crate::metrics::MetricsComputer;
use crate::paths::normalize_module_id;
use crate::reconstruct::GeneratedLines;
use crate::trie::{ChunkNode, Directory, Leaf, TreeNode};
use crate::types::{
    Analysis, AnalysisOptions, Artifact, ArtifactKind, ChunkRecord, Diagnostic, Metrics,
    ModuleRecord,
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// One artifact's measurements, ready for insertion.
#[derive(Debug, Clone)]
pub struct MeasuredChunk {
    /// Whole-artifact and per-module records.
    pub record: ChunkRecord,
    /// Problems recovered while measuring.
    pub diagnostics: Vec<Diagnostic>,
}

/// Single owner of the in-progress tree.
#[derive(Debug)]
pub struct TreeBuilder {
    tree: Directory,
    chunks: Vec<ChunkRecord>,
    diagnostics: Vec<Diagnostic>,
}

impl TreeBuilder {
    /// Starts an empty tree whose root is named `root_name`.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            tree: Directory::new(root_name),
            chunks: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Inserts one measured artifact.
    ///
    /// Assets become single leaves. Chunks become a chunk node carrying their
    /// own metrics, with every module of nonzero size nested below it.
    pub fn add(&mut self, measured: MeasuredChunk) {
        let MeasuredChunk { record, diagnostics } = measured;

        let node = match record.kind {
            ArtifactKind::Asset => TreeNode::Asset(Leaf::new(&record.file_name, record.metrics)),
            ArtifactKind::Chunk => {
                let mut chunk = ChunkNode::new(&record.file_name, record.metrics);
                for module in record.modules.iter().filter(|m| !m.metrics.is_zero()) {
                    chunk.insert_module(&module.id, module.metrics);
                }
                TreeNode::Chunk(chunk)
            }
        };

        self.tree.insert(&record.file_name, node);
        self.chunks.push(record);
        self.diagnostics.extend(diagnostics);
    }

    /// Hands the finished tree over.
    pub fn finish(self) -> Analysis {
        Analysis {
            tree: self.tree,
            chunks: self.chunks,
            diagnostics: self.diagnostics,
        }
    }
}

/// Attributes artifacts to original modules and aggregates them.
///
/// Cheap to clone; clones share options and the compressor.
#[derive(Debug, Clone)]
pub struct Analyzer {
    options: Arc<AnalysisOptions>,
    metrics: MetricsComputer,
    exclude: Arc<GlobSet>,
}

impl Analyzer {
    /// Creates an analyzer using gzip at `options.gzip_level`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] if an exclude pattern is invalid.
    pub fn new(options: AnalysisOptions) -> Result<Self> {
        let metrics = MetricsComputer::gzip(options.gzip_level);
        Self::with_metrics(options, metrics)
    }

    /// Creates an analyzer with a custom metrics computer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] if an exclude pattern is invalid.
    pub fn with_metrics(options: AnalysisOptions, metrics: MetricsComputer) -> Result<Self> {
        let exclude = build_exclude_set(&options.exclude)?;
        Ok(Self {
            options: Arc::new(options),
            metrics,
            exclude: Arc::new(exclude),
        })
    }

    /// Options this analyzer was built with.
    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// True if `file_name` matches an exclude pattern.
    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.exclude.is_match(file_name)
    }

    /// Creates a tree builder rooted at the workspace name.
    pub fn tree_builder(&self) -> TreeBuilder {
        TreeBuilder::new(root_name(&self.options.root))
    }

    /// Measures and inserts one artifact. Excluded artifacts are ignored.
    pub fn process_chunk(&self, builder: &mut TreeBuilder, artifact: &Artifact) {
        if self.is_excluded(&artifact.file_name) {
            debug!(chunk = %artifact.file_name, "excluded");
            return;
        }
        builder.add(self.measure(artifact));
    }

    /// Processes artifacts one after another, in the given order.
    pub fn analyze(&self, artifacts: &[Artifact]) -> Analysis {
        let mut builder = self.tree_builder();
        for artifact in artifacts {
            self.process_chunk(&mut builder, artifact);
        }
        builder.finish()
    }

    /// Measures artifacts on the blocking pool, then inserts them in the given order.
    ///
    /// A measurement task that panics drops only its own artifact.
    pub async fn analyze_concurrent(&self, artifacts: Vec<Artifact>) -> Analysis {
        let handles: Vec<_> = artifacts
            .into_iter()
            .filter(|artifact| {
                let excluded = self.is_excluded(&artifact.file_name);
                if excluded {
                    debug!(chunk = %artifact.file_name, "excluded");
                }
                !excluded
            })
            .map(|artifact| {
                let analyzer = self.clone();
                tokio::task::spawn_blocking(move || analyzer.measure(&artifact))
            })
            .collect();

        let mut builder = self.tree_builder();
        for handle in handles {
            match handle.await {
                Ok(measured) => builder.add(measured),
                Err(err) => warn!(error = %err, "chunk measurement task failed"),
            }
        }
        builder.finish()
    }

    /// Measures one artifact without touching any tree.
    pub fn measure(&self, artifact: &Artifact) -> MeasuredChunk {
        let map_size = artifact
            .source_map
            .as_ref()
            .map_or(0, |map| map.len() as u64);
        let metrics = self.metrics.measure(&artifact.code, map_size);
        let mut diagnostics = Vec::new();

        let mut decoded = false;
        let modules = match (artifact.kind, &artifact.source_map) {
            (ArtifactKind::Chunk, Some(raw)) => match decoder::decode(raw.as_bytes()) {
                Ok(mappings) => {
                    decoded = true;
                    self.attribute(artifact, &mappings, &mut diagnostics)
                }
                Err(err) => {
                    warn!(
                        chunk = %artifact.file_name,
                        error = %err,
                        "source map could not be decoded; keeping the chunk whole"
                    );
                    diagnostics.push(Diagnostic::MalformedSourceMap {
                        chunk: artifact.file_name.clone(),
                        message: err.to_string(),
                    });
                    Vec::new()
                }
            },
            _ => Vec::new(),
        };

        debug!(
            chunk = %artifact.file_name,
            modules = modules.len(),
            parsed = metrics.parsed_size,
            gzip = metrics.gzip_size,
            "measured artifact"
        );

        let record = ChunkRecord {
            file_name: artifact.file_name.clone(),
            kind: artifact.kind,
            metrics,
            modules,
        };
        let attributed_size = record.attributed().parsed_size;
        if decoded && attributed_size != metrics.parsed_size {
            diagnostics.push(Diagnostic::AttributionDrift {
                chunk: artifact.file_name.clone(),
                parsed_size: metrics.parsed_size,
                attributed_size,
            });
        }

        MeasuredChunk { record, diagnostics }
    }

    fn attribute(
        &self,
        artifact: &Artifact,
        mappings: &SourceMappings,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<ModuleRecord> {
        let lines = GeneratedLines::new(&artifact.code);
        let map_dir = self.map_dir(&artifact.file_name);

        mappings
            .iter()
            .map(|(source, module)| {
                let id = normalize_module_id(source, &map_dir, &self.options.root);
                let rebuilt = lines.reconstruct(&module.entries);

                for &line in &rebuilt.missing_lines {
                    let err = Error::MissingGeneratedLine {
                        line,
                        line_count: lines.len(),
                    };
                    warn!(chunk = %artifact.file_name, module = %id, "{}", err);
                    diagnostics.push(Diagnostic::MissingGeneratedLine {
                        chunk: artifact.file_name.clone(),
                        module: id.clone(),
                        line,
                        line_count: lines.len(),
                    });
                }

                let metrics = if rebuilt.text.is_empty() {
                    Metrics::ZERO
                } else {
                    self.metrics.measure(
                        rebuilt.text.as_bytes(),
                        fragment::fragment_size(source, module),
                    )
                };

                ModuleRecord {
                    id,
                    metrics,
                    source: self.options.retain_source.then_some(rebuilt.text),
                }
            })
            .collect()
    }

    fn map_dir(&self, file_name: &str) -> PathBuf {
        let parent = Path::new(file_name).parent().unwrap_or(Path::new(""));
        self.options.output_dir.join(parent)
    }
}

fn build_exclude_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::Pattern(format!("invalid exclude pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::Pattern(format!("failed to build exclude patterns: {}", e)))
}

fn root_name(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}
