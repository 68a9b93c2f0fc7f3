//! Core data types for heft analysis.

use crate::trie::Directory;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::path::PathBuf;

/// Whether a generated artifact is executable code or a static asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// A code chunk (JavaScript). Only chunks are attributed through source maps.
    Chunk,
    /// Any other emitted file (stylesheets, images, fonts).
    Asset,
}

/// One generated file handed over by the build tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name relative to the output directory (`assets/index-4f2a.js`).
    pub file_name: String,
    /// Chunk or asset.
    pub kind: ArtifactKind,
    /// Raw generated bytes.
    pub code: Vec<u8>,
    /// Raw source-map document paired with this artifact, if any.
    pub source_map: Option<String>,
}

impl Artifact {
    /// Creates a code chunk without a source map.
    pub fn chunk(file_name: impl Into<String>, code: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            kind: ArtifactKind::Chunk,
            code: code.into(),
            source_map: None,
        }
    }

    /// Creates a static asset.
    pub fn asset(file_name: impl Into<String>, code: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            kind: ArtifactKind::Asset,
            code: code.into(),
            source_map: None,
        }
    }

    /// Attaches a raw source map.
    pub fn with_source_map(mut self, source_map: impl Into<String>) -> Self {
        self.source_map = Some(source_map.into());
        self
    }
}

/// Which size a report ranks by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeKind {
    /// Minified byte size.
    #[default]
    Parsed,
    /// Gzip-compressed size.
    Gzip,
    /// Source-map contribution.
    Map,
}

/// Size metrics of one unit (module, chunk, or directory roll-up).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Byte length of the generated text.
    pub parsed_size: u64,
    /// Byte length of the gzip-compressed text.
    pub gzip_size: u64,
    /// Byte length of the serialized source-map contribution.
    pub map_size: u64,
}

impl Metrics {
    /// All sizes zero.
    pub const ZERO: Metrics = Metrics {
        parsed_size: 0,
        gzip_size: 0,
        map_size: 0,
    };

    /// Creates a metrics record.
    pub fn new(parsed_size: u64, gzip_size: u64, map_size: u64) -> Self {
        Self {
            parsed_size,
            gzip_size,
            map_size,
        }
    }

    /// Returns the size selected by `kind`.
    pub fn get(&self, kind: SizeKind) -> u64 {
        match kind {
            SizeKind::Parsed => self.parsed_size,
            SizeKind::Gzip => self.gzip_size,
            SizeKind::Map => self.map_size,
        }
    }

    /// True when every size is zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl Add for Metrics {
    type Output = Metrics;

    fn add(self, rhs: Metrics) -> Metrics {
        Metrics {
            parsed_size: self.parsed_size + rhs.parsed_size,
            gzip_size: self.gzip_size + rhs.gzip_size,
            map_size: self.map_size + rhs.map_size,
        }
    }
}

impl AddAssign for Metrics {
    fn add_assign(&mut self, rhs: Metrics) {
        *self = *self + rhs;
    }
}

impl Sum for Metrics {
    fn sum<I: Iterator<Item = Metrics>>(iter: I) -> Metrics {
        iter.fold(Metrics::ZERO, Add::add)
    }
}

/// Attribution result for one original module inside one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    /// Normalized module path, relative to the workspace root.
    pub id: String,
    /// Sizes of the text attributed to this module.
    #[serde(flatten)]
    pub metrics: Metrics,
    /// Reconstructed text, kept only when `retain_source` is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Whole-artifact result for one generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    /// File name relative to the output directory.
    pub file_name: String,
    /// Chunk or asset.
    pub kind: ArtifactKind,
    /// Sizes of the artifact itself, independent of attribution.
    #[serde(flatten)]
    pub metrics: Metrics,
    /// Modules attributed through the source map, in map order.
    pub modules: Vec<ModuleRecord>,
}

impl ChunkRecord {
    /// Sum of the module metrics. May differ from `metrics`.
    pub fn attributed(&self) -> Metrics {
        self.modules.iter().map(|m| m.metrics).sum()
    }
}

/// A recoverable problem or notable discrepancy found during analysis.
///
/// Diagnostics never stop a run; they are reported next to the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The chunk's source map failed to parse; the chunk was kept as a single leaf.
    MalformedSourceMap {
        /// Chunk file name.
        chunk: String,
        /// Parser message.
        message: String,
    },

    /// A module's mapping referenced a generated line that does not exist.
    MissingGeneratedLine {
        /// Chunk file name.
        chunk: String,
        /// Module id.
        module: String,
        /// Zero-based line index.
        line: u32,
        /// Lines present in the chunk.
        line_count: usize,
    },

    /// Attributed module bytes do not add up to the chunk's own size.
    AttributionDrift {
        /// Chunk file name.
        chunk: String,
        /// Parsed size of the chunk.
        parsed_size: u64,
        /// Sum of the parsed sizes of its modules.
        attributed_size: u64,
    },
}

impl Diagnostic {
    /// Returns the chunk this diagnostic belongs to.
    pub fn chunk(&self) -> &str {
        match self {
            Diagnostic::MalformedSourceMap { chunk, .. }
            | Diagnostic::MissingGeneratedLine { chunk, .. }
            | Diagnostic::AttributionDrift { chunk, .. } => chunk,
        }
    }
}

/// Options resolved once per analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Workspace root. Module ids are made relative to it.
    pub root: PathBuf,
    /// Directory the artifacts were emitted to. Relative source paths in a
    /// map resolve against the map's own directory below this one.
    pub output_dir: PathBuf,
    /// Gzip level (0-9) for compressed sizes.
    pub gzip_level: u32,
    /// Keep reconstructed module text in [`ModuleRecord::source`].
    pub retain_source: bool,
    /// Glob patterns; artifacts whose file name matches are skipped.
    pub exclude: Vec<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output_dir: PathBuf::from("dist"),
            gzip_level: 9,
            retain_source: false,
            exclude: Vec::new(),
        }
    }
}

/// The finished product of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Path tree with pre-computed roll-ups.
    pub tree: Directory,
    /// Per-artifact records in discovery order.
    pub chunks: Vec<ChunkRecord>,
    /// Recovered problems and drift notices.
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    /// Whole-build totals (sum of every artifact's own metrics).
    pub fn totals(&self) -> Metrics {
        self.tree.totals
    }
}
