//! Heft Core - size attribution and aggregation for build output.
//!
//! Given the generated artifacts of a build and their source maps, this crate
//! works out how many bytes each original module contributes and folds the
//! numbers into a path tree ready for treemap rendering:
//!
//! - [`decoder`]: source map → per-module mapping entries
//! - [`reconstruct`]: mapping entries → attributed text (UTF-16 aware)
//! - [`metrics`]: text → parsed / gzip / map sizes
//! - [`trie`]: path tree with roll-ups at every directory
//! - [`Analyzer`]: runs the pipeline per artifact and owns the tree
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │    heft-cli     │  (reads the output dir, writes reports)
//! └────────┬────────┘
//!          │ Vec<Artifact>
//!          ▼
//! ┌─────────────────┐
//! │   heft-core     │  (this crate - no I/O)
//! └────────┬────────┘
//!          │ Analysis
//!          ▼
//! ┌─────────────────┐
//! │   heft-report   │  (JSON / HTML / summary)
//! └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use heft_core::{AnalysisOptions, Analyzer, Artifact};
//!
//! let analyzer = Analyzer::new(AnalysisOptions::default())?;
//! let artifacts = vec![
//!     Artifact::chunk("assets/index.js", std::fs::read("dist/assets/index.js")?)
//!         .with_source_map(std::fs::read_to_string("dist/assets/index.js.map")?),
//! ];
//!
//! let analysis = analyzer.analyze(&artifacts);
//! println!("{} bytes in total", analysis.totals().parsed_size);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analyzer;
pub mod decoder;
pub mod error;
pub mod fragment;
pub mod metrics;
pub mod paths;
pub mod reconstruct;
pub mod trie;
pub mod types;

// Re-export core types for convenience
pub use analyzer::{Analyzer, MeasuredChunk, TreeBuilder};
pub use error::{Error, Result};
pub use metrics::{Compressor, GzipCompressor, MetricsComputer};
pub use trie::{ChunkNode, Directory, Leaf, TreeNode};
pub use types::{
    Analysis, AnalysisOptions, Artifact, ArtifactKind, ChunkRecord, Diagnostic, Metrics,
    ModuleRecord, SizeKind,
};
