//! Heft CLI library components.
//!
//! The `heft` binary is in `main.rs`; artifact collection and the run
//! pipeline live here so they can be tested without spawning a process.

pub mod collect;
pub mod run;

pub use collect::{collect_artifacts, source_mapping_url, SourceMapUrl};
pub use run::{run, RunOptions, RunOutcome};
