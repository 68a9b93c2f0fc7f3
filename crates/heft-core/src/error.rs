//! Error types for heft core.

use thiserror::Error;

/// Result type for heft core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while attributing a chunk.
///
/// None of these abort an analysis run. The analyzer recovers from each of
/// them locally and records a [`Diagnostic`](crate::types::Diagnostic).
#[derive(Debug, Error)]
pub enum Error {
    /// The source-map document could not be parsed.
    #[error("Malformed source map: {message}")]
    MalformedSourceMap {
        /// Parser message.
        message: String,
    },

    /// A mapping points at a generated line the artifact does not have.
    #[error("Generated line {line} is past the end of the artifact ({line_count} lines)")]
    MissingGeneratedLine {
        /// Zero-based generated line referenced by the mapping.
        line: u32,
        /// Number of lines actually present.
        line_count: usize,
    },

    /// An exclude pattern failed to compile.
    #[error("Pattern error: {0}")]
    Pattern(String),
}

impl From<sourcemap::Error> for Error {
    fn from(err: sourcemap::Error) -> Self {
        Error::MalformedSourceMap {
            message: err.to_string(),
        }
    }
}
