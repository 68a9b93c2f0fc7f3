//! Metrics computer: parsed, gzip and map sizes.

use crate::types::Metrics;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::warn;

/// Default gzip level.
pub const DEFAULT_GZIP_LEVEL: u32 = 9;

/// Pure compression boundary used for compressed sizes.
pub trait Compressor: Send + Sync + fmt::Debug {
    /// Compresses `bytes` at the compressor's fixed quality.
    fn compress(&self, bytes: &[u8]) -> io::Result<Vec<u8>>;
}

/// Gzip compressor backed by `flate2`.
#[derive(Debug, Clone, Copy)]
pub struct GzipCompressor {
    level: Compression,
}

impl GzipCompressor {
    /// Creates a compressor at `level` (clamped to 0-9).
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }

    /// The configured level.
    pub fn level(&self) -> u32 {
        self.level.level()
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new(DEFAULT_GZIP_LEVEL)
    }
}

impl Compressor for GzipCompressor {
    fn compress(&self, bytes: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), self.level);
        encoder.write_all(bytes)?;
        encoder.finish()
    }
}

/// Produces [`Metrics`] for modules and chunks.
#[derive(Debug, Clone)]
pub struct MetricsComputer {
    compressor: Arc<dyn Compressor>,
}

impl MetricsComputer {
    /// Uses the given compressor for compressed sizes.
    pub fn new(compressor: Arc<dyn Compressor>) -> Self {
        Self { compressor }
    }

    /// Uses gzip at `level`.
    pub fn gzip(level: u32) -> Self {
        Self::new(Arc::new(GzipCompressor::new(level)))
    }

    /// Compressed byte length of `bytes`; 0 for empty input.
    pub fn compressed_size(&self, bytes: &[u8]) -> u64 {
        if bytes.is_empty() {
            return 0;
        }
        match self.compressor.compress(bytes) {
            Ok(compressed) => compressed.len() as u64,
            Err(err) => {
                warn!(error = %err, "compression failed; reporting a compressed size of 0");
                0
            }
        }
    }

    /// Measures `text` with a known map contribution.
    ///
    /// Empty text measures as all zeros, map contribution included.
    pub fn measure(&self, text: &[u8], map_size: u64) -> Metrics {
        if text.is_empty() {
            return Metrics::ZERO;
        }
        Metrics {
            parsed_size: text.len() as u64,
            gzip_size: self.compressed_size(text),
            map_size,
        }
    }
}

impl Default for MetricsComputer {
    fn default() -> Self {
        Self::gzip(DEFAULT_GZIP_LEVEL)
    }
}
