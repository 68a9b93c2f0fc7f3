//! Attribution reconstructor.
//!
//! Rebuilds the generated text attributable to one module from its mapping
//! entries. Mapping columns count UTF-16 code units while sizes count UTF-8
//! bytes, so each referenced line is decoded before it is sliced. A line is
//! decoded at most once per chunk, however many modules reference it.

use crate::decoder::MappingEntry;
use crate::error::{Error, Result};
use std::cell::OnceCell;

/// Generated artifact split into lines once and shared by every module of a chunk.
#[derive(Debug, Clone)]
pub struct GeneratedLines<'a> {
    lines: Vec<&'a [u8]>,
    units: Vec<OnceCell<Vec<u16>>>,
}

/// Text attributed to one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconstruction {
    /// Concatenated slices, in line-then-column order.
    pub text: String,
    /// Referenced lines that the artifact does not have.
    pub missing_lines: Vec<u32>,
}

impl Reconstruction {
    /// UTF-8 byte length of the reconstructed text.
    pub fn byte_len(&self) -> u64 {
        self.text.len() as u64
    }
}

impl<'a> GeneratedLines<'a> {
    /// Splits `code` at line feeds.
    pub fn new(code: &'a [u8]) -> Self {
        let lines: Vec<&'a [u8]> = code.split(|byte| *byte == b'\n').collect();
        let units = vec![OnceCell::new(); lines.len()];
        Self { lines, units }
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True for an artifact with no lines (never the case for `split`).
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Raw bytes of one line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingGeneratedLine`] when `line` is out of range.
    pub fn line(&self, line: u32) -> Result<&'a [u8]> {
        self.lines
            .get(line as usize)
            .copied()
            .ok_or(Error::MissingGeneratedLine {
                line,
                line_count: self.lines.len(),
            })
    }

    /// UTF-16 code units of one line, decoded on first use.
    fn line_units(&self, line: u32) -> Result<&[u16]> {
        let bytes = self.line(line)?;
        let units = self.units[line as usize]
            .get_or_init(|| String::from_utf8_lossy(bytes).encode_utf16().collect());
        Ok(units)
    }

    /// Reconstructs the text covered by `entries`.
    ///
    /// `entries` must be sorted by generated line, then generated column, as
    /// produced by [`decode`](crate::decoder::decode).
    pub fn reconstruct(&self, entries: &[MappingEntry]) -> Reconstruction {
        let mut rebuilt = Reconstruction::default();

        for line_entries in entries.chunk_by(|a, b| a.generated_line == b.generated_line) {
            let line_number = line_entries[0].generated_line;
            let units = match self.line_units(line_number) {
                Ok(units) => units,
                Err(_) => {
                    rebuilt.missing_lines.push(line_number);
                    continue;
                }
            };

            for index in 0..line_entries.len() {
                let (start, end) = column_range(line_entries, index, units.len());
                if start < end {
                    rebuilt
                        .text
                        .push_str(&String::from_utf16_lossy(&units[start..end]));
                }
            }
        }

        rebuilt
    }
}

/// UTF-16 range `[start, end)` covered by `line_entries[index]`.
fn column_range(line_entries: &[MappingEntry], index: usize, line_len: usize) -> (usize, usize) {
    let entry = &line_entries[index];
    let start = (entry.generated_column as usize).min(line_len);

    let end = match entry.last_generated_column {
        None => line_len,
        Some(last) => match line_entries.get(index + 1) {
            Some(next) if u64::from(next.generated_column) == u64::from(last) + 1 => {
                next.generated_column as usize
            }
            _ => last as usize + 1,
        },
    };

    (start, end.clamp(start, line_len))
}
