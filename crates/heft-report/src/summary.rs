//! Terminal size table.

use colored::*;
use heft_core::{Analysis, ArtifactKind, ChunkRecord, Diagnostic, SizeKind};
use std::fmt::Write;

/// Formats a byte count for display.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Renders the per-artifact table, largest first by `sort_by`, followed by
/// the totals and any diagnostics.
pub fn render_summary(analysis: &Analysis, sort_by: SizeKind) -> String {
    let mut chunks: Vec<&ChunkRecord> = analysis.chunks.iter().collect();
    // Stable: equal sizes keep discovery order
    chunks.sort_by(|a, b| b.metrics.get(sort_by).cmp(&a.metrics.get(sort_by)));

    let name_width = chunks
        .iter()
        .map(|chunk| chunk.file_name.len())
        .chain(std::iter::once("Artifact".len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        format!(
            "{:<name_width$}  {:>12}  {:>12}  {:>12}  {:>7}",
            "Artifact", "Parsed", "Gzip", "Map", "Modules"
        )
        .bold()
    );

    for chunk in &chunks {
        let name = match chunk.kind {
            ArtifactKind::Chunk => chunk.file_name.normal(),
            ArtifactKind::Asset => chunk.file_name.dimmed(),
        };
        let _ = writeln!(
            out,
            "{}{}  {:>12}  {:>12}  {:>12}  {:>7}",
            name,
            " ".repeat(name_width.saturating_sub(chunk.file_name.len())),
            format_bytes(chunk.metrics.parsed_size),
            format_bytes(chunk.metrics.gzip_size),
            format_bytes(chunk.metrics.map_size),
            chunk.modules.len(),
        );
    }

    let totals = analysis.totals();
    let _ = writeln!(
        out,
        "{}",
        format!(
            "{:<name_width$}  {:>12}  {:>12}  {:>12}",
            "Total",
            format_bytes(totals.parsed_size),
            format_bytes(totals.gzip_size),
            format_bytes(totals.map_size),
        )
        .bold()
    );

    if !analysis.diagnostics.is_empty() {
        let _ = writeln!(out);
        for diagnostic in &analysis.diagnostics {
            let _ = writeln!(out, "{}", describe(diagnostic));
        }
    }

    out
}

fn describe(diagnostic: &Diagnostic) -> String {
    let (label, detail) = match diagnostic {
        Diagnostic::MalformedSourceMap { message, .. } => (
            "error".red().bold(),
            format!("source map could not be read ({})", message),
        ),
        Diagnostic::MissingGeneratedLine {
            module,
            line,
            line_count,
            ..
        } => (
            "warning".yellow().bold(),
            format!(
                "{} maps to line {} but the file has {} lines",
                module,
                line + 1,
                line_count
            ),
        ),
        Diagnostic::AttributionDrift {
            parsed_size,
            attributed_size,
            ..
        } => (
            "note".cyan().bold(),
            format!(
                "modules account for {} of {}",
                format_bytes(*attributed_size),
                format_bytes(*parsed_size)
            ),
        ),
    };
    format!("{} {}: {}", label, diagnostic.chunk(), detail)
}
