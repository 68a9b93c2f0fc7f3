//! Run orchestration: config, collection, analysis, reports.

use crate::collect::collect_artifacts;
use anyhow::{bail, Context, Result};
use heft_config::{AnalyzerConfig, AnalyzerMode, ConfigLoader, RawConfig};
use heft_core::{Analysis, Analyzer};
use heft_fs::{normalize_lexically, FileSystem, NativeFileSystem};
use heft_report::{render_summary, ReportFormat, ReportSequence, ReportWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const STATIC_FORMATS: &[ReportFormat] = &[ReportFormat::Json, ReportFormat::Html];
const JSON_FORMATS: &[ReportFormat] = &[ReportFormat::Json];

/// Options for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Build output directory, relative to `root` unless absolute.
    pub out_dir: PathBuf,
    /// Workspace root (default: current directory).
    pub root: Option<PathBuf>,
    /// Explicit config file (default: `heft.toml` in the root, if present).
    pub config: Option<PathBuf>,
    /// Settings given on the command line; they win over the file.
    pub overrides: RawConfig,
    /// Print the analysis as JSON on stdout.
    pub json: bool,
}

/// What a run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub config: AnalyzerConfig,
    pub analysis: Analysis,
    pub reports: Vec<PathBuf>,
}

/// Runs the analysis with the given options.
pub async fn run(options: &RunOptions, sequence: &mut ReportSequence) -> Result<RunOutcome> {
    let root = match &options.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("Failed to get current working directory")?,
    };

    // Step 1: Scope all file access to the workspace root
    let fs = Arc::new(
        NativeFileSystem::new(&root)
            .with_context(|| format!("Invalid workspace root {}", root.display()))?,
    );
    let root = fs.project_root().to_path_buf();

    // Step 2: Resolve config (file, then flags) once
    let config = load_config(fs.clone(), options).await?;
    tracing::debug!(
        mode = config.mode.name().as_str(),
        gzip_level = config.gzip_level,
        "configuration resolved"
    );
    if let AnalyzerMode::Server { host, port, .. } = &config.mode {
        bail!(
            "Server mode ({}:{}) is not available in this build; use --mode static or --mode json",
            host,
            port
        );
    }

    // Step 3: Collect build output
    let output_dir = resolve_inside(&root, &options.out_dir)
        .context("The output directory must be inside the workspace root")?;
    let exists = fs
        .exists(&output_dir)
        .await
        .with_context(|| format!("Failed to check output directory {}", output_dir.display()))?;
    if !exists {
        bail!("Output directory {} does not exist", output_dir.display());
    }
    let report_dir = config.report_dir(&output_dir);

    let mut artifacts = collect_artifacts(fs.as_ref(), &output_dir).await?;
    drop_previous_reports(&mut artifacts, &config, &output_dir, &report_dir);

    // Step 4: Attribute sizes
    let analyzer = Analyzer::new(config.analysis_options(&root, &output_dir))
        .context("Failed to set up analyzer")?;
    let analysis = analyzer.analyze_concurrent(artifacts).await;
    tracing::info!(
        chunks = analysis.chunks.len(),
        diagnostics = analysis.diagnostics.len(),
        "analysis complete"
    );

    // Step 5: Write reports
    let reports = write_reports(fs, &config, &report_dir, &analysis, sequence).await?;

    // Step 6: Terminal output
    if options.json {
        let json = serde_json::to_string_pretty(&analysis).context("Failed to serialize analysis")?;
        println!("{}", json);
    } else if config.summary {
        print!("{}", render_summary(&analysis, config.default_sizes));
        for report in &reports {
            println!("Report written to {}", report.display());
        }
    }

    if matches!(config.mode, AnalyzerMode::Static { open: true, .. }) {
        if let Some(html) = html_report(&reports) {
            open_in_browser(html);
        }
    }

    Ok(RunOutcome {
        config,
        analysis,
        reports,
    })
}

async fn load_config(fs: Arc<NativeFileSystem>, options: &RunOptions) -> Result<AnalyzerConfig> {
    let loader = ConfigLoader::new(fs);
    let file = match &options.config {
        Some(path) => Some(
            loader
                .load_from(path)
                .await
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
        ),
        None => loader.discover().await.context("Failed to load heft.toml")?,
    };

    let raw = file.unwrap_or_default().overlay(options.overrides.clone());
    AnalyzerConfig::resolve(raw).context("Invalid configuration")
}

async fn write_reports<F: FileSystem>(
    fs: Arc<F>,
    config: &AnalyzerConfig,
    report_dir: &Path,
    analysis: &Analysis,
    sequence: &mut ReportSequence,
) -> Result<Vec<PathBuf>> {
    let (name, formats, writer) = match &config.mode {
        AnalyzerMode::Static {
            file_name,
            report_title,
            ..
        } => (
            file_name,
            STATIC_FORMATS,
            ReportWriter::new(fs, report_dir).with_title(report_title.as_str()),
        ),
        AnalyzerMode::Json { file_name } => (
            file_name,
            JSON_FORMATS,
            ReportWriter::new(fs, report_dir),
        ),
        AnalyzerMode::Server { .. } => return Ok(Vec::new()),
    };

    writer
        .with_default_sizes(config.default_sizes)
        .write(sequence, name, analysis, formats)
        .await
        .with_context(|| format!("Failed to write reports to {}", report_dir.display()))
}

/// Reports from earlier runs would otherwise be measured as assets.
fn drop_previous_reports(
    artifacts: &mut Vec<heft_core::Artifact>,
    config: &AnalyzerConfig,
    output_dir: &Path,
    report_dir: &Path,
) {
    let Some(name) = config.mode.file_name() else {
        return;
    };
    let Ok(prefix) = report_dir.strip_prefix(output_dir) else {
        return;
    };
    let prefix = prefix.to_string_lossy().replace('\\', "/");
    let prefix = if prefix.is_empty() {
        String::new()
    } else {
        format!("{}/", prefix)
    };

    artifacts.retain(|artifact| {
        let Some(stem) = artifact
            .file_name
            .strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_suffix(".json").or_else(|| rest.strip_suffix(".html")))
        else {
            return true;
        };
        let is_report = stem == name
            || stem
                .strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('-'))
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
        if is_report {
            tracing::debug!(file = %artifact.file_name, "skipping earlier report");
        }
        !is_report
    });
}

/// Joins `path` onto `root` and checks the result stays below it.
fn resolve_inside(root: &Path, path: &Path) -> Result<PathBuf> {
    let joined = root.join(path);
    let resolved = joined
        .canonicalize()
        .unwrap_or_else(|_| normalize_lexically(&joined));
    if !resolved.starts_with(root) {
        bail!("{} is outside {}", resolved.display(), root.display());
    }
    Ok(resolved)
}

/// The HTML page among the written reports, if any.
fn html_report(reports: &[PathBuf]) -> Option<&Path> {
    reports
        .iter()
        .find(|path| path.extension().is_some_and(|ext| ext == "html"))
        .map(PathBuf::as_path)
}

fn open_in_browser(path: &Path) {
    if let Err(e) = webbrowser::open(&path.to_string_lossy()) {
        tracing::warn!(report = %path.display(), "could not open report: {}", e);
    }
}
