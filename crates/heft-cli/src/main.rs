//! Heft CLI - attribute build output size to source modules.

use anyhow::Result;
use clap::Parser;
use heft_cli::{run, RunOptions};
use heft_config::{ModeName, RawConfig};
use heft_core::SizeKind;
use heft_report::ReportSequence;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "heft")]
#[command(about = "Attribute the size of a build's output back to its source modules", long_about = None)]
struct Cli {
    /// Build output directory to analyze
    ///
    /// Examples:
    ///   heft                       # analyzes ./dist
    ///   heft build --mode json     # JSON report for ./build
    ///   heft dist --json | jq .    # print the analysis instead of a summary
    #[arg(value_name = "OUT_DIR", default_value = "dist")]
    out_dir: PathBuf,

    /// Workspace root module paths are made relative to (default: current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// What to do with the analysis
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Report file name, without extension
    #[arg(long)]
    file_name: Option<String>,

    /// Directory for reports, relative to the output directory
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Title of the HTML report
    #[arg(long)]
    title: Option<String>,

    /// Configuration file path (default: heft.toml in the root)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip artifacts matching a glob (can be specified multiple times)
    #[arg(long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Size the summary and the HTML report rank by
    #[arg(long, value_enum)]
    default_sizes: Option<SizeArg>,

    /// Gzip level used for compressed sizes (0-9)
    #[arg(long)]
    gzip_level: Option<u32>,

    /// Print the size summary after the run
    #[arg(long, value_name = "BOOL")]
    summary: Option<bool>,

    /// Open the HTML report when done
    #[arg(long)]
    open: bool,

    /// Keep reconstructed module text in the JSON report
    #[arg(long)]
    retain_source: bool,

    /// Verbose output
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the analysis as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ModeArg {
    Server,
    Static,
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SizeArg {
    Parsed,
    Gzip,
    Map,
}

impl Cli {
    /// Flags as a config layer; unset flags leave the file's values alone.
    fn overrides(&self) -> RawConfig {
        RawConfig {
            mode: self.mode.map(|mode| match mode {
                ModeArg::Server => ModeName::Server,
                ModeArg::Static => ModeName::Static,
                ModeArg::Json => ModeName::Json,
            }),
            file_name: self.file_name.clone(),
            report_title: self.title.clone(),
            report_dir: self.report_dir.clone(),
            host: None,
            port: None,
            open: self.open.then_some(true),
            default_sizes: self.default_sizes.map(|size| match size {
                SizeArg::Parsed => SizeKind::Parsed,
                SizeArg::Gzip => SizeKind::Gzip,
                SizeArg::Map => SizeKind::Map,
            }),
            summary: self.summary,
            gzip_level: self.gzip_level,
            retain_source: self.retain_source.then_some(true),
            exclude: (!self.exclude.is_empty()).then(|| self.exclude.clone()),
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = RunOptions {
        out_dir: cli.out_dir.clone(),
        root: cli.root.clone(),
        config: cli.config.clone(),
        overrides: cli.overrides(),
        json: cli.json,
    };

    let mut sequence = ReportSequence::new();
    run(&options, &mut sequence).await?;
    Ok(())
}
