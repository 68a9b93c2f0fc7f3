//! End-to-end runs against a build directory on disk.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use heft_cli::{collect_artifacts, run, RunOptions};
use heft_config::{ModeName, RawConfig};
use heft_core::ArtifactKind;
use heft_fs::{FileSystem, NativeFileSystem};
use heft_report::ReportSequence;
use sourcemap::SourceMapBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Tokens are `(generated_line, generated_column, source index)`.
fn map_json(sources: &[&str], tokens: &[(u32, u32, u32)]) -> String {
    let mut builder = SourceMapBuilder::new(None);
    for source in sources {
        builder.add_source(source);
    }
    for &(line, column, source) in tokens {
        builder.add_raw(line, column, line, 0, Some(source), None, false);
    }
    let mut out = Vec::new();
    builder.into_sourcemap().to_writer(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

/// `dist/assets/index.js` (sibling map), `dist/assets/vendor.js` (inline
/// map), `dist/assets/index.css` and an unrelated `dist/assets/index.css.map`.
fn build_fixture() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let assets = temp_dir.path().join("dist/assets");
    fs::create_dir_all(&assets).unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();

    fs::write(assets.join("index.js"), format!("{}{}", "a".repeat(60), "b".repeat(40))).unwrap();
    fs::write(
        assets.join("index.js.map"),
        map_json(
            &["../../src/main.ts", "../../src/util.ts"],
            &[(0, 0, 0), (0, 60, 1)],
        ),
    )
    .unwrap();

    let vendor_map = map_json(&["../../node_modules/react/index.js"], &[(0, 0, 0)]);
    fs::write(
        assets.join("vendor.js"),
        format!(
            "react();\n//# sourceMappingURL=data:application/json;base64,{}\n",
            BASE64_STANDARD.encode(vendor_map)
        ),
    )
    .unwrap();

    fs::write(assets.join("index.css"), "body{margin:0}").unwrap();
    fs::write(assets.join("index.css.map"), "{}").unwrap();
    temp_dir
}

fn json_options(root: &Path) -> RunOptions {
    RunOptions {
        out_dir: PathBuf::from("dist"),
        root: Some(root.to_path_buf()),
        config: None,
        overrides: RawConfig {
            mode: Some(ModeName::Json),
            summary: Some(false),
            ..Default::default()
        },
        json: false,
    }
}

#[tokio::test]
async fn test_collect_artifacts_kinds_and_maps() {
    let temp_dir = build_fixture();
    let fs = NativeFileSystem::new(temp_dir.path()).unwrap();
    let output_dir = fs.project_root().join("dist");

    let artifacts = collect_artifacts(&fs, &output_dir).await.unwrap();
    let names: Vec<&str> = artifacts.iter().map(|a| a.file_name.as_str()).collect();
    assert_eq!(names, vec!["assets/index.css", "assets/index.js", "assets/vendor.js"]);

    assert_eq!(artifacts[0].kind, ArtifactKind::Asset);
    assert!(artifacts[0].source_map.is_none());
    assert!(artifacts[1].source_map.as_deref().unwrap().contains("main.ts"));
    assert!(artifacts[2].source_map.as_deref().unwrap().contains("react"));
}

#[tokio::test]
async fn test_run_writes_json_report() {
    let temp_dir = build_fixture();
    let mut sequence = ReportSequence::new();

    let outcome = run(&json_options(temp_dir.path()), &mut sequence).await.unwrap();

    assert_eq!(outcome.reports.len(), 1);
    assert!(outcome.reports[0].ends_with("dist/stats.json"));
    assert!(outcome.analysis.tree.find("assets/index.js/src/main.ts").is_some());
    assert!(outcome
        .analysis
        .tree
        .find("assets/vendor.js/node_modules/react/index.js")
        .is_some());

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&outcome.reports[0]).unwrap()).unwrap();
    assert_eq!(report["chunks"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_second_run_does_not_overwrite_or_measure_reports() {
    let temp_dir = build_fixture();
    let mut sequence = ReportSequence::new();
    let options = json_options(temp_dir.path());

    let first = run(&options, &mut sequence).await.unwrap();
    let second = run(&options, &mut sequence).await.unwrap();

    assert!(second.reports[0].ends_with("dist/stats-1.json"));
    assert_eq!(first.analysis.chunks.len(), second.analysis.chunks.len());
    assert_eq!(first.analysis.totals(), second.analysis.totals());
}

#[tokio::test]
async fn test_static_mode_writes_html_and_json() {
    let temp_dir = build_fixture();
    fs::write(
        temp_dir.path().join("heft.toml"),
        "mode = \"static\"\nfile_name = \"bundle\"\nreport_dir = \"reports\"\nsummary = false\n",
    )
    .unwrap();
    let options = RunOptions {
        out_dir: PathBuf::from("dist"),
        root: Some(temp_dir.path().to_path_buf()),
        ..Default::default()
    };

    let outcome = run(&options, &mut ReportSequence::new()).await.unwrap();

    assert!(outcome.reports[0].ends_with("dist/reports/bundle.json"));
    assert!(outcome.reports[1].ends_with("dist/reports/bundle.html"));
    let html = fs::read_to_string(&outcome.reports[1]).unwrap();
    assert!(html.contains("<title>Heft bundle report</title>"));
}

#[tokio::test]
async fn test_server_mode_is_refused() {
    let temp_dir = build_fixture();
    let mut options = json_options(temp_dir.path());
    options.overrides.mode = Some(ModeName::Server);

    let err = run(&options, &mut ReportSequence::new()).await.unwrap_err();
    assert!(err.to_string().contains("Server mode"));
}

#[tokio::test]
async fn test_missing_output_dir() {
    let temp_dir = TempDir::new().unwrap();
    let err = run(&json_options(temp_dir.path()), &mut ReportSequence::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[tokio::test]
async fn test_unreadable_output_dir_is_not_reported_missing() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("dist"), "a file, not a directory").unwrap();
    let mut options = json_options(temp_dir.path());
    options.out_dir = PathBuf::from("dist/assets");

    let err = run(&options, &mut ReportSequence::new()).await.unwrap_err();
    assert!(err.to_string().contains("Failed to check output directory"));
    assert!(!format!("{:#}", err).contains("does not exist"));
}
