//! End-to-end tests for the attribution pipeline.

use heft_core::{
    AnalysisOptions, Analyzer, Artifact, Diagnostic, Error, Metrics, MetricsComputer, TreeNode,
};
use serde_json::json;
use sourcemap::SourceMapBuilder;
use std::path::PathBuf;

fn options() -> AnalysisOptions {
    AnalysisOptions {
        root: PathBuf::from("/work/app"),
        output_dir: PathBuf::from("/work/app"),
        ..Default::default()
    }
}

/// Tokens are `(generated_line, generated_column, source index)`; `None`
/// marks generated-only code.
fn source_map(sources: &[&str], tokens: &[(u32, u32, Option<u32>)]) -> String {
    let mut builder = SourceMapBuilder::new(None);
    for source in sources {
        let src_id = builder.add_source(source);
        let content = format!("export default '{}';", source);
        builder.set_source_contents(src_id, Some(content.as_str()));
    }
    for &(line, column, source) in tokens {
        builder.add_raw(line, column, line, 0, source, None, false);
    }
    let mut out = Vec::new();
    builder.into_sourcemap().to_writer(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

/// 1000-byte chunk: 400 bytes of `a.ts`, 300 of `b.ts`, 300 of helper code.
fn scenario_chunk(file_name: &str) -> Artifact {
    let code = format!("{}{}{}", "a".repeat(400), "b".repeat(300), "h".repeat(300));
    let map = source_map(
        &["/work/app/a.ts", "/work/app/b.ts"],
        &[(0, 0, Some(0)), (0, 400, Some(1)), (0, 700, None)],
    );
    Artifact::chunk(file_name, code).with_source_map(map)
}

#[test]
fn test_end_to_end_scenario_reports_drift_without_error() {
    let analyzer = Analyzer::new(options()).unwrap();
    let analysis = analyzer.analyze(&[scenario_chunk("index.js")]);

    let chunk = analysis.tree.find("index.js").unwrap();
    assert!(matches!(chunk, TreeNode::Chunk(_)));
    assert_eq!(chunk.contribution().parsed_size, 1000);

    let a = analysis.tree.find("index.js/a.ts").unwrap();
    let b = analysis.tree.find("index.js/b.ts").unwrap();
    assert_eq!(a.contribution().parsed_size, 400);
    assert_eq!(b.contribution().parsed_size, 300);
    assert!(a.contribution().gzip_size > 0);
    assert!(a.contribution().map_size > 0);

    assert_eq!(
        analysis.diagnostics,
        vec![Diagnostic::AttributionDrift {
            chunk: "index.js".to_string(),
            parsed_size: 1000,
            attributed_size: 700,
        }]
    );
    assert_eq!(analysis.totals().parsed_size, 1000);
    assert!(analysis.tree.is_consistent());
}

#[test]
fn test_column_boundaries_partition_a_line() {
    let map = source_map(&["a.ts", "b.ts"], &[(0, 0, Some(0)), (0, 5, Some(1))]);
    let analyzer = Analyzer::new(AnalysisOptions {
        retain_source: true,
        ..options()
    })
    .unwrap();
    let analysis = analyzer.analyze(&[Artifact::chunk("index.js", "abcdefghij").with_source_map(map)]);

    let modules = &analysis.chunks[0].modules;
    assert_eq!(modules[0].source.as_deref(), Some("abcde"));
    assert_eq!(modules[1].source.as_deref(), Some("fghij"));
    assert!(analysis.diagnostics.is_empty());
}

#[test]
fn test_sectioned_map_partitions_a_line() {
    let section = |source: &str| -> serde_json::Value {
        serde_json::from_str(&source_map(&[source], &[(0, 0, Some(0))])).unwrap()
    };
    let map = json!({
        "version": 3,
        "sections": [
            { "offset": { "line": 0, "column": 0 }, "map": section("/work/app/a.ts") },
            { "offset": { "line": 0, "column": 5 }, "map": section("/work/app/b.ts") },
        ],
    })
    .to_string();
    let analyzer = Analyzer::new(AnalysisOptions {
        retain_source: true,
        ..options()
    })
    .unwrap();
    let analysis = analyzer.analyze(&[Artifact::chunk("index.js", "abcdefghij").with_source_map(map)]);

    let modules = &analysis.chunks[0].modules;
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0].source.as_deref(), Some("abcde"));
    assert_eq!(modules[1].source.as_deref(), Some("fghij"));
    assert!(analysis.diagnostics.is_empty());
    assert_eq!(analysis.tree.find("index.js/b.ts").unwrap().contribution().parsed_size, 5);
}

#[test]
fn test_duplicate_module_across_chunks() {
    let analyzer = Analyzer::new(options()).unwrap();
    let analysis = analyzer.analyze(&[
        scenario_chunk("assets/home.js"),
        scenario_chunk("assets/about.js"),
    ]);

    let home_a = analysis.tree.find("assets/home.js/a.ts").unwrap();
    let about_a = analysis.tree.find("assets/about.js/a.ts").unwrap();
    assert_eq!(home_a.contribution(), about_a.contribution());

    let home = analysis.tree.find("assets/home.js").unwrap();
    assert_eq!(home.children().len(), 2);
    match home {
        TreeNode::Chunk(chunk) => assert_eq!(chunk.attributed().parsed_size, 700),
        other => panic!("expected a chunk, got {:?}", other),
    }

    let assets = analysis.tree.find("assets").unwrap();
    assert_eq!(assets.contribution().parsed_size, 2000);
    assert!(analysis.tree.is_consistent());
}

#[test]
fn test_zero_attribution_modules_contribute_nothing() {
    // `b.ts` only maps onto a line the artifact does not have.
    let map = source_map(&["a.ts", "b.ts"], &[(0, 0, Some(0)), (3, 0, Some(1))]);
    let analyzer = Analyzer::new(options()).unwrap();
    let analysis = analyzer.analyze(&[Artifact::chunk("index.js", "abc").with_source_map(map)]);

    let b = &analysis.chunks[0].modules[1];
    assert_eq!(b.id, "b.ts");
    assert_eq!(b.metrics, Metrics::ZERO);
    assert!(analysis.tree.find("index.js/b.ts").is_none());
}

#[test]
fn test_pipeline_is_deterministic() {
    let artifacts = vec![
        scenario_chunk("assets/home.js"),
        Artifact::asset("assets/style.css", "body{margin:0}"),
        scenario_chunk("assets/about.js"),
        Artifact::chunk("vendor.js", "var v=1;"),
    ];

    let analyzer = Analyzer::new(options()).unwrap();
    let first = serde_json::to_string(&analyzer.analyze(&artifacts)).unwrap();
    let second = serde_json::to_string(&analyzer.analyze(&artifacts)).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_concurrent_matches_sequential() {
    let artifacts = vec![
        scenario_chunk("c.js"),
        scenario_chunk("a.js"),
        Artifact::chunk("b.js", "let b = 2;").with_source_map("not a map"),
    ];

    let analyzer = Analyzer::new(options()).unwrap();
    let sequential = serde_json::to_value(analyzer.analyze(&artifacts)).unwrap();
    let concurrent = serde_json::to_value(analyzer.analyze_concurrent(artifacts).await).unwrap();

    assert_eq!(sequential, concurrent);
    let names: Vec<&str> = concurrent["tree"]["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|child| child["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["c.js", "a.js", "b.js"]);
}

#[test]
fn test_relative_sources_resolve_against_map_directory() {
    let map = source_map(&["../../src/main.ts"], &[(0, 0, Some(0))]);
    let analyzer = Analyzer::new(AnalysisOptions {
        root: PathBuf::from("/work/app"),
        output_dir: PathBuf::from("/work/app/dist"),
        ..Default::default()
    })
    .unwrap();
    let analysis = analyzer.analyze(&[Artifact::chunk("assets/index.js", "main()").with_source_map(map)]);

    assert_eq!(analysis.chunks[0].modules[0].id, "src/main.ts");
    assert!(analysis.tree.find("assets/index.js/src/main.ts").is_some());
    assert_eq!(analysis.tree.name, "app");
}

#[test]
fn test_bare_scheme_source_stays_reachable() {
    let map = source_map(&["webpack://", "/work/app/a.ts"], &[(0, 0, Some(0)), (0, 3, Some(1))]);
    let analyzer = Analyzer::new(options()).unwrap();
    let analysis = analyzer.analyze(&[Artifact::chunk("index.js", "abcdef").with_source_map(map)]);

    assert_eq!(analysis.chunks[0].modules[0].id, "webpack://");
    let node = analysis.tree.find("index.js/webpack:").unwrap();
    assert_eq!(node.name(), "webpack:");
    assert_eq!(node.contribution().parsed_size, 3);
}

#[test]
fn test_custom_metrics_computer() {
    let analyzer = Analyzer::with_metrics(options(), MetricsComputer::gzip(1)).unwrap();
    let analysis = analyzer.analyze(&[Artifact::chunk("index.js", "x".repeat(100))]);
    assert_eq!(analysis.totals().parsed_size, 100);
    assert!(analysis.totals().gzip_size < 100);
}

#[test]
fn test_error_display() {
    let err = Error::MalformedSourceMap {
        message: "expected value".to_string(),
    };
    assert_eq!(err.to_string(), "Malformed source map: expected value");
}
