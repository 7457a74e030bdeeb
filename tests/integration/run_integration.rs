use std::fs;
use std::path::Path;

use estest_gen::cmd::run_generate;
use estest_gen::config::GeneratorConfig;
use estest_gen::errors::GenError;

use crate::support::{capture_info_logs, simple_spec, write, SEARCH_SPEC};

fn api_tree(root: &Path) {
    for name in ["search", "index", "indices.create", "indices.delete", "ingest.put_pipeline"] {
        write(
            root,
            &format!("api/{name}.json"),
            &format!(r#"{{ "{name}": {{ "documentation": {{ "url": "https://example.com/{name}" }}, "url": {{ "paths": [] }} }} }}"#),
        );
    }
    write(root, "api/_common.json", r#"{ "params": {} }"#);
}

#[test]
fn test_run_generates_every_discovered_method() {
    let tmp = tempfile::tempdir().unwrap();
    let spec = tmp.path().join("spec");
    api_tree(&spec);
    write(&spec, "test/search/10_basic.yaml", SEARCH_SPEC);
    write(&spec, "test/search.highlight/10_highlight.yaml", &simple_spec("highlight"));
    write(&spec, "test/ingest/10_pipeline.yaml", &simple_spec("pipeline"));

    let out = tmp.path().join("out");
    let cfg = GeneratorConfig::new(&spec, &out);
    let summary = run_generate(&cfg).unwrap();

    assert_eq!(summary.generated, 3);
    assert_eq!(summary.failed, 0);
    assert!(out.join("search_test.rs").exists());
    assert!(out.join("ingest_put_pipeline_test.rs").exists());

    // search and search.highlight share a descriptor, so the later token wins the file.
    let search = fs::read_to_string(out.join("search_test.rs")).unwrap();
    assert!(search.contains("\"search.highlight\" YAML tests"));
    assert!(search.contains("// Docs: https://example.com/search"));
}

#[test]
fn test_run_reports_failures_and_keeps_going() {
    let tmp = tempfile::tempdir().unwrap();
    let spec = tmp.path().join("spec");
    api_tree(&spec);
    write(&spec, "test/index/10_basic.yaml", &simple_spec("index"));
    write(&spec, "test/nonexistent/10_basic.yaml", &simple_spec("nope"));

    let out = tmp.path().join("out");
    let cfg = GeneratorConfig::new(&spec, &out);
    let err = run_generate(&cfg).unwrap_err();

    assert!(matches!(err, GenError::Generation { failed: 1, total: 2 }));
    assert!(out.join("index_test.rs").exists());
}

#[test]
fn test_run_fail_fast_returns_first_error() {
    let tmp = tempfile::tempdir().unwrap();
    let spec = tmp.path().join("spec");
    api_tree(&spec);
    write(&spec, "test/index/10_basic.yaml", &simple_spec("index"));

    let mut cfg = GeneratorConfig::new(&spec, tmp.path().join("out"));
    cfg.methods = vec!["mlt.unknown".to_string(), "index".to_string()];
    cfg.fail_fast = true;

    let err = run_generate(&cfg).unwrap_err();
    assert_eq!(err.to_string(), "invalid method name: mlt.unknown");
    assert!(!tmp.path().join("out").join("index_test.rs").exists());
}

#[test]
fn test_run_with_custom_template_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let spec = tmp.path().join("spec");
    api_tree(&spec);
    write(&spec, "test/index/10_basic.yaml", &simple_spec("index"));
    write(tmp.path(), "tmpl/test.tmpl", "// {{ method.name }}: {{ specs|length }} spec(s)\n");

    let out = tmp.path().join("out");
    let mut cfg = GeneratorConfig::new(&spec, &out);
    cfg.template_dir = Some(tmp.path().join("tmpl"));
    run_generate(&cfg).unwrap();

    assert_eq!(
        fs::read_to_string(out.join("index_test.rs")).unwrap(),
        "// index: 1 spec(s)\n"
    );
}

#[test]
fn test_run_logs_elapsed_time_per_method_at_info() {
    let tmp = tempfile::tempdir().unwrap();
    let spec = tmp.path().join("spec");
    api_tree(&spec);
    write(&spec, "test/search/10_basic.yaml", SEARCH_SPEC);
    write(&spec, "test/ingest/10_pipeline.yaml", &simple_spec("pipeline"));

    let cfg = GeneratorConfig::new(&spec, tmp.path().join("out"));
    let logs = capture_info_logs(|| {
        run_generate(&cfg).unwrap();
    });

    let finished: Vec<&str> = logs.lines().filter(|l| l.contains("method finished")).collect();
    assert_eq!(finished.len(), 2, "{logs}");
    for line in finished {
        assert!(line.contains(" INFO "), "{line}");
        assert!(line.contains("elapsed_ms="), "{line}");
    }
}
