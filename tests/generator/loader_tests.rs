use estest_gen::errors::GenError;
use estest_gen::generator::{load_specs, Action};

use crate::support::{registry, simple_spec, write, SEARCH_SPEC};

#[test]
fn test_only_yaml_files_in_name_order() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "test/search/b.yaml", &simple_spec("from b"));
    write(tmp.path(), "test/search/a.yml", &simple_spec("from a"));
    write(tmp.path(), "test/search/c.yaml", &simple_spec("from c"));

    let methods = registry(&["search"]);
    let specs = load_specs(tmp.path(), "search", "search", &methods).unwrap();

    let files: Vec<&str> = specs.iter().map(|s| s.file_name.as_str()).collect();
    assert_eq!(files, vec!["b.yaml", "c.yaml"]);
    assert_eq!(specs[0].tests[0].name, "from b");
}

#[test]
fn test_subdirectories_and_other_files_are_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "test/search/10_basic.yaml", &simple_spec("basic"));
    write(tmp.path(), "test/search/nested.yaml/20_inner.yaml", &simple_spec("inner"));
    write(tmp.path(), "test/search/README.md", "# notes");
    write(tmp.path(), "test/search/30_upper.YAML", &simple_spec("upper"));

    let methods = registry(&["search"]);
    let specs = load_specs(tmp.path(), "search", "search", &methods).unwrap();
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].file_name, "10_basic.yaml");
}

#[test]
fn test_empty_directory_yields_no_specs() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("test/search")).unwrap();

    let specs = load_specs(tmp.path(), "search", "search", &registry(&["search"])).unwrap();
    assert!(specs.is_empty());
}

#[test]
fn test_missing_directory_is_filesystem_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = load_specs(tmp.path(), "search", "search", &registry(&["search"])).unwrap_err();
    match err {
        GenError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected io error, got {other}"),
    }
}

#[test]
fn test_first_parse_failure_aborts_load() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "test/search/10_ok.yaml", &simple_spec("ok"));
    write(tmp.path(), "test/search/20_broken.yaml", "\"t\":\n  - do:\n      no.such.api: {}\n");
    write(tmp.path(), "test/search/30_bad_yaml.yaml", "\"t\": [unclosed");

    let err = load_specs(tmp.path(), "search", "search", &registry(&["search"])).unwrap_err();
    match err {
        GenError::Spec { file, message } => {
            assert!(file.ends_with("20_broken.yaml"), "wrong file: {}", file.display());
            assert_eq!(message, "unknown API \"no.such.api\"");
        }
        other => panic!("expected spec error, got {other}"),
    }
}

#[test]
fn test_cross_references_resolve_against_registry() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "test/search/10_basic.yaml", SEARCH_SPEC);

    let methods = registry(&["search", "index", "indices.create", "indices.delete"]);
    let specs = load_specs(tmp.path(), "search", "search", &methods).unwrap();
    let spec = &specs[0];

    let apis: Vec<&str> = spec.tests[0]
        .actions
        .iter()
        .filter_map(|a| match a {
            Action::Do(d) => Some(d.api.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(apis, vec!["index", "search"]);
    assert!(matches!(&spec.setup[0], Action::Do(d) if d.api == "indices.create"));
    assert!(matches!(&spec.teardown[0], Action::Do(d) if d.api == "indices.delete"));
}

#[test]
fn test_colliding_module_names_are_suffixed() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "test/search/10-basic.yaml", &simple_spec("a"));
    write(tmp.path(), "test/search/10_basic.yaml", &simple_spec("b"));

    let specs = load_specs(tmp.path(), "search", "search", &registry(&["search"])).unwrap();
    let modules: Vec<&str> = specs.iter().map(|s| s.module_name.as_str()).collect();
    assert_eq!(modules, vec!["test_10_basic", "test_10_basic_2"]);
}
