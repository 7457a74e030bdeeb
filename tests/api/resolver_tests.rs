use estest_gen::api::{alias_for, resolve_method, ALIASES};
use estest_gen::errors::GenError;

use crate::support::registry;

#[test]
fn test_direct_key_returns_exact_descriptor() {
    let methods = registry(&["search", "index", "indices.create"]);
    for (name, method) in &methods {
        let resolved = resolve_method(name, &methods).unwrap();
        assert!(std::ptr::eq(resolved, method), "{name} resolved to another descriptor");
    }
}

#[test]
fn test_ingest_alias_resolves_to_put_pipeline() {
    let methods = registry(&["ingest.put_pipeline", "search"]);
    let m = resolve_method("ingest", &methods).unwrap();
    assert_eq!(m.name, "ingest.put_pipeline");
}

#[test]
fn test_every_alias_resolves_when_target_exists() {
    let targets: Vec<&str> = ALIASES.iter().map(|(_, t)| *t).collect();
    let methods = registry(&targets);
    for (alias, target) in ALIASES {
        let m = resolve_method(alias, &methods).unwrap();
        assert_eq!(m.name, *target);
    }
}

#[test]
fn test_alias_with_missing_target_reports_target() {
    let methods = registry(&["index"]);
    for (alias, target) in ALIASES {
        let err = resolve_method(alias, &methods).unwrap_err();
        match err {
            GenError::InvalidMethodName(name) => assert_eq!(name, *target),
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn test_unknown_token_reports_token() {
    let methods = registry(&["search"]);
    let err = resolve_method("search.unknown", &methods).unwrap_err();
    assert_eq!(err.to_string(), "invalid method name: search.unknown");
}

#[test]
fn test_alias_lookup() {
    assert_eq!(alias_for("search.highlight"), Some("search"));
    assert_eq!(alias_for("search"), None);
}
