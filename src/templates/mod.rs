use std::path::Path;

use minijinja::value::{Value, ViaDeserialize};
use minijinja::{path_loader, AutoEscape, Environment, Error as MjError, ErrorKind};

use crate::errors::Result;
use crate::generator::naming::ident;
use crate::generator::{Skip, TEST_TEMPLATE};

/// Built-in test file template, rendering Rust async tests.
pub const DEFAULT_TEST_TEMPLATE: &str = include_str!("../../templates/test.tmpl");

/// Build the template environment used for code generation.
///
/// With `template_dir` set, templates are loaded from disk on demand and the
/// built-in `test.tmpl` is not registered. `supported_features` drives the
/// `skip_reason` filter.
pub fn build_env(template_dir: Option<&Path>, supported_features: Vec<String>) -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);

    match template_dir {
        Some(dir) => env.set_loader(path_loader(dir)),
        None => env.add_template(TEST_TEMPLATE, DEFAULT_TEST_TEMPLATE)?,
    }

    // {{ name|ident }}
    env.add_filter("ident", |raw: String| ident(&raw));

    // {{ text|rust_str }}
    env.add_filter("rust_str", |raw: String| format!("{raw:?}"));

    // {{ text|comment }}
    env.add_filter("comment", comment);

    // {{ value|raw_json }}
    env.add_filter("raw_json", raw_json);

    // {{ test.skip|skip_reason }}
    env.add_filter(
        "skip_reason",
        move |skip: Option<ViaDeserialize<Skip>>| -> Option<String> {
            skip.and_then(|s| s.ignore_reason(&supported_features))
        },
    );

    Ok(env)
}

/// Flatten text onto one line so it stays inside a `//` comment.
fn comment(raw: String) -> String {
    raw.replace("\r\n", " ").replace(|c: char| c == '\r' || c == '\n', " ")
}

/// Serialize a value to JSON wrapped in a Rust raw string literal.
fn raw_json(value: Value) -> std::result::Result<String, MjError> {
    let json = if value.is_undefined() || value.is_none() {
        "null".to_string()
    } else {
        serde_json::to_string(&value)
            .map_err(|e| MjError::new(ErrorKind::InvalidOperation, "cannot encode value as JSON").with_source(e))?
    };

    let mut hashes = String::from("#");
    while json.contains(&format!("\"{hashes}")) {
        hashes.push('#');
    }
    Ok(format!("r{hashes}\"{json}\"{hashes}"))
}
