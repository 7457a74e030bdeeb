use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::errors::{GenError, Result};
use crate::writer::{FileWriter, MakeWriter};

pub mod loader;

pub use loader::load_methods;

/// Registry of every known API method, keyed by canonical name.
pub type Methods = IndexMap<String, Method>;

/// Tokens without a spec of their own, mapped to the method whose descriptor
/// their tests run against.
pub const ALIASES: &[(&str, &str)] = &[
    ("ingest", "ingest.put_pipeline"),
    ("mlt", "search"),
    ("search.aggregation", "search"),
    ("search.highlight", "search"),
    ("search.inner_hits", "search"),
];

/// One API operation.
#[derive(Clone, Serialize)]
pub struct Method {
    pub name: String,
    pub test_file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub http_methods: Vec<String>,
    pub paths: Vec<String>,
    pub params: Vec<String>,
    #[serde(skip)]
    writer: Arc<dyn MakeWriter>,
}

impl Method {
    /// A descriptor backed by [`FileWriter`] with the default test file name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            test_file_name: default_test_file_name(&name),
            name,
            documentation: None,
            http_methods: Vec::new(),
            paths: Vec::new(),
            params: Vec::new(),
            writer: Arc::new(FileWriter),
        }
    }

    pub fn with_test_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.test_file_name = file_name.into();
        self
    }

    pub fn with_writer(mut self, writer: Arc<dyn MakeWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn new_writer(&self, output_dir: &Path, file_name: &str) -> std::io::Result<Box<dyn Write>> {
        self.writer.make_writer(output_dir, file_name)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("test_file_name", &self.test_file_name)
            .field("documentation", &self.documentation)
            .field("http_methods", &self.http_methods)
            .field("paths", &self.paths)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

pub fn default_test_file_name(name: &str) -> String {
    format!("{}_test.rs", name.replace('.', "_"))
}

/// Alias target for `token`, if any.
pub fn alias_for(token: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == token)
        .map(|(_, target)| *target)
}

/// Resolve a requested method token to its canonical descriptor.
///
/// Direct registry keys win. Otherwise the alias table is consulted; an
/// alias whose target is missing reports the target, not the token.
pub fn resolve_method<'a>(token: &str, methods: &'a Methods) -> Result<&'a Method> {
    if let Some(method) = methods.get(token) {
        return Ok(method);
    }
    let target = alias_for(token).ok_or_else(|| GenError::InvalidMethodName(token.to_string()))?;
    methods
        .get(target)
        .ok_or_else(|| GenError::InvalidMethodName(target.to_string()))
}
