use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use minijinja::{context, Environment, ErrorKind, Template};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::api::{resolve_method, Method, Methods};
use crate::errors::{GenError, Result};

pub mod naming;
pub mod spec;

pub use spec::{Action, AssertOp, Assertion, DoAction, Skip, TestCase, TestSpec};

/// Name of the template every method's test file is rendered with.
pub const TEST_TEMPLATE: &str = "test.tmpl";

/// Directory holding the YAML specs requested under `token`.
///
/// Alias tokens keep their own directory even though they resolve to another
/// method, e.g. `test/search.highlight` rather than `test/search`.
pub fn spec_dir_for(root: impl AsRef<Path>, token: &str) -> PathBuf {
    root.as_ref().join("test").join(token)
}

/// Parse every `.yaml` file directly under `<root>/test/<token>`.
///
/// Files are read in file-name order so regenerated output is stable across
/// platforms. The first file that fails to parse aborts the whole load.
pub fn load_specs(root: impl AsRef<Path>, token: &str, method: &str, methods: &Methods) -> Result<Vec<TestSpec>> {
    let dir = spec_dir_for(root, token);
    if !fs::metadata(&dir)?.is_dir() {
        return Err(GenError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", dir.display()),
        )));
    }

    let mut modules = naming::UniqueNames::default();
    let mut specs = Vec::new();
    for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let is_yaml = path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yaml");
        if !is_yaml {
            debug!(path = %path.display(), "skipping non-yaml entry");
            continue;
        }

        let mut ts = spec::parse_file(path, methods, method)?;
        ts.module_name = modules.claim(&ts.module_name);
        specs.push(ts);
    }
    Ok(specs)
}

/// Test file generator for a single method. Holds one or more test specs,
/// each with one or more tests.
#[derive(Debug)]
pub struct MethodTests<'a> {
    token: String,
    method: &'a Method,
    specs: Vec<TestSpec>,
    template: Template<'a, 'a>,
}

impl<'a> MethodTests<'a> {
    /// Resolve `token`, load its specs and look up the test template.
    pub fn new(
        spec_dir: impl AsRef<Path>,
        token: &str,
        methods: &'a Methods,
        templates: &'a Environment<'_>,
    ) -> Result<Self> {
        let method = resolve_method(token, methods)?;
        let specs = load_specs(spec_dir, token, &method.name, methods)?;
        let template = templates.get_template(TEST_TEMPLATE).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => GenError::TemplateNotFound,
            _ => GenError::Template(e),
        })?;

        Ok(Self {
            token: token.to_string(),
            method,
            specs,
            template,
        })
    }

    pub fn method(&self) -> &Method {
        self.method
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn specs(&self) -> &[TestSpec] {
        &self.specs
    }

    /// Render the test file into `output_dir`, replacing any previous one.
    pub fn generate(&self, output_dir: impl AsRef<Path>) -> Result<()> {
        let output_dir = output_dir.as_ref();
        let mut out = self
            .method
            .new_writer(output_dir, &self.method.test_file_name)
            .map_err(|e| GenError::TestWriter {
                method: self.method.name.clone(),
                cause: e.to_string(),
            })?;

        self.template.render_to_write(
            context! {
                method => self.method,
                token => &self.token,
                specs => &self.specs,
            },
            &mut out,
        )?;
        out.flush()?;

        info!(
            method = %self.method.name,
            specs = self.specs.len(),
            file = %output_dir.join(&self.method.test_file_name).display(),
            "generated tests"
        );
        Ok(())
    }
}
