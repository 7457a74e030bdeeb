use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use tracing::{info, instrument, warn};
use walkdir::WalkDir;

use crate::api::load_methods;
use crate::config::{load_config_from_path, GeneratorConfig};
use crate::errors::{GenError, Result};
use crate::generator::MethodTests;
use crate::templates::build_env;

/// CLI
#[derive(Parser, Debug)]
#[command(
    name = "estest-gen",
    version,
    about = "Generate REST API client tests from YAML test specs.",
    long_about = "Generate REST API client tests from YAML test specs.\n\n\
Resources:\n  • API definitions: <spec-dir>/api/*.json, one entry per method\n  • Test specs: <spec-dir>/test/<method>/*.yaml (setup, teardown, skip, do/assert actions)\n  • Templates: a built-in test.tmpl, or a directory passed with --templates"
)]
pub struct Cli {
    #[arg(
        long = "yaml-config",
        short = 'y',
        value_name = "FILE",
        default_value = "estest-gen.yaml"
    )]
    pub yaml_config: PathBuf,

    /// Overrides `spec_dir` from the config file.
    #[arg(long = "spec-dir", value_name = "DIR")]
    pub spec_dir: Option<PathBuf>,

    /// Overrides `output_dir` from the config file.
    #[arg(long = "output-dir", short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory holding a custom `test.tmpl`.
    #[arg(long = "templates", short = 't', value_name = "DIR")]
    pub templates: Option<PathBuf>,

    /// Stop at the first method that fails.
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    /// Method tokens to generate; defaults to the config's list, then to every test directory.
    #[arg(value_name = "METHOD")]
    pub methods: Vec<String>,
}

impl Cli {
    /// Merge command-line overrides into the config. The file is optional
    /// when both directories are given on the command line.
    pub fn into_config(self) -> Result<GeneratorConfig> {
        let mut cfg = match (&self.spec_dir, &self.output_dir) {
            (Some(spec), Some(out)) if !self.yaml_config.exists() => GeneratorConfig::new(spec, out),
            _ => load_config_from_path(&self.yaml_config)?,
        };
        if let Some(dir) = self.spec_dir {
            cfg.spec_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            cfg.output_dir = dir;
        }
        if self.templates.is_some() {
            cfg.template_dir = self.templates;
        }
        if !self.methods.is_empty() {
            cfg.methods = self.methods;
        }
        cfg.fail_fast |= self.fail_fast;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub generated: usize,
    pub failed: usize,
}

/// Every directory name under `<spec_dir>/test`, sorted.
pub fn discover_tokens(spec_dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let test_dir = spec_dir.as_ref().join("test");
    let mut out = Vec::new();
    for entry in WalkDir::new(&test_dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        out.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(out)
}

#[instrument(skip_all, fields(spec_dir = %cfg.spec_dir.display(), output_dir = %cfg.output_dir.display()))]
pub fn run_generate(cfg: &GeneratorConfig) -> Result<RunSummary> {
    info!("starting test generation");
    let t0 = Instant::now();

    let methods = load_methods(&cfg.spec_dir)?;
    let env = build_env(cfg.template_dir.as_deref(), cfg.supported_features.clone())?;

    let tokens = if cfg.methods.is_empty() {
        discover_tokens(&cfg.spec_dir)?
    } else {
        cfg.methods.clone()
    };
    info!(count = tokens.len(), "methods to generate");

    let mut summary = RunSummary::default();
    for (idx, token) in tokens.iter().enumerate() {
        let span = tracing::info_span!("method", idx = idx + 1, token = %token);
        let _g = span.enter();

        let m_t0 = Instant::now();
        let result = MethodTests::new(&cfg.spec_dir, token, &methods, &env)
            .and_then(|tests| tests.generate(&cfg.output_dir));
        match result {
            Ok(()) => {
                summary.generated += 1;
                info!(elapsed_ms = m_t0.elapsed().as_millis() as u64, "method finished");
            }
            Err(err) => {
                summary.failed += 1;
                warn!(error = %err, "method failed");
                if cfg.fail_fast {
                    return Err(err);
                }
            }
        }
    }

    info!(
        generated = summary.generated,
        failed = summary.failed,
        total_ms = t0.elapsed().as_millis() as u64,
        "all methods finished"
    );
    if summary.failed > 0 {
        return Err(GenError::Generation {
            failed: summary.failed,
            total: tokens.len(),
        });
    }
    Ok(summary)
}
