use std::{fs::File, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{GenError, Result};

/// Settings for one generation run, read from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Root of the API spec: `api/*.json` and `test/<method>/*.yaml`.
    pub spec_dir: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
    /// Method tokens to generate. Empty means every directory under `test/`.
    #[serde(default)]
    pub methods: Vec<String>,
    /// Skip features the target client implements.
    #[serde(default)]
    pub supported_features: Vec<String>,
    #[serde(default)]
    pub fail_fast: bool,
}

impl GeneratorConfig {
    pub fn new(spec_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            spec_dir: spec_dir.into(),
            output_dir: output_dir.into(),
            template_dir: None,
            methods: Vec::new(),
            supported_features: Vec::new(),
            fail_fast: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.spec_dir.as_os_str().is_empty() {
            return Err(GenError::Config("spec_dir must not be empty".into()));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(GenError::Config("output_dir must not be empty".into()));
        }
        if let Some(dup) = first_duplicate(&self.methods) {
            return Err(GenError::Config(format!("method listed twice: {dup}")));
        }
        Ok(())
    }
}

fn first_duplicate(items: &[String]) -> Option<&str> {
    items
        .iter()
        .enumerate()
        .find(|(i, item)| items[..*i].contains(item))
        .map(|(_, item)| item.as_str())
}

pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<GeneratorConfig> {
    let path = path.as_ref();
    let f = File::open(path)?;
    let cfg: GeneratorConfig = serde_yaml::from_reader(f).map_err(|source| GenError::Yaml {
        file: path.to_path_buf(),
        source,
    })?;
    cfg.validate()?;
    Ok(cfg)
}
