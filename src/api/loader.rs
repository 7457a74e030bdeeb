use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{Method, Methods};
use crate::errors::{GenError, Result};

// Shapes of a rest-api-spec definition file; only the fields the generator
// exposes to templates are kept.

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Documentation {
    Url(String),
    Object {
        #[serde(default)]
        url: Option<String>,
    },
}

#[derive(Debug, Default, Deserialize)]
struct UrlSpec {
    #[serde(default)]
    paths: Vec<PathSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PathSpec {
    Plain(String),
    Detailed {
        path: String,
        #[serde(default)]
        methods: Vec<String>,
    },
}

#[derive(Debug, Deserialize)]
struct Definition {
    #[serde(default)]
    documentation: Option<Documentation>,
    #[serde(default)]
    methods: Vec<String>,
    #[serde(default)]
    url: UrlSpec,
    #[serde(default)]
    params: serde_json::Map<String, Value>,
}

impl Definition {
    fn into_method(self, name: &str) -> Method {
        let mut method = Method::new(name);
        method.documentation = match self.documentation {
            Some(Documentation::Url(url)) => Some(url),
            Some(Documentation::Object { url }) => url,
            None => None,
        };

        let mut http_methods = self.methods;
        for p in self.url.paths {
            match p {
                PathSpec::Plain(path) => method.paths.push(path),
                PathSpec::Detailed { path, methods } => {
                    method.paths.push(path);
                    http_methods.extend(methods);
                }
            }
        }
        http_methods.sort();
        http_methods.dedup();
        method.http_methods = http_methods;

        let mut params: Vec<String> = self.params.into_iter().map(|(k, _)| k).collect();
        params.sort();
        method.params = params;
        method
    }
}

/// Build the method registry from `<spec_dir>/api/*.json`.
///
/// Files whose name starts with `_` hold shared definitions and are skipped.
/// The registry is sorted by method name.
pub fn load_methods(spec_dir: impl AsRef<Path>) -> Result<Methods> {
    let api_dir = spec_dir.as_ref().join("api");
    let mut methods = Methods::new();

    for entry in WalkDir::new(&api_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_json = path.extension().and_then(|s| s.to_str()) == Some("json");
        let shared = entry.file_name().to_string_lossy().starts_with('_');
        if !is_json || shared {
            debug!(path = %path.display(), "skipping api entry");
            continue;
        }

        let text = fs::read_to_string(path)?;
        let invalid = |source| GenError::ApiDefinition {
            file: path.to_path_buf(),
            source,
        };
        let defs: serde_json::Map<String, Value> = serde_json::from_str(&text).map_err(invalid)?;
        for (name, raw) in defs {
            let def: Definition = serde_json::from_value(raw).map_err(invalid)?;
            if methods.contains_key(&name) {
                return Err(GenError::Config(format!(
                    "duplicate API definition for {name} in {}",
                    path.display()
                )));
            }
            let method = def.into_method(&name);
            methods.insert(name, method);
        }
    }

    methods.sort_keys();
    info!(count = methods.len(), dir = %api_dir.display(), "loaded api definitions");
    Ok(methods)
}
