// src/errors/mod.rs
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for test generation
#[derive(Error, Debug)]
pub enum GenError {
    #[error("invalid method name: {0}")]
    InvalidMethodName(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    #[error("invalid YAML in {}: {source}", file.display())]
    Yaml {
        file: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("spec error in {}: {message}", file.display())]
    Spec { file: PathBuf, message: String },

    #[error("invalid API definition in {}: {source}", file.display())]
    ApiDefinition {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot find template for tests")]
    TemplateNotFound,

    #[error("failed to create test writer for {method}: {cause}")]
    TestWriter { method: String, cause: String },

    #[error(transparent)]
    Template(#[from] minijinja::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{failed} of {total} methods failed to generate")]
    Generation { failed: usize, total: usize },
}

impl GenError {
    pub(crate) fn spec(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        GenError::Spec {
            file: file.into(),
            message: message.into(),
        }
    }
}

/// Convenience Result type that uses GenError
pub type Result<T> = std::result::Result<T, GenError>;
