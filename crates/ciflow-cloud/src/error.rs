//! Construct and synthesis error types

use thiserror::Error;

/// Errors raised while building, validating or storing descriptors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Stage '{stage}' already has an action named '{action}'")]
    DuplicateAction { stage: String, action: String },

    #[error("Pipeline already has a stage named '{0}'")]
    DuplicateStage(String),

    #[error("Stage not found: {0}")]
    StageNotFound(String),

    #[error("Stage '{0}' has no actions")]
    EmptyStage(String),

    #[error("Action '{action}' consumes artifact '{artifact}', which no earlier stage produces")]
    UnproducedArtifact { action: String, artifact: String },

    #[error("Artifact '{artifact}' is produced by both '{first}' and '{second}'")]
    DuplicateArtifact {
        artifact: String,
        first: String,
        second: String,
    },

    #[error("Construct path '{path}' collides with an existing logical ID '{logical_id}'")]
    DuplicateConstruct { path: String, logical_id: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Template store error: {0}")]
    StoreError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
