use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error: {path}\nreason: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing required setting '{0}'")]
    MissingSetting(&'static str),

    #[error("Service '{0}' is declared more than once")]
    DuplicateService(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error(
        "Project root not found\nsearched from: {0}\nhint: run inside a directory containing ciflow.kdl"
    )]
    ProjectRootNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, ProjectError>;
