//! Serverless composition error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerlessError {
    #[error("No services declared; add at least one `service \"name\"` node")]
    NoServices,

    #[error("Source is not configured: {0}")]
    MissingSource(&'static str),

    #[error("Cloud error: {0}")]
    Cloud(#[from] ciflow_cloud::CloudError),

    #[error("Project error: {0}")]
    Project(#[from] ciflow_core::ProjectError),
}

pub type Result<T> = std::result::Result<T, ServerlessError>;
