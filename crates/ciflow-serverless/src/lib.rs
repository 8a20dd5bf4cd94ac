//! ciflow Serverless Composition
//!
//! Composes the CI/CD jobs of Serverless Framework services: for each service
//! a build job that runs `make build-<service>` and exports the workspace as
//! an artifact, and a deploy job that consumes that artifact and runs
//! `make deploy-<service>` under a role scoped to the service's stack.
//!
//! [`assemble`] turns a loaded project into a stack and a three-stage
//! pipeline (source, build, deploy) ready for synthesis.

pub mod app;
pub mod commands;
pub mod defaults;
pub mod error;
pub mod serverless;

pub use app::{ServerlessApp, assemble};
pub use defaults::{DefaultEnvironment, ServiceCiDefaults};
pub use error::{Result, ServerlessError};
pub use serverless::{ServerlessCiConfig, ServerlessCiProps};
