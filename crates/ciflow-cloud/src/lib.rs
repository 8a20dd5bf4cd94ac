//! ciflow Cloud Descriptors
//!
//! This crate provides the typed descriptors ciflow composes (stacks,
//! CodeBuild projects, IAM statements, pipelines) and turns them into a
//! template the AWS provisioning system can consume. Nothing here talks to
//! AWS; it only describes the desired shape.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   ciflow CLI                     │
//! │            (ciflow synth / diff)                 │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               ciflow-serverless                  │
//! │   ServerlessCiConfig: build + deploy per service │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 ciflow-cloud                     │
//! │  ┌────────────┐ ┌────────────┐ ┌─────────────┐  │
//! │  │  Stack /   │ │  Pipeline  │ │    IAM      │  │
//! │  │  Project   │ │  / Stage   │ │  Statement  │  │
//! │  └────────────┘ └────────────┘ └─────────────┘  │
//! │  ┌────────────┐ ┌────────────┐ ┌─────────────┐  │
//! │  │   synth    │ │    diff    │ │    store    │  │
//! │  └────────────┘ └────────────┘ └─────────────┘  │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod codebuild;
pub mod diff;
pub mod error;
pub mod iam;
pub mod pipeline;
pub mod stack;
pub mod store;
pub mod synth;

// Re-exports
pub use codebuild::{
    BuildEnvironment, BuildSpec, Cache, EnvironmentVariable, EnvironmentVariableType,
    LocalCacheMode, Phase, Project,
};
pub use diff::{Change, ChangeSet, ChangeSummary, ChangeType, diff};
pub use error::{CloudError, Result};
pub use iam::{Effect, PolicyStatement};
pub use pipeline::{Action, Artifact, CodeBuildAction, IStage, Pipeline, SourceAction, Stage};
pub use stack::Stack;
pub use store::{StoredTemplate, TemplateStore};
pub use synth::{Resource, Template, synthesize};
