//! Environment settings

use serde::{Deserialize, Serialize};

pub const DEFAULT_ENV_STAGE: &str = "dev";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Settings shared by every service of one project environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvSettings {
    /// Project name, prefix of every job and action name
    pub project_name: String,

    /// Environment stage (dev, stg, prod, ...)
    pub env_stage: String,

    /// AWS account ID (may be empty when only synthesizing locally)
    #[serde(default)]
    pub account: String,

    pub region: String,
}

impl EnvSettings {
    pub fn new(project_name: impl Into<String>, env_stage: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            env_stage: env_stage.into(),
            account: String::new(),
            region: DEFAULT_REGION.to_string(),
        }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// `{project_name}-{env_stage}`
    pub fn project_env_name(&self) -> String {
        format!("{}-{}", self.project_name, self.env_stage)
    }
}
