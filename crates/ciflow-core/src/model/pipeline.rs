//! Pipeline layout and source settings

use serde::{Deserialize, Serialize};

/// Repository the pipeline pulls from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSettings {
    /// CodeStar connection ARN
    #[serde(default)]
    pub connection_arn: String,

    /// Repository in `owner/name` form
    #[serde(default)]
    pub repository: String,

    pub branch: String,
}

impl SourceSettings {
    pub fn new() -> Self {
        Self {
            branch: "main".to_string(),
            ..Default::default()
        }
    }
}

/// Names of the pipeline stages the composer registers into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineLayout {
    pub source_stage: String,
    pub build_stage: String,
    pub deploy_stage: String,
}

impl Default for PipelineLayout {
    fn default() -> Self {
        Self {
            source_stage: "Source".to_string(),
            build_stage: "Build".to_string(),
            deploy_stage: "Deploy".to_string(),
        }
    }
}
