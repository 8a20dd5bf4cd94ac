//! Project definition

use super::{DeployGrants, EnvSettings, PipelineLayout, ServiceDefinition, SourceSettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything a `ciflow.kdl` file describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiProject {
    pub settings: EnvSettings,

    /// Variables passed to every build job
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    /// Services in declaration order
    #[serde(default)]
    pub services: Vec<ServiceDefinition>,

    #[serde(default)]
    pub grants: DeployGrants,

    #[serde(default)]
    pub source: SourceSettings,

    #[serde(default)]
    pub pipeline: PipelineLayout,
}

impl CiProject {
    pub fn new(settings: EnvSettings) -> Self {
        Self {
            settings,
            variables: BTreeMap::new(),
            services: Vec::new(),
            grants: DeployGrants::default(),
            source: SourceSettings::new(),
            pipeline: PipelineLayout::default(),
        }
    }

    pub fn service(&self, name: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.name == name)
    }
}
