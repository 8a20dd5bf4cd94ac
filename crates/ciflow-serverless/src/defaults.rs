//! Default environment variables shared by every service job

use ciflow_cloud::EnvironmentVariable;
use ciflow_core::{CiProject, EnvSettings};
use std::collections::BTreeMap;

/// Supplies the environment variables every job of a project inherits
pub trait DefaultEnvironment {
    fn default_env_variables(&self) -> BTreeMap<String, EnvironmentVariable>;
}

impl DefaultEnvironment for BTreeMap<String, EnvironmentVariable> {
    fn default_env_variables(&self) -> BTreeMap<String, EnvironmentVariable> {
        self.clone()
    }
}

/// Defaults derived from the environment settings plus configured variables
///
/// Built-ins: `PROJECT_NAME`, `ENV_STAGE`, `PROJECT_ENV_NAME`, and
/// `AWS_ACCOUNT_ID` when an account is set. Configured variables are applied
/// last and win over built-ins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCiDefaults {
    settings: EnvSettings,
    variables: BTreeMap<String, String>,
}

impl ServiceCiDefaults {
    pub fn new(settings: EnvSettings, variables: BTreeMap<String, String>) -> Self {
        Self {
            settings,
            variables,
        }
    }

    pub fn from_project(project: &CiProject) -> Self {
        Self::new(project.settings.clone(), project.variables.clone())
    }
}

impl DefaultEnvironment for ServiceCiDefaults {
    fn default_env_variables(&self) -> BTreeMap<String, EnvironmentVariable> {
        let mut vars = BTreeMap::new();
        let mut set = |key: &str, value: &str| {
            vars.insert(key.to_string(), EnvironmentVariable::plaintext(value));
        };

        set("PROJECT_NAME", &self.settings.project_name);
        set("ENV_STAGE", &self.settings.env_stage);
        set("PROJECT_ENV_NAME", &self.settings.project_env_name());
        if !self.settings.account.is_empty() {
            set("AWS_ACCOUNT_ID", &self.settings.account);
        }
        for (key, value) in &self.variables {
            set(key, value);
        }

        vars
    }
}
