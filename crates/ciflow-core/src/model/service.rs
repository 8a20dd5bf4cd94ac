//! Service definitions

use serde::{Deserialize, Serialize};

/// How a service is built and deployed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Serverless Framework service under `services/{name}`
    #[default]
    Serverless,
}

impl std::str::FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serverless" => Ok(ServiceKind::Serverless),
            other => Err(format!("unknown service kind '{}'", other)),
        }
    }
}

/// A service that gets its own build and deploy jobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,

    #[serde(default)]
    pub kind: ServiceKind,
}

impl ServiceDefinition {
    pub fn serverless(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ServiceKind::Serverless,
        }
    }
}
