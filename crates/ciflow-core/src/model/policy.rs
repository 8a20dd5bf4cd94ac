//! Deploy-role grants

use serde::{Deserialize, Serialize};

/// Service prefixes granted `{prefix}:*` on every resource by default
pub const DEFAULT_SERVICE_PREFIXES: [&str; 5] = ["iam", "cloudfront", "s3", "lambda", "apigateway"];

/// Single actions granted on every resource by default
pub const DEFAULT_EXTRA_ACTIONS: [&str; 1] = ["cloudformation:ValidateTemplate"];

/// Allow-list for the unscoped statement of a deploy job's role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployGrants {
    /// Services granted full access (`{prefix}:*`)
    pub service_prefixes: Vec<String>,

    /// Individual actions (`service:Action`)
    pub extra_actions: Vec<String>,
}

impl Default for DeployGrants {
    fn default() -> Self {
        Self {
            service_prefixes: DEFAULT_SERVICE_PREFIXES.iter().map(|s| s.to_string()).collect(),
            extra_actions: DEFAULT_EXTRA_ACTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DeployGrants {
    pub fn empty() -> Self {
        Self {
            service_prefixes: Vec::new(),
            extra_actions: Vec::new(),
        }
    }

    /// Action patterns in declaration order: prefixes first, then extra actions
    pub fn action_patterns(&self) -> Vec<String> {
        self.service_prefixes
            .iter()
            .map(|p| format!("{}:*", p))
            .chain(self.extra_actions.iter().cloned())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.service_prefixes.is_empty() && self.extra_actions.is_empty()
    }
}
