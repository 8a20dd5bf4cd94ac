//! deploy-policy node

use crate::error::{ProjectError, Result};
use crate::model::DeployGrants;
use kdl::KdlNode;

/// Parse `deploy-policy`
///
/// ```kdl
/// deploy-policy {
///     allow "iam" "cloudfront" "s3" "lambda" "apigateway"
///     action "cloudformation:ValidateTemplate"
/// }
/// ```
///
/// A present block replaces the default grants entirely.
pub fn parse_deploy_policy(node: &KdlNode) -> Result<DeployGrants> {
    let mut grants = DeployGrants::empty();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let values: Vec<String> = child
                .entries()
                .iter()
                .filter(|e| e.name().is_none())
                .filter_map(|e| e.value().as_string().map(|s| s.to_string()))
                .collect();

            match child.name().value() {
                "allow" => {
                    for prefix in values {
                        if prefix.contains(':') || prefix.contains('*') {
                            return Err(ProjectError::InvalidConfig(format!(
                                "deploy-policy allow takes a service prefix, got '{}'",
                                prefix
                            )));
                        }
                        grants.service_prefixes.push(prefix);
                    }
                }
                "action" => {
                    for action in values {
                        if !action.contains(':') {
                            return Err(ProjectError::InvalidConfig(format!(
                                "deploy-policy action must look like 'service:Action', got '{}'",
                                action
                            )));
                        }
                        grants.extra_actions.push(action);
                    }
                }
                other => tracing::debug!(node = other, "Skipping unknown deploy-policy entry"),
            }
        }
    }

    Ok(grants)
}
