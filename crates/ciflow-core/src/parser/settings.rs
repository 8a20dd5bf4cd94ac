//! Scalar, variable, service, source and pipeline nodes

use crate::error::{ProjectError, Result};
use crate::model::{PipelineLayout, ServiceDefinition, ServiceKind, SourceSettings};
use kdl::KdlNode;
use std::collections::BTreeMap;

/// First positional string argument of a node
pub fn first_string(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

/// Value of a named string property (`key="value"`)
fn string_property(node: &KdlNode, key: &str) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().map(|n| n.value()) == Some(key))
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

/// variables { KEY "value" }
pub fn parse_variables(node: &KdlNode) -> BTreeMap<String, String> {
    let mut variables = BTreeMap::new();
    if let Some(children) = node.children() {
        for var in children.nodes() {
            let key = var.name().value().to_string();
            let value = first_string(var).unwrap_or_default();
            variables.insert(key, value);
        }
    }
    variables
}

/// service "name" kind="serverless"
pub fn parse_service(node: &KdlNode) -> Result<ServiceDefinition> {
    let name = first_string(node)
        .ok_or_else(|| ProjectError::InvalidConfig("service requires a name".to_string()))?;

    let kind = match string_property(node, "kind") {
        Some(kind) => kind
            .parse::<ServiceKind>()
            .map_err(|e| ProjectError::InvalidConfig(format!("service '{}': {}", name, e)))?,
        None => ServiceKind::default(),
    };

    Ok(ServiceDefinition { name, kind })
}

/// source { connection "arn"; repository "owner/repo"; branch "main" }
pub fn parse_source(node: &KdlNode, source: &mut SourceSettings) {
    if let Some(children) = node.children() {
        for child in children.nodes() {
            let Some(value) = first_string(child) else {
                continue;
            };
            match child.name().value() {
                "connection" | "connection-arn" => source.connection_arn = value,
                "repository" | "repo" => source.repository = value,
                "branch" => source.branch = value,
                other => tracing::debug!(node = other, "Skipping unknown source setting"),
            }
        }
    }
}

/// pipeline { source-stage "Source"; build-stage "Build"; deploy-stage "Deploy" }
pub fn parse_pipeline_layout(node: &KdlNode, layout: &mut PipelineLayout) {
    if let Some(children) = node.children() {
        for child in children.nodes() {
            let Some(value) = first_string(child) else {
                continue;
            };
            match child.name().value() {
                "source-stage" | "source_stage" => layout.source_stage = value,
                "build-stage" | "build_stage" => layout.build_stage = value,
                "deploy-stage" | "deploy_stage" => layout.deploy_stage = value,
                other => tracing::debug!(node = other, "Skipping unknown pipeline setting"),
            }
        }
    }
}
