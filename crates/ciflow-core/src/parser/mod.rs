//! KDL parser
//!
//! Parses `ciflow.kdl` project files. Node handling for each block lives in
//! its own module.

mod policy;
mod settings;

use policy::parse_deploy_policy;
use settings::{first_string, parse_pipeline_layout, parse_service, parse_source, parse_variables};

use crate::error::{ProjectError, Result};
use crate::model::{CiProject, DEFAULT_ENV_STAGE, DEFAULT_REGION, EnvSettings};
use kdl::KdlDocument;
use std::fs;
use std::path::Path;

/// Parse a KDL file into a project
pub fn parse_kdl_file<P: AsRef<Path>>(path: P) -> Result<CiProject> {
    let content = fs::read_to_string(path.as_ref())?;
    parse_kdl_string(&content)
}

/// Parse KDL content into a project
///
/// Scalar settings may appear more than once; the last occurrence wins, so
/// override files can simply be appended to the base file.
pub fn parse_kdl_string(content: &str) -> Result<CiProject> {
    let doc: KdlDocument = content.parse()?;

    let mut project_name: Option<String> = None;
    let mut env_stage: Option<String> = None;
    let mut account: Option<String> = None;
    let mut region: Option<String> = None;
    let mut project = CiProject::new(EnvSettings::new("", DEFAULT_ENV_STAGE));

    for node in doc.nodes() {
        match node.name().value() {
            "project" => {
                project_name = Some(first_string(node).ok_or_else(|| {
                    ProjectError::InvalidConfig("project requires a name".to_string())
                })?);
            }
            "env-stage" | "env_stage" => {
                env_stage = first_string(node);
            }
            "account" => {
                account = first_string(node);
            }
            "region" => {
                region = first_string(node);
            }
            "variables" => {
                project.variables.extend(parse_variables(node));
            }
            "service" => {
                let service = parse_service(node)?;
                if project.service(&service.name).is_some() {
                    return Err(ProjectError::DuplicateService(service.name));
                }
                project.services.push(service);
            }
            "source" => {
                parse_source(node, &mut project.source);
            }
            "pipeline" => {
                parse_pipeline_layout(node, &mut project.pipeline);
            }
            "deploy-policy" | "deploy_policy" => {
                project.grants = parse_deploy_policy(node)?;
            }
            other => {
                tracing::debug!(node = other, "Skipping unknown node");
            }
        }
    }

    let project_name = project_name.ok_or(ProjectError::MissingSetting("project"))?;
    if project_name.is_empty() {
        return Err(ProjectError::InvalidConfig(
            "project name must not be empty".to_string(),
        ));
    }

    project.settings = EnvSettings::new(
        project_name,
        env_stage.unwrap_or_else(|| DEFAULT_ENV_STAGE.to_string()),
    )
    .with_account(account.unwrap_or_default())
    .with_region(region.unwrap_or_else(|| DEFAULT_REGION.to_string()));

    Ok(project)
}
