//! Project loader
//!
//! Ties discovery and parsing together.

use crate::discovery::{DiscoveredFiles, discover_files, find_project_root};
use crate::error::{ProjectError, Result};
use crate::model::CiProject;
use crate::parser::parse_kdl_string;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Environment variable selecting the stage when none is passed explicitly
pub const ENV_STAGE_ENV: &str = "CIFLOW_ENV_STAGE";

/// Load the project around the current directory
#[instrument]
pub fn load_project(stage: Option<&str>) -> Result<CiProject> {
    let project_root = find_project_root()?;
    load_project_from_root_with_stage(&project_root, stage)
}

/// Load the project at `project_root` without a stage override
#[instrument(skip(project_root), fields(project_root = %project_root.display()))]
pub fn load_project_from_root(project_root: &Path) -> Result<CiProject> {
    load_project_from_root_with_stage(project_root, None)
}

/// Load the project at `project_root` for a stage
///
/// Files are read as `ciflow.kdl` → `ciflow.{stage}.kdl` → `ciflow.local.kdl`
/// and parsed as one document, so later files override earlier ones. When a
/// stage is given it also becomes the project's env stage.
#[instrument(skip(project_root), fields(project_root = %project_root.display()))]
pub fn load_project_from_root_with_stage(
    project_root: &Path,
    stage: Option<&str>,
) -> Result<CiProject> {
    debug!("Step 1: Discovering files");
    let discovered = discover_files(project_root, stage)?;

    debug!("Step 2: Reading files");
    let content = read_all_files(&discovered)?;

    debug!("Step 3: Parsing KDL");
    let mut project = parse_kdl_string(&content)?;
    if let Some(stage) = stage {
        project.settings.env_stage = stage.to_string();
    }

    info!(
        project = %project.settings.project_name,
        env_stage = %project.settings.env_stage,
        services = project.services.len(),
        "Project loaded successfully"
    );
    Ok(project)
}

fn read_all_files(discovered: &DiscoveredFiles) -> Result<String> {
    let mut content = String::new();
    for path in discovered.in_load_order() {
        let text = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
            path: path.clone(),
            message: e.to_string(),
        })?;
        content.push_str(&text);
        content.push('\n');
    }
    Ok(content)
}

/// Stage from an explicit argument, falling back to `CIFLOW_ENV_STAGE`
pub fn resolve_stage(explicit: Option<&str>) -> Option<String> {
    explicit
        .map(|s| s.to_string())
        .or_else(|| std::env::var(ENV_STAGE_ENV).ok())
        .filter(|s| !s.is_empty())
}
