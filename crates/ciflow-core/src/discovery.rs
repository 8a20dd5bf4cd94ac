//! Project file discovery
//!
//! Finds the project root and the files that make up a project:
//! `ciflow.kdl`, then `ciflow.{stage}.kdl`, then `ciflow.local.kdl`.

use crate::error::{ProjectError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const PROJECT_FILE: &str = "ciflow.kdl";
pub const LOCAL_FILE: &str = "ciflow.local.kdl";
pub const PROJECT_DIR: &str = ".ciflow";
pub const PROJECT_ROOT_ENV: &str = "CIFLOW_PROJECT_ROOT";

/// Files found for one project, in load order
#[derive(Debug, Clone, Default)]
pub struct DiscoveredFiles {
    /// Base file (ciflow.kdl or .ciflow/ciflow.kdl)
    pub root: Option<PathBuf>,
    /// Stage override (ciflow.{stage}.kdl)
    pub stage_override: Option<PathBuf>,
    /// Local override (ciflow.local.kdl)
    pub local_override: Option<PathBuf>,
}

impl DiscoveredFiles {
    /// All present files in load order
    pub fn in_load_order(&self) -> Vec<&PathBuf> {
        [&self.root, &self.stage_override, &self.local_override]
            .into_iter()
            .flatten()
            .collect()
    }
}

fn has_project_file(dir: &Path) -> bool {
    dir.join(PROJECT_FILE).exists() || dir.join(PROJECT_DIR).join(PROJECT_FILE).exists()
}

/// Find the project root
///
/// Search order:
/// 1. `CIFLOW_PROJECT_ROOT`
/// 2. the current directory and its ancestors, looking for `ciflow.kdl` or
///    `.ciflow/ciflow.kdl`
#[tracing::instrument]
pub fn find_project_root() -> Result<PathBuf> {
    if let Ok(root) = std::env::var(PROJECT_ROOT_ENV) {
        let path = PathBuf::from(&root);
        debug!(env_root = %root, "Checking {}", PROJECT_ROOT_ENV);
        if has_project_file(&path) {
            info!(project_root = %path.display(), "Found project root from environment variable");
            return Ok(path);
        }
    }

    let start_dir = std::env::current_dir()?;
    find_project_root_from(&start_dir)
}

/// Find the project root starting at `start_dir` and walking up
pub fn find_project_root_from(start_dir: &Path) -> Result<PathBuf> {
    let mut current = start_dir.to_path_buf();
    debug!(start_dir = %start_dir.display(), "Searching for project root");

    loop {
        if has_project_file(&current) {
            info!(project_root = %current.display(), "Found project root");
            return Ok(current);
        }
        if !current.pop() {
            break;
        }
    }

    warn!(start_dir = %start_dir.display(), "Project root not found");
    Err(ProjectError::ProjectRootNotFound(start_dir.to_path_buf()))
}

/// Find a file in the root or in `.ciflow/`, root first
fn find_in_root(project_root: &Path, name: &str) -> Option<PathBuf> {
    [
        project_root.join(name),
        project_root.join(PROJECT_DIR).join(name),
    ]
    .into_iter()
    .find(|p| p.is_file())
}

/// Discover the project files for an optional stage
pub fn discover_files(project_root: &Path, stage: Option<&str>) -> Result<DiscoveredFiles> {
    let root = find_in_root(project_root, PROJECT_FILE);
    if root.is_none() {
        return Err(ProjectError::ProjectRootNotFound(project_root.to_path_buf()));
    }

    let local_override = find_in_root(project_root, LOCAL_FILE);
    // stage "local" names the local override itself; load it once
    let stage_override = stage
        .and_then(|s| find_in_root(project_root, &format!("ciflow.{}.kdl", s)))
        .filter(|path| Some(path) != local_override.as_ref());

    let discovered = DiscoveredFiles {
        root,
        stage_override,
        local_override,
    };
    debug!(files = ?discovered.in_load_order(), "Discovered project files");
    Ok(discovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_discover_root_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(PROJECT_FILE), "project \"a\"").unwrap();

        let files = discover_files(temp_dir.path(), Some("prod")).unwrap();
        assert!(files.root.is_some());
        assert!(files.stage_override.is_none());
        assert!(files.local_override.is_none());
        assert_eq!(files.in_load_order().len(), 1);
    }

    #[test]
    fn test_discover_overrides_in_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(root.join(PROJECT_FILE), "").unwrap();
        fs::write(root.join("ciflow.prod.kdl"), "").unwrap();
        fs::write(root.join(LOCAL_FILE), "").unwrap();

        let files = discover_files(root, Some("prod")).unwrap();
        let order: Vec<_> = files
            .in_load_order()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(order, vec!["ciflow.kdl", "ciflow.prod.kdl", "ciflow.local.kdl"]);

        // stage override is only picked up for its own stage
        let files = discover_files(root, Some("dev")).unwrap();
        assert!(files.stage_override.is_none());
    }

    #[test]
    fn test_local_stage_loads_local_file_once() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(root.join(PROJECT_FILE), "").unwrap();
        fs::write(root.join(LOCAL_FILE), "").unwrap();

        let files = discover_files(root, Some("local")).unwrap();
        assert!(files.stage_override.is_none());
        assert!(files.local_override.is_some());
        assert_eq!(files.in_load_order().len(), 2);
    }

    #[test]
    fn test_discover_in_project_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join(PROJECT_DIR);
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(PROJECT_FILE), "").unwrap();

        let files = discover_files(temp_dir.path(), None).unwrap();
        assert!(files.root.unwrap().ends_with(".ciflow/ciflow.kdl"));
    }

    #[test]
    fn test_discover_without_project_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_files(temp_dir.path(), None),
            Err(ProjectError::ProjectRootNotFound(_))
        ));
    }

    #[test]
    fn test_find_root_walks_up() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(PROJECT_FILE), "").unwrap();
        let nested = temp_dir.path().join("services").join("api");
        fs::create_dir_all(&nested).unwrap();

        let root = find_project_root_from(&nested).unwrap();
        assert_eq!(root, temp_dir.path());
    }

    #[test]
    #[serial]
    fn test_find_root_from_env() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(PROJECT_FILE), "").unwrap();

        temp_env::with_var(PROJECT_ROOT_ENV, Some(temp_dir.path()), || {
            let root = find_project_root().unwrap();
            assert_eq!(root, temp_dir.path());
        });
    }
}
