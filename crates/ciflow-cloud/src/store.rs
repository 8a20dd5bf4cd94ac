//! On-disk template store
//!
//! Manages `.ciflow/{stack}.template.json`, which holds the last template
//! synthesized for a stack, so the next run can diff against it. Each stack
//! (one per env stage) keeps its own file.

use crate::error::{CloudError, Result};
use crate::synth::Template;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const STORE_VERSION: u32 = 1;
const STORE_DIR: &str = ".ciflow";
const TEMPLATE_SUFFIX: &str = "template.json";

/// Stored synthesis output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTemplate {
    /// Store format version
    pub version: u32,

    /// Stack the template was synthesized for
    pub stack_name: String,

    pub template: Template,
}

impl StoredTemplate {
    pub fn new(stack_name: impl Into<String>, template: Template) -> Self {
        Self {
            version: STORE_VERSION,
            stack_name: stack_name.into(),
            template,
        }
    }
}

/// Reads and writes the stored template of one stack under a project root
pub struct TemplateStore {
    /// Project root directory
    project_root: PathBuf,

    /// Stack whose template this store holds
    stack_name: String,
}

impl TemplateStore {
    pub fn new(project_root: impl AsRef<Path>, stack_name: impl Into<String>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            stack_name: stack_name.into(),
        }
    }

    /// Get the store directory path
    fn store_dir(&self) -> PathBuf {
        self.project_root.join(STORE_DIR)
    }

    /// Get the template file path
    pub fn template_path(&self) -> PathBuf {
        self.store_dir().join(format!("{}.{}", self.stack_name, TEMPLATE_SUFFIX))
    }

    /// Get the backup file path
    pub fn backup_path(&self) -> PathBuf {
        self.store_dir().join(format!("{}.{}.backup", self.stack_name, TEMPLATE_SUFFIX))
    }

    /// Ensure the store directory exists
    async fn ensure_store_dir(&self) -> Result<()> {
        let dir = self.store_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created store directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the stored template, if any
    ///
    /// A file written for another stack counts as nothing stored.
    pub async fn load(&self) -> Result<Option<StoredTemplate>> {
        let path = self.template_path();
        if !path.exists() {
            tracing::debug!("Template file not found, nothing stored yet");
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let stored: StoredTemplate = serde_json::from_str(&content)?;

        if stored.version > STORE_VERSION {
            return Err(CloudError::StoreError(format!(
                "Template file version {} is newer than supported version {}",
                stored.version, STORE_VERSION
            )));
        }

        if stored.stack_name != self.stack_name {
            tracing::warn!(
                expected = %self.stack_name,
                found = %stored.stack_name,
                "Stored template belongs to another stack, ignoring it"
            );
            return Ok(None);
        }

        tracing::debug!(
            "Loaded template with {} resources",
            stored.template.resources.len()
        );
        Ok(Some(stored))
    }

    /// Save a template, keeping the previous one as a backup
    pub async fn save(&self, stored: &StoredTemplate) -> Result<PathBuf> {
        if stored.stack_name != self.stack_name {
            return Err(CloudError::StoreError(format!(
                "Template for stack '{}' cannot be saved in the store of '{}'",
                stored.stack_name, self.stack_name
            )));
        }
        self.ensure_store_dir().await?;

        let path = self.template_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created template backup");
        }

        let mut content = serde_json::to_string_pretty(stored)?;
        content.push('\n');
        fs::write(&path, content).await?;

        tracing::debug!(
            "Saved template with {} resources",
            stored.template.resources.len()
        );
        Ok(path)
    }
}
