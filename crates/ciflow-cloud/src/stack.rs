//! Deployment stack: account/region context and project ownership

use crate::codebuild::Project;
use crate::error::{CloudError, Result};
use crate::synth::logical_id;
use serde::{Deserialize, Serialize};

/// A stack groups the resources synthesized into one template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    /// Stack name (e.g., "acme-dev-ci")
    pub name: String,

    /// AWS account ID the stack deploys into
    pub account: String,

    /// AWS region the stack deploys into
    pub region: String,

    /// CodeBuild projects owned by this stack, in creation order
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Stack {
    pub fn new(
        name: impl Into<String>,
        account: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            account: account.into(),
            region: region.into(),
            projects: Vec::new(),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Build an ARN in this stack's partition, region and account
    ///
    /// `format_arn("cloudformation", "stack/CDKToolkit/*")` gives
    /// `arn:aws:cloudformation:{region}:{account}:stack/CDKToolkit/*`.
    pub fn format_arn(&self, service: &str, resource: &str) -> String {
        format!("arn:aws:{}:{}:{}:{}", service, self.region, self.account, resource)
    }

    /// Check that `construct_path` is still free in this stack
    pub fn check_construct_path(&self, construct_path: &str) -> Result<()> {
        if self.projects.iter().any(|p| p.construct_path == construct_path) {
            return Err(CloudError::DuplicateConstruct {
                path: construct_path.to_string(),
                logical_id: logical_id(construct_path),
            });
        }
        Ok(())
    }

    /// Register a project; construct paths must be unique within the stack
    pub fn add_project(&mut self, project: Project) -> Result<()> {
        self.check_construct_path(&project.construct_path)?;
        tracing::debug!(
            project = %project.project_name,
            path = %project.construct_path,
            "Added project to stack {}",
            self.name
        );
        self.projects.push(project);
        Ok(())
    }

    pub fn project(&self, project_name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.project_name == project_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebuild::BuildSpec;

    #[test]
    fn test_format_arn() {
        let stack = Stack::new("acme-dev-ci", "123456789012", "eu-west-1");
        assert_eq!(
            stack.format_arn("cloudformation", "stack/CDKToolkit/*"),
            "arn:aws:cloudformation:eu-west-1:123456789012:stack/CDKToolkit/*"
        );
    }

    #[test]
    fn test_add_project_rejects_duplicate_path() {
        let mut stack = Stack::new("s", "1", "us-east-1");
        let project = Project::new("api/BuildProject", "acme-build-api", BuildSpec::new());
        stack.add_project(project.clone()).unwrap();

        let err = stack.add_project(project).unwrap_err();
        assert!(matches!(
            err,
            CloudError::DuplicateConstruct { ref path, ref logical_id }
                if path == "api/BuildProject" && logical_id == "ApiBuildProject"
        ));
        assert_eq!(stack.projects.len(), 1);
        assert!(stack.project("acme-build-api").is_some());
    }
}
