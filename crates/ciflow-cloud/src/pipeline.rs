//! Pipeline, stage, action and artifact descriptors

use crate::codebuild::Project;
use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Named bundle of files passed between actions
///
/// Identity is the name: two artifacts with the same name are the same artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
}

impl Artifact {
    pub fn artifact(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Action that runs a CodeBuild project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBuildAction {
    pub action_name: String,

    /// Name of the project to run
    pub project_name: String,

    pub input: Artifact,

    #[serde(default)]
    pub outputs: Vec<Artifact>,

    #[serde(default = "default_run_order")]
    pub run_order: u32,
}

fn default_run_order() -> u32 {
    1
}

impl CodeBuildAction {
    pub fn new(action_name: impl Into<String>, project: &Project, input: Artifact) -> Self {
        Self {
            action_name: action_name.into(),
            project_name: project.project_name.clone(),
            input,
            outputs: Vec::new(),
            run_order: default_run_order(),
        }
    }

    pub fn with_outputs(mut self, outputs: Vec<Artifact>) -> Self {
        self.outputs = outputs;
        self
    }
}

/// Source action pulling a repository through a CodeStar connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAction {
    pub action_name: String,

    pub connection_arn: String,

    /// Repository in `owner/name` form
    pub repository: String,

    pub branch: String,

    pub output: Artifact,
}

/// Any action a stage can hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Source(SourceAction),
    CodeBuild(CodeBuildAction),
}

impl Action {
    pub fn name(&self) -> &str {
        match self {
            Action::Source(a) => &a.action_name,
            Action::CodeBuild(a) => &a.action_name,
        }
    }

    pub fn inputs(&self) -> Vec<&Artifact> {
        match self {
            Action::Source(_) => Vec::new(),
            Action::CodeBuild(a) => vec![&a.input],
        }
    }

    pub fn outputs(&self) -> Vec<&Artifact> {
        match self {
            Action::Source(a) => vec![&a.output],
            Action::CodeBuild(a) => a.outputs.iter().collect(),
        }
    }

    pub fn run_order(&self) -> u32 {
        match self {
            Action::Source(_) => 1,
            Action::CodeBuild(a) => a.run_order,
        }
    }
}

impl From<CodeBuildAction> for Action {
    fn from(action: CodeBuildAction) -> Self {
        Action::CodeBuild(action)
    }
}

impl From<SourceAction> for Action {
    fn from(action: SourceAction) -> Self {
        Action::Source(action)
    }
}

/// Stage registration capability
///
/// Composers only ever append to a stage they were handed; the pipeline that
/// owns the stage decides where it sits.
pub trait IStage {
    fn stage_name(&self) -> &str;

    /// Whether an action of this name could be added without error
    fn check_action(&self, action_name: &str) -> Result<()>;

    fn add_action(&mut self, action: Action) -> Result<()>;
}

/// Ordered slot of a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,

    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Stage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl IStage for Stage {
    fn stage_name(&self) -> &str {
        &self.name
    }

    fn check_action(&self, action_name: &str) -> Result<()> {
        if self.action(action_name).is_some() {
            return Err(CloudError::DuplicateAction {
                stage: self.name.clone(),
                action: action_name.to_string(),
            });
        }
        Ok(())
    }

    fn add_action(&mut self, action: Action) -> Result<()> {
        self.check_action(action.name())?;
        tracing::debug!(stage = %self.name, action = %action.name(), "Registered action");
        self.actions.push(action);
        Ok(())
    }
}

/// Pipeline descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,

    #[serde(default)]
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Append a stage; stage names are unique
    pub fn add_stage(&mut self, stage: Stage) -> Result<()> {
        if self.stage(&stage.name).is_some() {
            return Err(CloudError::DuplicateStage(stage.name));
        }
        self.stages.push(stage);
        Ok(())
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn stage_mut(&mut self, name: &str) -> Result<&mut Stage> {
        self.stages
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| CloudError::StageNotFound(name.to_string()))
    }

    /// Position of an action as (stage index, action index)
    pub fn position(&self, action_name: &str) -> Option<(usize, usize)> {
        self.stages.iter().enumerate().find_map(|(si, stage)| {
            stage
                .actions
                .iter()
                .position(|a| a.name() == action_name)
                .map(|ai| (si, ai))
        })
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.stages.iter().flat_map(|s| s.actions.iter())
    }

    /// Check stage and artifact wiring
    ///
    /// Every stage must hold an action, every artifact must be produced once,
    /// and every consumed artifact must come from an earlier stage.
    pub fn validate(&self) -> Result<()> {
        let mut producers: HashMap<&str, &str> = HashMap::new();

        for stage in &self.stages {
            if stage.is_empty() {
                return Err(CloudError::EmptyStage(stage.name.clone()));
            }

            for action in &stage.actions {
                for input in action.inputs() {
                    if !producers.contains_key(input.name.as_str()) {
                        return Err(CloudError::UnproducedArtifact {
                            action: action.name().to_string(),
                            artifact: input.name.clone(),
                        });
                    }
                }
            }

            // outputs become visible to the next stage only
            for action in &stage.actions {
                for output in action.outputs() {
                    if let Some(first) = producers.insert(output.name.as_str(), action.name()) {
                        return Err(CloudError::DuplicateArtifact {
                            artifact: output.name.clone(),
                            first: first.to_string(),
                            second: action.name().to_string(),
                        });
                    }
                }
            }
        }

        tracing::debug!(
            pipeline = %self.name,
            stages = self.stages.len(),
            artifacts = producers.len(),
            "Pipeline wiring is valid"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebuild::BuildSpec;

    fn source_stage() -> Stage {
        let mut stage = Stage::new("Source");
        stage
            .add_action(
                SourceAction {
                    action_name: "checkout".to_string(),
                    connection_arn: "arn:aws:codestar-connections:us-east-1:1:connection/x"
                        .to_string(),
                    repository: "acme/app".to_string(),
                    branch: "main".to_string(),
                    output: Artifact::artifact("source"),
                }
                .into(),
            )
            .unwrap();
        stage
    }

    fn build_action(name: &str, input: &str, output: Option<&str>) -> Action {
        let project = Project::new(name, name, BuildSpec::new());
        let action = CodeBuildAction::new(name, &project, Artifact::artifact(input));
        match output {
            Some(out) => action.with_outputs(vec![Artifact::artifact(out)]).into(),
            None => action.into(),
        }
    }

    #[test]
    fn test_duplicate_action_rejected() {
        let mut stage = Stage::new("Build");
        stage.add_action(build_action("a", "source", None)).unwrap();

        let err = stage
            .add_action(build_action("a", "source", None))
            .unwrap_err();
        assert!(matches!(err, CloudError::DuplicateAction { .. }));
        assert_eq!(stage.actions.len(), 1);
        assert!(stage.check_action("a").is_err());
        assert!(stage.check_action("b").is_ok());
    }

    #[test]
    fn test_valid_wiring() {
        let mut pipeline = Pipeline::new("p");
        pipeline.add_stage(source_stage()).unwrap();

        let mut build = Stage::new("Build");
        build
            .add_action(build_action("build", "source", Some("built")))
            .unwrap();
        pipeline.add_stage(build).unwrap();

        let mut deploy = Stage::new("Deploy");
        deploy.add_action(build_action("deploy", "built", None)).unwrap();
        pipeline.add_stage(deploy).unwrap();

        pipeline.validate().unwrap();
        assert_eq!(pipeline.position("deploy"), Some((2, 0)));
        assert_eq!(pipeline.actions().count(), 3);
    }

    #[test]
    fn test_artifact_from_same_stage_is_not_visible() {
        let mut pipeline = Pipeline::new("p");
        pipeline.add_stage(source_stage()).unwrap();

        let mut build = Stage::new("Build");
        build
            .add_action(build_action("build", "source", Some("built")))
            .unwrap();
        build.add_action(build_action("deploy", "built", None)).unwrap();
        pipeline.add_stage(build).unwrap();

        let err = pipeline.validate().unwrap_err();
        assert!(matches!(
            err,
            CloudError::UnproducedArtifact { ref artifact, .. } if artifact == "built"
        ));
    }

    #[test]
    fn test_duplicate_artifact_and_empty_stage() {
        let mut pipeline = Pipeline::new("p");
        pipeline.add_stage(source_stage()).unwrap();
        let mut build = Stage::new("Build");
        build
            .add_action(build_action("a", "source", Some("source")))
            .unwrap();
        pipeline.add_stage(build).unwrap();
        assert!(matches!(
            pipeline.validate().unwrap_err(),
            CloudError::DuplicateArtifact { .. }
        ));

        let mut empty = Pipeline::new("p");
        empty.add_stage(Stage::new("Build")).unwrap();
        assert!(matches!(
            empty.validate().unwrap_err(),
            CloudError::EmptyStage(_)
        ));
    }

    #[test]
    fn test_duplicate_stage_and_missing_stage() {
        let mut pipeline = Pipeline::new("p");
        pipeline.add_stage(Stage::new("Build")).unwrap();
        assert!(pipeline.add_stage(Stage::new("Build")).is_err());
        assert!(matches!(
            pipeline.stage_mut("Deploy").unwrap_err(),
            CloudError::StageNotFound(_)
        ));
    }
}
