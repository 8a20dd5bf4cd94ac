//! Whole-project assembly: source stage plus one build/deploy pair per service

use crate::defaults::ServiceCiDefaults;
use crate::error::{Result, ServerlessError};
use crate::serverless::{ServerlessCiConfig, ServerlessCiProps};
use ciflow_cloud::{Artifact, IStage, Pipeline, SourceAction, Stack, Stage, Template};
use ciflow_core::CiProject;
use tracing::{info, instrument};

/// Name of the action checking out the repository
pub const SOURCE_ACTION: &str = "checkout";

/// Stack, pipeline and per-service jobs for one project environment
#[derive(Debug, Clone, PartialEq)]
pub struct ServerlessApp {
    pub stack: Stack,
    pub pipeline: Pipeline,

    /// One entry per service, in declaration order
    pub services: Vec<ServerlessCiConfig>,
}

impl ServerlessApp {
    pub fn service(&self, name: &str) -> Option<&ServerlessCiConfig> {
        self.services.iter().find(|s| s.service == name)
    }

    /// Validate the pipeline wiring and render the template
    pub fn synthesize(&self) -> Result<Template> {
        Ok(ciflow_cloud::synthesize(&self.stack, &self.pipeline)?)
    }
}

/// `{projectEnvName}-ci`
pub fn stack_name(project: &CiProject) -> String {
    format!("{}-ci", project.settings.project_env_name())
}

/// `{projectEnvName}-source`
pub fn source_artifact(project: &CiProject) -> Artifact {
    Artifact::artifact(format!("{}-source", project.settings.project_env_name()))
}

fn source_stage(project: &CiProject, output: &Artifact) -> Result<Stage> {
    let source = &project.source;
    if source.connection_arn.is_empty() {
        return Err(ServerlessError::MissingSource("connection"));
    }
    if source.repository.is_empty() {
        return Err(ServerlessError::MissingSource("repository"));
    }

    let mut stage = Stage::new(&project.pipeline.source_stage);
    stage.add_action(
        SourceAction {
            action_name: SOURCE_ACTION.to_string(),
            connection_arn: source.connection_arn.clone(),
            repository: source.repository.clone(),
            branch: source.branch.clone(),
            output: output.clone(),
        }
        .into(),
    )?;
    Ok(stage)
}

/// Assemble the stack and pipeline for a loaded project
///
/// Services are composed in declaration order, so the build and deploy
/// stages list their actions in that order too.
#[instrument(skip_all, fields(project = %project.settings.project_env_name()))]
pub fn assemble(project: &CiProject) -> Result<ServerlessApp> {
    if project.services.is_empty() {
        return Err(ServerlessError::NoServices);
    }

    let settings = &project.settings;
    let input = source_artifact(project);
    let source = source_stage(project, &input)?;

    let mut stack = Stack::new(stack_name(project), &settings.account, &settings.region);
    let defaults = ServiceCiDefaults::from_project(project);
    let mut build = Stage::new(&project.pipeline.build_stage);
    let mut deploy = Stage::new(&project.pipeline.deploy_stage);

    let services = project
        .services
        .iter()
        .map(|service| {
            let props = ServerlessCiProps {
                name: &service.name,
                env_settings: settings,
                input_artifact: &input,
                grants: &project.grants,
            };
            ServerlessCiConfig::new(&mut stack, &defaults, props, &mut build, &mut deploy)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut pipeline = Pipeline::new(settings.project_env_name());
    for stage in [source, build, deploy] {
        pipeline.add_stage(stage)?;
    }

    info!(
        stack = %stack.name,
        services = services.len(),
        projects = stack.projects.len(),
        "Pipeline assembled"
    );

    Ok(ServerlessApp {
        stack,
        pipeline,
        services,
    })
}
