//! Build and deploy jobs for one Serverless Framework service
//!
//! For a service `s` of project `p` in environment `e` this registers:
//!
//! ```text
//! build stage:  p-build-s   input  → [make build-s]  → p-e-s
//! deploy stage: p-deploy-s  p-e-s  → [make deploy-s]
//! ```

use crate::commands;
use crate::defaults::DefaultEnvironment;
use crate::error::Result;
use ciflow_cloud::{
    Artifact, BuildEnvironment, BuildSpec, Cache, CodeBuildAction, EnvironmentVariable, IStage,
    LocalCacheMode, Phase, PolicyStatement, Project, Stack,
};
use ciflow_core::{DeployGrants, EnvSettings};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Bootstrap stack every CDK-style deployment relies on
pub const BOOTSTRAP_STACK: &str = "CDKToolkit";

/// Inputs for composing one service
#[derive(Debug, Clone, Copy)]
pub struct ServerlessCiProps<'a> {
    /// Service name (directory under `services/`)
    pub name: &'a str,

    pub env_settings: &'a EnvSettings,

    /// Artifact the build job starts from (usually the source checkout)
    pub input_artifact: &'a Artifact,

    /// Allow-list for the deploy role's unscoped statement
    pub grants: &'a DeployGrants,
}

/// `{project}-build-{service}`
pub fn build_name(settings: &EnvSettings, service: &str) -> String {
    format!("{}-build-{}", settings.project_name, service)
}

/// `{project}-deploy-{service}`
pub fn deploy_name(settings: &EnvSettings, service: &str) -> String {
    format!("{}-deploy-{}", settings.project_name, service)
}

/// `{project}-{stage}-{service}`
pub fn build_artifact(settings: &EnvSettings, service: &str) -> Artifact {
    Artifact::artifact(format!("{}-{}", settings.project_env_name(), service))
}

/// CloudFormation stack deployed by the service's own deploy target
pub fn service_stack_name(settings: &EnvSettings, service: &str) -> String {
    format!("{}-{}-{}", settings.project_name, service, settings.env_stage)
}

/// Build job: install tooling, run the service's build target, export the workspace
pub fn build_project(
    props: &ServerlessCiProps<'_>,
    env_variables: BTreeMap<String, EnvironmentVariable>,
) -> Project {
    let build_spec = BuildSpec::new()
        .phase(Phase::PreBuild, [commands::INSTALL_SERVERLESS.to_string()])
        .phase(Phase::Build, [commands::build_target(props.name)])
        .artifact_files(commands::build_artifact_files(props.name));

    Project::new(
        format!("{}/BuildProject", props.name),
        build_name(props.env_settings, props.name),
        build_spec,
    )
    .with_environment(BuildEnvironment::privileged())
    .with_environment_variables(env_variables)
    .with_cache(Cache::local([LocalCacheMode::Custom]))
}

/// Deploy job: install tooling and service dependencies, run the deploy target
///
/// The role gets `cloudformation:*` scoped to the bootstrap stack and the
/// service's own stack, plus the configured grants on every resource.
pub fn deploy_project(
    props: &ServerlessCiProps<'_>,
    stack: &Stack,
    env_variables: BTreeMap<String, EnvironmentVariable>,
) -> Project {
    let build_spec = BuildSpec::new()
        .phase(
            Phase::PreBuild,
            [
                commands::INSTALL_SERVERLESS.to_string(),
                commands::service_install(props.name),
            ],
        )
        .phase(Phase::Build, [commands::deploy_target(props.name)])
        .cache_paths(commands::deploy_cache_paths(props.name));

    let mut project = Project::new(
        format!("{}/DeployProject", props.name),
        deploy_name(props.env_settings, props.name),
        build_spec,
    )
    .with_environment(BuildEnvironment::privileged())
    .with_environment_variables(env_variables)
    .with_cache(Cache::local([LocalCacheMode::Custom, LocalCacheMode::DockerLayer]));

    project.add_to_role_policy(PolicyStatement::allow(
        ["cloudformation:*"],
        [
            stack.format_arn("cloudformation", &format!("stack/{}/*", BOOTSTRAP_STACK)),
            stack.format_arn(
                "cloudformation",
                &format!("stack/{}/*", service_stack_name(props.env_settings, props.name)),
            ),
        ],
    ));

    if !props.grants.is_empty() {
        project.add_to_role_policy(PolicyStatement::allow(props.grants.action_patterns(), ["*"]));
    }

    project
}

/// Jobs and actions composed for one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerlessCiConfig {
    pub service: String,

    /// Artifact passed from the build action to the deploy action
    pub build_artifact: Artifact,

    pub build_project: Project,

    pub deploy_project: Project,

    pub build_action: CodeBuildAction,

    pub deploy_action: CodeBuildAction,
}

impl ServerlessCiConfig {
    /// Compose the service's jobs, add them to `stack` and register their
    /// actions: build into `build_stage` first, then deploy into `deploy_stage`.
    ///
    /// Every registration is checked before anything is added, so on error
    /// the stack and both stages are left untouched.
    #[instrument(skip_all, fields(service = %props.name))]
    pub fn new(
        stack: &mut Stack,
        defaults: &dyn DefaultEnvironment,
        props: ServerlessCiProps<'_>,
        build_stage: &mut dyn IStage,
        deploy_stage: &mut dyn IStage,
    ) -> Result<Self> {
        let build_artifact = build_artifact(props.env_settings, props.name);

        let build_project = build_project(&props, defaults.default_env_variables());
        let build_action = CodeBuildAction::new(
            build_name(props.env_settings, props.name),
            &build_project,
            props.input_artifact.clone(),
        )
        .with_outputs(vec![build_artifact.clone()]);

        let deploy_project = deploy_project(&props, stack, defaults.default_env_variables());
        let deploy_action = CodeBuildAction::new(
            deploy_name(props.env_settings, props.name),
            &deploy_project,
            build_artifact.clone(),
        );

        stack.check_construct_path(&build_project.construct_path)?;
        stack.check_construct_path(&deploy_project.construct_path)?;
        build_stage.check_action(&build_action.action_name)?;
        deploy_stage.check_action(&deploy_action.action_name)?;

        stack.add_project(build_project.clone())?;
        build_stage.add_action(build_action.clone().into())?;
        stack.add_project(deploy_project.clone())?;
        deploy_stage.add_action(deploy_action.clone().into())?;

        debug!(
            build_stage = %build_stage.stage_name(),
            deploy_stage = %deploy_stage.stage_name(),
            artifact = %build_artifact,
            "Composed service jobs"
        );

        Ok(Self {
            service: props.name.to_string(),
            build_artifact,
            build_project,
            deploy_project,
            build_action,
            deploy_action,
        })
    }
}
