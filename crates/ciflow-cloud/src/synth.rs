//! Template synthesis
//!
//! Renders a [`Stack`] and its [`Pipeline`] into a CloudFormation-style
//! template. All maps are ordered, so identical descriptors always give
//! byte-identical output.

use crate::codebuild::{Cache, Project};
use crate::error::{CloudError, Result};
use crate::iam::{PolicyStatement, policy_document, service_trust_policy};
use crate::pipeline::{Action, Artifact, Pipeline};
use crate::stack::Stack;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

pub const CODEBUILD_PROJECT: &str = "AWS::CodeBuild::Project";
pub const CODEPIPELINE_PIPELINE: &str = "AWS::CodePipeline::Pipeline";
pub const IAM_ROLE: &str = "AWS::IAM::Role";
pub const IAM_POLICY: &str = "AWS::IAM::Policy";
pub const S3_BUCKET: &str = "AWS::S3::Bucket";

/// One template resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,

    #[serde(rename = "Properties", default)]
    pub properties: Value,

    #[serde(rename = "DependsOn", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl Resource {
    fn new(resource_type: &str, properties: Value) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            properties,
            depends_on: Vec::new(),
        }
    }

    fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }
}

/// Synthesized template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,

    #[serde(rename = "Description", default)]
    pub description: String,

    #[serde(rename = "Resources", default)]
    pub resources: BTreeMap<String, Resource>,
}

impl Template {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: description.into(),
            resources: BTreeMap::new(),
        }
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> {
        self.resources
            .iter()
            .filter(move |(_, r)| r.resource_type == resource_type)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Turn a construct path into a logical ID
///
/// `"api/BuildProject"` becomes `"ApiBuildProject"`; characters outside
/// `[A-Za-z0-9]` act as word separators and are dropped.
pub fn logical_id(path: &str) -> String {
    path.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Allocates logical IDs and refuses collisions between distinct paths
#[derive(Default)]
struct LogicalIds {
    taken: HashMap<String, String>,
}

impl LogicalIds {
    fn allocate(&mut self, path: &str) -> Result<String> {
        let id = logical_id(path);
        if id.is_empty() {
            return Err(CloudError::InvalidConfig(format!(
                "construct path '{}' has no alphanumeric characters",
                path
            )));
        }
        if let Some(existing) = self.taken.get(&id)
            && existing != path
        {
            return Err(CloudError::DuplicateConstruct {
                path: path.to_string(),
                logical_id: id,
            });
        }
        self.taken.insert(id.clone(), path.to_string());
        Ok(id)
    }
}

fn get_att_arn(logical_id: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, "Arn"] })
}

fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// Role + optional policy for a principal; returns (role id, policy id)
fn add_role<S: Serialize>(
    template: &mut Template,
    ids: &mut LogicalIds,
    path: &str,
    principal: &str,
    statements: &[S],
) -> Result<(String, Option<String>)> {
    let role_id = ids.allocate(&format!("{}/Role", path))?;
    template.resources.insert(
        role_id.clone(),
        Resource::new(
            IAM_ROLE,
            json!({ "AssumeRolePolicyDocument": service_trust_policy(principal) }),
        ),
    );

    if statements.is_empty() {
        return Ok((role_id, None));
    }

    let policy_id = ids.allocate(&format!("{}/Role/DefaultPolicy", path))?;
    template.resources.insert(
        policy_id.clone(),
        Resource::new(
            IAM_POLICY,
            json!({
                "PolicyName": policy_id,
                "PolicyDocument": policy_document(statements),
                "Roles": [reference(&role_id)],
            }),
        ),
    );
    Ok((role_id, Some(policy_id)))
}

fn project_properties(project: &Project, role_id: &str) -> Result<Value> {
    let variables: Vec<Value> = project
        .environment_variables
        .iter()
        .map(|(name, var)| {
            json!({
                "Name": name,
                "Type": var.kind,
                "Value": var.value,
            })
        })
        .collect();

    let cache = match &project.cache {
        Cache::None => json!({ "Type": "NO_CACHE" }),
        Cache::Local(modes) => json!({
            "Type": "LOCAL",
            "Modes": modes.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
        }),
    };

    Ok(json!({
        "Name": project.project_name,
        "Source": {
            "Type": "CODEPIPELINE",
            "BuildSpec": project.build_spec.to_json_string()?,
        },
        "Artifacts": { "Type": "CODEPIPELINE" },
        "Environment": {
            "Type": "LINUX_CONTAINER",
            "Image": project.environment.build_image,
            "ComputeType": project.environment.compute_type,
            "PrivilegedMode": project.environment.privileged,
            "EnvironmentVariables": variables,
        },
        "Cache": cache,
        "ServiceRole": get_att_arn(role_id),
    }))
}

fn action_properties(action: &Action, project_ids: &HashMap<&str, String>) -> Result<Value> {
    let (category, provider, configuration) = match action {
        Action::Source(source) => (
            "Source",
            "CodeStarSourceConnection",
            json!({
                "ConnectionArn": source.connection_arn,
                "FullRepositoryId": source.repository,
                "BranchName": source.branch,
            }),
        ),
        Action::CodeBuild(build) => {
            let project_id = project_ids
                .get(build.project_name.as_str())
                .ok_or_else(|| {
                    CloudError::InvalidConfig(format!(
                        "action '{}' runs project '{}', which is not part of the stack",
                        build.action_name, build.project_name
                    ))
                })?;
            ("Build", "CodeBuild", json!({ "ProjectName": reference(project_id) }))
        }
    };

    let artifacts = |list: Vec<&Artifact>| -> Vec<Value> {
        list.into_iter().map(|a| json!({ "Name": a.name })).collect()
    };

    Ok(json!({
        "Name": action.name(),
        "ActionTypeId": {
            "Category": category,
            "Owner": "AWS",
            "Provider": provider,
            "Version": "1",
        },
        "Configuration": configuration,
        "InputArtifacts": artifacts(action.inputs()),
        "OutputArtifacts": artifacts(action.outputs()),
        "RunOrder": action.run_order(),
    }))
}

/// Permissions the pipeline role needs to drive its own actions
///
/// The artifact bucket is named by the provider, so its statement refers to
/// the bucket through `Fn::GetAtt` instead of a literal ARN.
fn pipeline_statements(
    stack: &Stack,
    pipeline: &Pipeline,
    bucket_id: &str,
) -> Result<Vec<Value>> {
    let mut statements = vec![json!({
        "Effect": "Allow",
        "Action": [
            "s3:GetObject*",
            "s3:GetBucket*",
            "s3:List*",
            "s3:PutObject",
            "s3:DeleteObject*",
        ],
        "Resource": [
            get_att_arn(bucket_id),
            { "Fn::Join": ["", [get_att_arn(bucket_id), "/*"]] },
        ],
    })];

    let projects: Vec<String> = pipeline
        .actions()
        .filter_map(|a| match a {
            Action::CodeBuild(build) => {
                Some(stack.format_arn("codebuild", &format!("project/{}", build.project_name)))
            }
            Action::Source(_) => None,
        })
        .collect();
    if !projects.is_empty() {
        statements.push(serde_json::to_value(PolicyStatement::allow(
            ["codebuild:BatchGetBuilds", "codebuild:StartBuild", "codebuild:StopBuild"],
            projects,
        ))?);
    }

    let connections: Vec<String> = pipeline
        .actions()
        .filter_map(|a| match a {
            Action::Source(source) => Some(source.connection_arn.clone()),
            Action::CodeBuild(_) => None,
        })
        .collect();
    if !connections.is_empty() {
        statements.push(serde_json::to_value(PolicyStatement::allow(
            ["codestar-connections:UseConnection"],
            connections,
        ))?);
    }

    Ok(statements)
}

/// Synthesize the stack's projects and the pipeline into one template
#[instrument(skip_all, fields(stack = %stack.name, pipeline = %pipeline.name))]
pub fn synthesize(stack: &Stack, pipeline: &Pipeline) -> Result<Template> {
    pipeline.validate()?;

    let mut template = Template::new(format!("CI/CD pipeline {} ({})", pipeline.name, stack.name));
    let mut ids = LogicalIds::default();
    let mut project_ids: HashMap<&str, String> = HashMap::new();

    for project in &stack.projects {
        let (role_id, policy_id) = add_role(
            &mut template,
            &mut ids,
            &project.construct_path,
            "codebuild.amazonaws.com",
            &project.role_policy,
        )?;

        let project_id = ids.allocate(&project.construct_path)?;
        let mut resource = Resource::new(CODEBUILD_PROJECT, project_properties(project, &role_id)?);
        if let Some(policy_id) = policy_id {
            resource = resource.depends_on(policy_id);
        }
        template.resources.insert(project_id.clone(), resource);
        debug!(project = %project.project_name, logical_id = %project_id, "Synthesized project");
        project_ids.insert(project.project_name.as_str(), project_id);
    }

    let bucket_id = ids.allocate("Pipeline/ArtifactsBucket")?;
    template
        .resources
        .insert(bucket_id.clone(), Resource::new(S3_BUCKET, json!({})));

    let statements = pipeline_statements(stack, pipeline, &bucket_id)?;
    let (role_id, policy_id) = add_role(
        &mut template,
        &mut ids,
        "Pipeline",
        "codepipeline.amazonaws.com",
        &statements,
    )?;

    let mut stages = Vec::with_capacity(pipeline.stages.len());
    for stage in &pipeline.stages {
        let actions = stage
            .actions
            .iter()
            .map(|a| action_properties(a, &project_ids))
            .collect::<Result<Vec<_>>>()?;
        stages.push(json!({ "Name": stage.name, "Actions": actions }));
    }

    let pipeline_id = ids.allocate("Pipeline")?;
    let mut resource = Resource::new(
        CODEPIPELINE_PIPELINE,
        json!({
            "Name": pipeline.name,
            "RoleArn": get_att_arn(&role_id),
            "ArtifactStore": { "Type": "S3", "Location": reference(&bucket_id) },
            "Stages": stages,
        }),
    );
    if let Some(policy_id) = policy_id {
        resource = resource.depends_on(policy_id);
    }
    template.resources.insert(pipeline_id, resource);

    info!(resources = template.resources.len(), "Template synthesized");
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebuild::{BuildEnvironment, BuildSpec, LocalCacheMode, Phase};
    use crate::pipeline::{CodeBuildAction, IStage, SourceAction, Stage};

    fn fixture() -> (Stack, Pipeline) {
        let mut stack = Stack::new("acme-dev-ci", "123456789012", "eu-west-1");
        let mut project = Project::new(
            "api/DeployProject",
            "acme-deploy-api",
            BuildSpec::new().phase(Phase::Build, ["make deploy-api"]),
        )
        .with_environment(BuildEnvironment::privileged())
        .with_cache(Cache::local([LocalCacheMode::Custom]));
        project.add_to_role_policy(PolicyStatement::allow(["s3:*"], ["*"]));
        stack.add_project(project.clone()).unwrap();

        let mut pipeline = Pipeline::new("acme-dev");
        let mut source = Stage::new("Source");
        source
            .add_action(
                SourceAction {
                    action_name: "checkout".to_string(),
                    connection_arn: "arn:aws:codestar-connections:eu-west-1:1:connection/c"
                        .to_string(),
                    repository: "acme/app".to_string(),
                    branch: "main".to_string(),
                    output: Artifact::artifact("src"),
                }
                .into(),
            )
            .unwrap();
        let mut deploy = Stage::new("Deploy");
        deploy
            .add_action(
                CodeBuildAction::new("acme-deploy-api", &project, Artifact::artifact("src"))
                    .into(),
            )
            .unwrap();
        pipeline.add_stage(source).unwrap();
        pipeline.add_stage(deploy).unwrap();
        (stack, pipeline)
    }

    #[test]
    fn test_logical_id() {
        assert_eq!(logical_id("api/BuildProject"), "ApiBuildProject");
        assert_eq!(logical_id("my-svc/DeployProject/Role"), "MySvcDeployProjectRole");
        assert_eq!(logical_id("--"), "");
    }

    #[test]
    fn test_logical_id_collision() {
        let mut ids = LogicalIds::default();
        ids.allocate("my-svc/Build").unwrap();
        ids.allocate("my-svc/Build").unwrap();
        let err = ids.allocate("my_svc/Build").unwrap_err();
        assert!(matches!(err, CloudError::DuplicateConstruct { .. }));
    }

    #[test]
    fn test_synthesize_resources() {
        let (stack, pipeline) = fixture();
        let template = synthesize(&stack, &pipeline).unwrap();

        let project = template.resource("ApiDeployProject").unwrap();
        assert_eq!(project.resource_type, CODEBUILD_PROJECT);
        assert_eq!(project.properties["Name"], "acme-deploy-api");
        assert_eq!(project.properties["Environment"]["PrivilegedMode"], true);
        assert_eq!(project.properties["Cache"]["Modes"][0], "LOCAL_CUSTOM_CACHE");
        assert_eq!(project.depends_on, vec!["ApiDeployProjectRoleDefaultPolicy"]);

        let policy = template.resource("ApiDeployProjectRoleDefaultPolicy").unwrap();
        assert_eq!(
            policy.properties["PolicyDocument"]["Statement"][0]["Action"][0],
            "s3:*"
        );

        let pipeline = template.resource("Pipeline").unwrap();
        let stages = pipeline.properties["Stages"].as_array().unwrap();
        assert_eq!(stages.len(), 2);
        let action = &stages[1]["Actions"][0];
        assert_eq!(action["Configuration"]["ProjectName"]["Ref"], "ApiDeployProject");
        assert_eq!(action["InputArtifacts"][0]["Name"], "src");
        assert_eq!(template.resources_of_type(IAM_ROLE).count(), 2);
    }

    #[test]
    fn test_artifact_bucket_is_provider_named() {
        let (stack, pipeline) = fixture();
        let template = synthesize(&stack, &pipeline).unwrap();

        let bucket = template.resource("PipelineArtifactsBucket").unwrap();
        assert_eq!(bucket.resource_type, S3_BUCKET);
        assert!(bucket.properties.get("BucketName").is_none());

        let policy = template.resource("PipelineRoleDefaultPolicy").unwrap();
        let s3 = &policy.properties["PolicyDocument"]["Statement"][0];
        assert_eq!(s3["Resource"][0]["Fn::GetAtt"][0], "PipelineArtifactsBucket");
        assert_eq!(
            s3["Resource"][1]["Fn::Join"][1][0]["Fn::GetAtt"][0],
            "PipelineArtifactsBucket"
        );
        assert_eq!(s3["Resource"][1]["Fn::Join"][1][1], "/*");
    }

    #[test]
    fn test_synthesize_is_deterministic() {
        let (stack, pipeline) = fixture();
        let first = synthesize(&stack, &pipeline).unwrap().to_json_pretty().unwrap();
        let second = synthesize(&stack, &pipeline).unwrap().to_json_pretty().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_project_rejected() {
        let (mut stack, pipeline) = fixture();
        stack.projects.clear();
        let err = synthesize(&stack, &pipeline).unwrap_err();
        assert!(matches!(err, CloudError::InvalidConfig(_)));
    }
}
