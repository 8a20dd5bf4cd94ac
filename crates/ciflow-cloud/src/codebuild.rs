//! CodeBuild project and buildspec descriptors

use crate::error::Result;
use crate::iam::PolicyStatement;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Buildspec schema version understood by CodeBuild
pub const BUILDSPEC_VERSION: &str = "0.2";

/// Default managed build image
pub const DEFAULT_BUILD_IMAGE: &str = "aws/codebuild/standard:7.0";

/// Default compute type
pub const DEFAULT_COMPUTE_TYPE: &str = "BUILD_GENERAL1_SMALL";

/// Buildspec phase, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Install,
    PreBuild,
    Build,
    PostBuild,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Install => write!(f, "install"),
            Phase::PreBuild => write!(f, "pre_build"),
            Phase::Build => write!(f, "build"),
            Phase::PostBuild => write!(f, "post_build"),
        }
    }
}

/// Commands run in one phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCommands {
    pub commands: Vec<String>,
}

/// Files exported as the job's output artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFiles {
    pub files: Vec<String>,
}

/// Paths kept in the job's custom local cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePaths {
    pub paths: Vec<String>,
}

/// Inline buildspec
///
/// Serializes to the CodeBuild buildspec document shape, so the same value
/// can be embedded in a template (as JSON) or written out as `buildspec.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSpec {
    pub version: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub phases: BTreeMap<Phase, PhaseCommands>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<ArtifactFiles>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CachePaths>,
}

impl Default for BuildSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildSpec {
    pub fn new() -> Self {
        Self {
            version: BUILDSPEC_VERSION.to_string(),
            phases: BTreeMap::new(),
            artifacts: None,
            cache: None,
        }
    }

    /// Set the commands of a phase, replacing any previous ones
    pub fn phase<I, S>(mut self, phase: Phase, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phases.insert(
            phase,
            PhaseCommands {
                commands: commands.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    pub fn artifact_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artifacts = Some(ArtifactFiles {
            files: files.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn cache_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cache = Some(CachePaths {
            paths: paths.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Commands of a phase (empty if the phase is not declared)
    pub fn commands(&self, phase: Phase) -> &[String] {
        self.phases
            .get(&phase)
            .map(|p| p.commands.as_slice())
            .unwrap_or(&[])
    }

    /// All commands in execution order
    pub fn all_commands(&self) -> impl Iterator<Item = &String> {
        self.phases.values().flat_map(|p| p.commands.iter())
    }

    /// Render as the pretty JSON string CodeBuild accepts inline
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render as a `buildspec.yml` document
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Local cache modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LocalCacheMode {
    #[serde(rename = "LOCAL_SOURCE_CACHE")]
    Source,
    #[serde(rename = "LOCAL_DOCKER_LAYER_CACHE")]
    DockerLayer,
    #[serde(rename = "LOCAL_CUSTOM_CACHE")]
    Custom,
}

impl LocalCacheMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocalCacheMode::Source => "LOCAL_SOURCE_CACHE",
            LocalCacheMode::DockerLayer => "LOCAL_DOCKER_LAYER_CACHE",
            LocalCacheMode::Custom => "LOCAL_CUSTOM_CACHE",
        }
    }
}

/// Project cache selector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "modes", rename_all = "snake_case")]
pub enum Cache {
    #[default]
    None,
    Local(Vec<LocalCacheMode>),
}

impl Cache {
    /// Local cache with the given modes, in the order given
    pub fn local(modes: impl IntoIterator<Item = LocalCacheMode>) -> Self {
        Cache::Local(modes.into_iter().collect())
    }

    pub fn modes(&self) -> &[LocalCacheMode] {
        match self {
            Cache::None => &[],
            Cache::Local(modes) => modes,
        }
    }
}

/// How an environment variable's value is resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvironmentVariableType {
    #[default]
    Plaintext,
    ParameterStore,
    SecretsManager,
}

/// Environment variable exposed to a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub value: String,

    #[serde(rename = "type", default)]
    pub kind: EnvironmentVariableType,
}

impl EnvironmentVariable {
    pub fn plaintext(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: EnvironmentVariableType::Plaintext,
        }
    }
}

/// Build container settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEnvironment {
    /// Run the container privileged (needed for Docker-in-Docker builds)
    pub privileged: bool,

    pub build_image: String,

    pub compute_type: String,
}

impl Default for BuildEnvironment {
    fn default() -> Self {
        Self {
            privileged: false,
            build_image: DEFAULT_BUILD_IMAGE.to_string(),
            compute_type: DEFAULT_COMPUTE_TYPE.to_string(),
        }
    }
}

impl BuildEnvironment {
    pub fn privileged() -> Self {
        Self {
            privileged: true,
            ..Default::default()
        }
    }
}

/// CodeBuild project descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Path of the construct that created the project (e.g., "api/BuildProject")
    pub construct_path: String,

    /// Physical project name
    pub project_name: String,

    pub build_spec: BuildSpec,

    #[serde(default)]
    pub environment: BuildEnvironment,

    #[serde(default)]
    pub environment_variables: BTreeMap<String, EnvironmentVariable>,

    #[serde(default)]
    pub cache: Cache,

    /// Statements attached to the project's service role
    #[serde(default)]
    pub role_policy: Vec<PolicyStatement>,
}

impl Project {
    pub fn new(
        construct_path: impl Into<String>,
        project_name: impl Into<String>,
        build_spec: BuildSpec,
    ) -> Self {
        Self {
            construct_path: construct_path.into(),
            project_name: project_name.into(),
            build_spec,
            environment: BuildEnvironment::default(),
            environment_variables: BTreeMap::new(),
            cache: Cache::None,
            role_policy: Vec::new(),
        }
    }

    pub fn with_environment(mut self, environment: BuildEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_environment_variables(
        mut self,
        variables: BTreeMap<String, EnvironmentVariable>,
    ) -> Self {
        self.environment_variables = variables;
        self
    }

    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.cache = cache;
        self
    }

    pub fn add_to_role_policy(&mut self, statement: PolicyStatement) {
        self.role_policy.push(statement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_render_in_execution_order() {
        let spec = BuildSpec::new()
            .phase(Phase::Build, ["make build"])
            .phase(Phase::PreBuild, ["make install"]);

        let commands: Vec<_> = spec.all_commands().cloned().collect();
        assert_eq!(commands, vec!["make install", "make build"]);

        let json = spec.to_json_string().unwrap();
        let pre = json.find("pre_build").unwrap();
        let build = json.find("\"build\"").unwrap();
        assert!(pre < build);
        assert!(json.contains("\"version\": \"0.2\""));
        assert!(!json.contains("artifacts"));
    }

    #[test]
    fn test_buildspec_yaml() {
        let spec = BuildSpec::new()
            .phase(Phase::Build, ["make build-api"])
            .artifact_files(["*", "infra/**/*"]);

        let yaml = spec.to_yaml().unwrap();
        assert!(yaml.starts_with("version:"));
        assert!(yaml.contains("0.2"));
        assert!(yaml.contains("- make build-api"));
        assert!(yaml.contains("- infra/**/*"));
    }

    #[test]
    fn test_missing_phase_has_no_commands() {
        let spec = BuildSpec::new();
        assert!(spec.commands(Phase::Install).is_empty());
    }

    #[test]
    fn test_cache_modes() {
        let cache = Cache::local([LocalCacheMode::Custom, LocalCacheMode::DockerLayer]);
        assert_eq!(
            cache.modes(),
            &[LocalCacheMode::Custom, LocalCacheMode::DockerLayer]
        );
        assert!(Cache::None.modes().is_empty());
        assert_eq!(LocalCacheMode::Custom.as_str(), "LOCAL_CUSTOM_CACHE");
    }

    #[test]
    fn test_environment_variable_serialization() {
        let var = EnvironmentVariable::plaintext("dev");
        let json = serde_json::to_value(&var).unwrap();
        assert_eq!(json["type"], "PLAINTEXT");
        assert_eq!(json["value"], "dev");
    }
}
