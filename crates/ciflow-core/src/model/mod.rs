//! Project model
//!
//! Data models read from `ciflow.kdl`, one module per concern.

mod pipeline;
mod policy;
mod project;
mod service;
mod settings;

// Re-exports
pub use pipeline::*;
pub use policy::*;
pub use project::*;
pub use service::*;
pub use settings::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_env_name() {
        let settings = EnvSettings::new("acme", "prod");
        assert_eq!(settings.project_env_name(), "acme-prod");
        assert_eq!(settings.region, DEFAULT_REGION);
        assert!(settings.account.is_empty());
    }

    #[test]
    fn test_default_grants_cover_six_patterns() {
        let grants = DeployGrants::default();
        assert_eq!(
            grants.action_patterns(),
            vec![
                "iam:*",
                "cloudfront:*",
                "s3:*",
                "lambda:*",
                "apigateway:*",
                "cloudformation:ValidateTemplate",
            ]
        );
        assert!(DeployGrants::empty().is_empty());
    }

    #[test]
    fn test_project_defaults() {
        let mut project = CiProject::new(EnvSettings::new("acme", DEFAULT_ENV_STAGE));
        project.services.push(ServiceDefinition::serverless("api"));

        assert_eq!(project.pipeline.build_stage, "Build");
        assert_eq!(project.source.branch, "main");
        assert_eq!(project.service("api").unwrap().kind, ServiceKind::Serverless);
        assert!(project.service("web").is_none());
    }

    #[test]
    fn test_service_kind_from_str() {
        assert_eq!("serverless".parse::<ServiceKind>(), Ok(ServiceKind::Serverless));
        assert!("container".parse::<ServiceKind>().is_err());
    }

    #[test]
    fn test_project_serialization() {
        let project = CiProject::new(EnvSettings::new("acme", "dev").with_account("123"));

        let json = serde_json::to_string(&project).unwrap();
        assert!(json.contains("\"project_name\":\"acme\""));

        let deserialized: CiProject = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, project);
    }
}
