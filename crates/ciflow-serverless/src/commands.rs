//! Make targets and path patterns used by serverless jobs
//!
//! The actual build and deploy logic lives in the repository's Makefiles;
//! jobs only invoke these targets.

/// Installs the shared Serverless Framework tooling
pub const INSTALL_SERVERLESS: &str = "make install-serverless";

/// `make build-{service}`
pub fn build_target(service: &str) -> String {
    format!("make build-{}", service)
}

/// `make -C services/{service} install`
pub fn service_install(service: &str) -> String {
    format!("make -C {} install", service_dir(service))
}

/// `make deploy-{service}`
pub fn deploy_target(service: &str) -> String {
    format!("make deploy-{}", service)
}

/// `services/{service}`
pub fn service_dir(service: &str) -> String {
    format!("services/{}", service)
}

/// Files the build job hands to the deploy job
pub fn build_artifact_files(service: &str) -> Vec<String> {
    vec![
        "*".to_string(),
        "infra/**/*".to_string(),
        "scripts/**/*".to_string(),
        format!("{}/**/*", service_dir(service)),
    ]
}

/// Dependency directories the deploy job keeps between runs
pub fn deploy_cache_paths(service: &str) -> Vec<String> {
    vec![
        "infra/cdk/node_modules/**/*".to_string(),
        format!("{}/node_modules/**/*", service_dir(service)),
    ]
}
