use crate::Job;
use ciflow_core::{CiProject, ProjectError};

pub fn handle(project: &CiProject, service: &str, job: Job) -> anyhow::Result<()> {
    if project.service(service).is_none() {
        return Err(ProjectError::ServiceNotFound(service.to_string()).into());
    }

    let app = ciflow_serverless::assemble(project)?;
    let config = app
        .service(service)
        .ok_or_else(|| ProjectError::ServiceNotFound(service.to_string()))?;

    let job_project = match job {
        Job::Build => &config.build_project,
        Job::Deploy => &config.deploy_project,
    };
    print!("{}", job_project.build_spec.to_yaml()?);
    Ok(())
}
