use ciflow_core::CiProject;
use colored::Colorize;

pub fn handle(project: &CiProject) -> anyhow::Result<()> {
    let app = ciflow_serverless::assemble(project)?;

    println!(
        "{} ({})",
        app.pipeline.name.cyan().bold(),
        project.settings.region
    );
    for service in &app.services {
        println!("  {}", service.service.bold());
        println!(
            "    build:  {} → {}",
            service.build_action.action_name.cyan(),
            service.build_artifact
        );
        println!("    deploy: {}", service.deploy_action.action_name.cyan());
    }
    Ok(())
}
