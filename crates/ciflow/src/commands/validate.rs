use colored::Colorize;

pub fn handle(stage: Option<&str>) -> anyhow::Result<()> {
    println!("{}", "Validating project...".blue());

    let project_root = match ciflow_core::find_project_root() {
        Ok(root) => root,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ Project root not found".red().bold());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };
    println!(
        "Project root: {}",
        project_root.display().to_string().cyan()
    );

    let result = ciflow_core::load_project_from_root_with_stage(&project_root, stage)
        .map_err(anyhow::Error::from)
        .and_then(|project| {
            let app = ciflow_serverless::assemble(&project)?;
            // synthesis also checks logical IDs, which wiring validation cannot see
            app.synthesize()?;
            Ok((project, app))
        });

    let (project, app) = match result {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ Configuration error".red().bold());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", "✓ Configuration is valid!".green().bold());
    println!();
    println!("Summary:");
    println!(
        "  Project: {} (stage {})",
        project.settings.project_name.cyan(),
        project.settings.env_stage.cyan()
    );
    let account = if project.settings.account.is_empty() {
        "(not set)"
    } else {
        project.settings.account.as_str()
    };
    println!("  Account: {} / {}", account, project.settings.region);
    println!("  Services: {}", app.services.len());
    for service in &app.services {
        println!("    - {}", service.service.cyan());
    }
    println!("  Stages: {}", app.pipeline.stages.len());
    for stage in &app.pipeline.stages {
        println!("    - {} ({} actions)", stage.name.cyan(), stage.actions.len());
    }
    Ok(())
}
