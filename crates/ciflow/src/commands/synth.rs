use ciflow_cloud::{StoredTemplate, TemplateStore};
use ciflow_core::CiProject;
use colored::Colorize;
use std::path::Path;

pub async fn handle(project: &CiProject, project_root: &Path, stdout: bool) -> anyhow::Result<()> {
    let app = ciflow_serverless::assemble(project)?;
    let template = app.synthesize()?;

    if stdout {
        println!("{}", template.to_json_pretty()?);
        return Ok(());
    }

    let store = TemplateStore::new(project_root, &app.stack.name);
    let path = store
        .save(&StoredTemplate::new(&app.stack.name, template.clone()))
        .await?;

    println!(
        "{} {} ({} services, {} resources)",
        "✓ Synthesized".green().bold(),
        app.stack.name.cyan(),
        app.services.len(),
        template.resources.len()
    );
    println!("  {}", path.display().to_string().dimmed());
    Ok(())
}
