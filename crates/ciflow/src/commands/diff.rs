use ciflow_cloud::{ChangeType, TemplateStore};
use ciflow_core::CiProject;
use colored::Colorize;
use std::path::Path;

pub async fn handle(project: &CiProject, project_root: &Path) -> anyhow::Result<()> {
    let app = ciflow_serverless::assemble(project)?;
    let template = app.synthesize()?;

    let store = TemplateStore::new(project_root, &app.stack.name);
    let previous = store.load().await?;
    if previous.is_none() {
        println!(
            "{}",
            "No previous template; every resource will be created.".yellow()
        );
    }

    let changes = ciflow_cloud::diff(previous.as_ref().map(|p| &p.template), &template);
    println!("Stack: {}", app.stack.name.cyan());
    println!();

    for change in &changes.changes {
        let marker = match change.change_type {
            ChangeType::Create => "+".green().bold(),
            ChangeType::Update => "~".yellow().bold(),
            ChangeType::Delete => "-".red().bold(),
            ChangeType::NoOp => continue,
        };
        print!(
            "  {} {} ({})",
            marker,
            change.logical_id,
            change.resource_type.dimmed()
        );
        if !change.changed_properties.is_empty() {
            print!(" [{}]", change.changed_properties.join(", "));
        }
        println!();
    }

    if !changes.has_changes {
        println!("{}", "✓ No changes".green().bold());
    }
    println!();
    println!("{}", changes.summary());
    Ok(())
}
