use crate::context::AppContext;
use colored::Colorize;

pub async fn handle(ctx: &AppContext, provider: Option<&str>) -> anyhow::Result<()> {
    let adapter = ctx.registry.cloud(provider)?;

    println!(
        "{}",
        format!("Querying {} resources...", adapter.display_name()).blue()
    );
    let inventory = adapter.get_resources().await;

    if !inventory.success {
        anyhow::bail!(
            "[RESOURCES_ERROR] {}",
            inventory.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }

    if inventory.resource_groups.is_empty() {
        println!("No resource groups found.");
        return Ok(());
    }

    for group in &inventory.resource_groups {
        println!();
        println!(
            "{} ({}, {} resources)",
            group.name.cyan().bold(),
            group.location,
            group.resource_count
        );
        for resource in &group.resources {
            let location = resource.location.as_deref().unwrap_or("-");
            println!("  • {} [{}] {}", resource.name, resource.resource_type, location);
        }
        for warning in &group.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    Ok(())
}
