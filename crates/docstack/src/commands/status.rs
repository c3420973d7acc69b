use crate::context::AppContext;
use colored::Colorize;
use docstack_engine::provider_status;

pub fn handle(ctx: &AppContext) -> anyhow::Result<()> {
    println!("{}", "Provider status".bold());

    for (name, status) in provider_status(&ctx.config) {
        let state = if status.configured {
            "configured".green()
        } else {
            "not configured".yellow()
        };
        print!("  {} {}", name.cyan(), state);
        if let Some(subscription) = &status.subscription_id {
            print!(" (subscription {subscription})");
        }
        if let Some(message) = &status.message {
            print!(" ({message})");
        }
        println!();
    }

    println!();
    println!(
        "Preferred cloud provider: {}",
        ctx.config.preferred.cloud.cyan()
    );
    Ok(())
}
