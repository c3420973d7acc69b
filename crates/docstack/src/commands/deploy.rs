use crate::context::AppContext;
use colored::Colorize;
use docstack_cloud::ProvisionedResource;
use docstack_engine::{DeployOptions, SubmitOutcome};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub async fn handle(
    ctx: &AppContext,
    provider: Option<&str>,
    options: DeployOptions,
) -> anyhow::Result<()> {
    let provider = provider
        .unwrap_or(&ctx.config.preferred.cloud)
        .to_string();

    println!("{}", "Starting deployment...".blue().bold());
    println!("Provider: {}", provider.cyan());

    let outcome = ctx
        .runner
        .submit(&provider, options)
        .await
        .map_err(|e| anyhow::anyhow!("[{}] {}", e.code(), e))?;

    match outcome {
        SubmitOutcome::Completed(result) => {
            println!();
            println!("{}", result.message.green().bold());
            print_resources(&result.resources);
        }
        SubmitOutcome::Accepted { deployment_id, .. } => {
            println!("Deployment started: {}", deployment_id.cyan());
            poll_until_done(ctx, &deployment_id).await?;
        }
    }

    Ok(())
}

async fn poll_until_done(ctx: &AppContext, deployment_id: &str) -> anyhow::Result<()> {
    let mut last_status = String::new();
    let mut ever_seen = false;

    loop {
        match ctx.runner.poll_status(deployment_id).await {
            Some(job) => {
                ever_seen = true;
                if job.status != last_status {
                    println!("  {} {}", "→".blue(), job.message);
                    last_status = job.status.clone();
                }
                if job.is_terminal() {
                    println!();
                    if job.status == docstack_engine::STATUS_COMPLETED {
                        println!("{}", "Deployment complete".green().bold());
                        if let Some(resources) = &job.data {
                            print_resources(resources);
                        }
                    } else {
                        anyhow::bail!("{}", job.message);
                    }
                    return Ok(());
                }
            }
            None => {
                // Expired or never existed; the protocol cannot tell these
                // apart
                if ever_seen {
                    println!(
                        "{}",
                        "Progress record expired; deployment probably finished but is unconfirmed."
                            .yellow()
                    );
                    return Ok(());
                }
                anyhow::bail!("Deployment not found");
            }
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn print_resources(resources: &[ProvisionedResource]) {
    println!("Resources ({}):", resources.len());
    for resource in resources {
        let marker = if resource.existing { "(existing)" } else { "" };
        match &resource.endpoint {
            Some(endpoint) => println!(
                "  • {}: {} {} {}",
                resource.kind,
                resource.name.cyan(),
                endpoint,
                marker.dimmed()
            ),
            None => println!(
                "  • {}: {} {}",
                resource.kind,
                resource.name.cyan(),
                marker.dimmed()
            ),
        }
    }
}
