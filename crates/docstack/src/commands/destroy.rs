use crate::context::AppContext;
use colored::Colorize;
use docstack_engine::{
    CleanupReport, DESTROY_POLL_BUDGET, DESTROY_POLL_INTERVAL, EngineError,
};

pub async fn handle(
    ctx: &AppContext,
    provider: Option<&str>,
    resource_group: &str,
    yes: bool,
    wait: bool,
) -> anyhow::Result<()> {
    let provider = provider
        .unwrap_or(&ctx.config.preferred.cloud)
        .to_string();

    if !yes {
        println!(
            "{}",
            format!(
                "Warning: this destroys every resource in '{resource_group}' and removes \
                 the dependent pipeline records."
            )
            .yellow()
        );
        println!("A provenance backup is taken first. Re-run with --yes to proceed.");
        return Ok(());
    }

    let user = std::env::var("USER").ok();
    println!(
        "{}",
        format!("Destroying {resource_group} on {provider}...").blue().bold()
    );

    let report = match ctx
        .teardown
        .destroy(&provider, resource_group, user.as_deref())
        .await
    {
        Ok(report) => report,
        Err(e) => {
            if matches!(e, EngineError::Backup(_)) {
                eprintln!("{}", "Aborting destruction for safety.".red());
            }
            anyhow::bail!("[{}] {}", e.code(), e);
        }
    };

    println!("{}", report.message.green());
    println!(
        "Backup: {} ({})",
        report.backup_file.display().to_string().cyan(),
        report.backup_size
    );
    match &report.database_cleanup {
        CleanupReport::Cleaned(counts) => {
            println!(
                "Cleaned up {} chunks, {} index entries, {} jobs; {} documents reset to pending",
                counts.chunks_deleted,
                counts.index_entries_deleted,
                counts.processing_jobs_deleted,
                counts.documents_reset
            );
        }
        CleanupReport::Failed { error } => {
            println!(
                "{}",
                format!("Warning: database cleanup failed: {error}").yellow()
            );
        }
    }

    if wait {
        println!("Waiting for deletion to complete...");
        let gone = ctx
            .teardown
            .wait_for_group_gone(
                &provider,
                resource_group,
                DESTROY_POLL_INTERVAL,
                DESTROY_POLL_BUDGET,
            )
            .await
            .map_err(|e| anyhow::anyhow!("[{}] {}", e.code(), e))?;

        if gone {
            println!("{}", "Resource group deleted.".green());
        } else {
            println!(
                "{}",
                "Deletion still in progress; check again later with `docstack resources`."
                    .yellow()
            );
        }
    }

    Ok(())
}
