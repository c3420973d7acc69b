mod commands;
mod context;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "docstack")]
#[command(version)]
#[command(
    about = "Provision and tear down the cloud infrastructure behind the document pipeline",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the document-processing infrastructure
    Deploy {
        /// Cloud provider (defaults to the configured preferred provider)
        #[arg(short, long)]
        provider: Option<String>,
        /// Resource group name
        #[arg(long)]
        resource_group: Option<String>,
        /// Target region
        #[arg(long)]
        location: Option<String>,
        /// Storage account name
        #[arg(long)]
        storage_account: Option<String>,
        /// Form Recognizer service name
        #[arg(long)]
        form_recognizer_name: Option<String>,
        /// AI Search service name
        #[arg(long)]
        search_service: Option<String>,
    },
    /// Destroy a resource group and reconcile dependent records
    Destroy {
        /// Resource group to destroy
        resource_group: String,
        /// Cloud provider (defaults to the configured preferred provider)
        #[arg(short, long)]
        provider: Option<String>,
        /// Skip the confirmation step
        #[arg(short, long)]
        yes: bool,
        /// Poll inventory until the group is actually gone
        #[arg(short, long)]
        wait: bool,
    },
    /// List cloud resources, including nested ones
    Resources {
        /// Cloud provider (defaults to the configured preferred provider)
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Test provider connectivity and authentication
    Test {
        /// Cloud provider (defaults to the configured preferred provider)
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Show per-provider configuration status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let ctx = context::AppContext::build()?;

    match cli.command {
        Commands::Deploy {
            provider,
            resource_group,
            location,
            storage_account,
            form_recognizer_name,
            search_service,
        } => {
            let options = docstack_engine::DeployOptions {
                resource_group,
                location,
                storage_account,
                form_recognizer_name,
                search_service,
            };
            commands::deploy::handle(&ctx, provider.as_deref(), options).await
        }
        Commands::Destroy {
            resource_group,
            provider,
            yes,
            wait,
        } => commands::destroy::handle(&ctx, provider.as_deref(), &resource_group, yes, wait).await,
        Commands::Resources { provider } => {
            commands::resources::handle(&ctx, provider.as_deref()).await
        }
        Commands::Test { provider } => commands::test::handle(&ctx, provider.as_deref()).await,
        Commands::Status => commands::status::handle(&ctx),
    }
}
