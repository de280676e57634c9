mod report;
mod seed;
mod urls;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use aeomon_core::load_app_config;
use aeomon_db::{connect_pool, run_migrations, PoolConfig};

#[derive(Debug, Parser)]
#[command(name = "aeomon-cli")]
#[command(about = "aeomon command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Upsert brands, competitors, and tracked prompts from a YAML seed file
    Seed {
        /// Path to the seed file (defaults to AEOMON_SEED_PATH)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Daily report operations
    Report {
        #[command(subcommand)]
        command: report::ReportCommands,
    },
    /// Citation URL inventory maintenance
    Urls {
        #[command(subcommand)]
        command: urls::UrlsCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = load_app_config()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let pool = connect_pool(&config.database_url, PoolConfig::from_app_config(&config)).await?;
    run_migrations(&pool).await?;

    match cli.command {
        Commands::Seed { file } => {
            let path = file.unwrap_or_else(|| config.seed_path.clone());
            seed::run_seed(&pool, &path).await
        }
        Commands::Report { command } => report::run(&pool, &config, command).await,
        Commands::Urls { command } => urls::run(&pool, &config, command).await,
    }
}
