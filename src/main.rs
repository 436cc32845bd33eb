use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pagemeta::app::AppContext;
use pagemeta::cli::commands::{self, WorkerOverrides};
use pagemeta::cli::{Cli, Commands};
use pagemeta::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pagemeta=info")))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(db) = cli.db {
        config.database.path = Some(db);
    }

    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Submit { owner, file, urls } => {
            commands::submit(&ctx, &owner, file.as_deref(), &urls)?;
        }
        Commands::List {
            owner,
            status,
            json,
        } => {
            commands::list_tasks(&ctx, &owner, status, json)?;
        }
        Commands::Show { id } => {
            commands::show_task(&ctx, id)?;
        }
        Commands::Stats { owner } => {
            commands::show_stats(&ctx, &owner)?;
        }
        Commands::Clear { owner, status } => {
            commands::clear_tasks(&ctx, &owner, status)?;
        }
        Commands::Worker {
            once,
            batch_size,
            interval,
            concurrency,
            claim,
            fixed_rate,
        } => {
            let overrides = WorkerOverrides {
                batch_size,
                interval,
                concurrency,
                claim,
                fixed_rate,
            };
            commands::run_worker(&ctx, once, overrides).await?;
        }
    }

    Ok(())
}
