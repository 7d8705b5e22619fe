//! Campus Helper CLI entry point.

use anyhow::Result;
use campus_helper::cli::{commands, Cli, Commands};
use campus_helper::config::Settings;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let mut settings = Settings::read_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = settings.general.log_level_for(cli.verbose).to_string();

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("campus_helper={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    settings.normalize();

    // Execute command
    match &cli.command {
        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, config_path.as_deref())?;
        }

        Commands::Bot => {
            commands::run_bot(settings).await?;
        }

        Commands::Serve {
            host,
            port,
            no_watch,
        } => {
            settings.ensure_dirs()?;
            commands::run_serve(host.as_deref(), *port, *no_watch, settings).await?;
        }

        Commands::Reindex => {
            settings.ensure_dirs()?;
            commands::run_reindex(settings).await?;
        }

        Commands::Search { query, limit } => {
            settings.ensure_dirs()?;
            commands::run_search(query, *limit, settings).await?;
        }

        Commands::Ask { question } => {
            settings.ensure_dirs()?;
            commands::run_ask(question, settings).await?;
        }
    }

    Ok(())
}
