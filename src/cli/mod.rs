use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::database::{DatabaseManager, MemoryStore, PgStore};
use crate::router;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "marketplace-api")]
#[command(about = "Marketplace listing service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Bind host, overrides SERVER_HOST")]
        host: Option<String>,

        #[arg(long, help = "Bind port, overrides SERVER_PORT")]
        port: Option<u16>,
    },

    #[command(about = "Create tables in the configured Postgres database")]
    InitDb,
}

pub async fn run(cli: Cli, mut config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Command::InitDb => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::init_schema(&pool).await?;
            info!("Schema initialized");
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting marketplace-api in {:?} mode", config.environment);

    let bind_addr = config.bind_addr();
    let state = if config.database.url.is_some() {
        let pool = DatabaseManager::connect(&config.database).await?;
        AppState::new(config, Arc::new(PgStore::new(pool)))?
    } else {
        warn!("DATABASE_URL not set, using the in-memory store; data is lost on exit");
        AppState::new(config, Arc::new(MemoryStore::new()))?
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["marketplace-api"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn serve_flags() {
        let cli = Cli::try_parse_from(["marketplace-api", "serve", "--port", "9001"]).unwrap();
        match cli.command {
            Some(Command::Serve { host, port }) => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9001));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn init_db_subcommand() {
        let cli = Cli::try_parse_from(["marketplace-api", "init-db"]).unwrap();
        assert!(matches!(cli.command, Some(Command::InitDb)));
    }
}
