use clap::Parser;
use tracing_subscriber::EnvFilter;

use marketplace_api::cli::{self, Cli};
use marketplace_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and JWT_SECRET can live there
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    cli::run(cli, config).await
}
