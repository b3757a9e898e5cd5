mod cli;

use checkin_client::{config::Config, telemetry};
use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load()?;
    if let Some(base_url) = &cli.base_url {
        config.backend.base_url = base_url.clone();
    }
    tracing::debug!("Loaded configuration: {:?}", config);

    cli::run(cli, config).await
}
