//! Binary crate for the `weather-station` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Running the forecast service with a terminal display refresh

use clap::Parser;

mod cli;
mod display;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_station=info,station_core=info".into()),
        )
        .with_target(true)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
