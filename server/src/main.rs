//! Ticketgate HTTP server.
//!
//! Rate-limited order and waitlist intake in front of the ticketing backend.

use ticketgate_server::{config::Config, metrics};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(&config.server.log_level)
                .unwrap_or_else(|_| EnvFilter::new("info,ticketgate=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ticketgate HTTP server");

    let prometheus = metrics::install_recorder()?;

    ticketgate_server::run(config, Some(prometheus)).await
}
