//! Hand Cricket Server
//!
//! Authoritative matchmaking and round-resolution server for hand cricket.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hand_cricket::{Gateway, ServerConfig, BALLS_PER_INNINGS, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = ServerConfig::default();
    if let Ok(port) = std::env::var("PORT") {
        let port: u16 = port.parse().context("PORT must be a valid port number")?;
        config.bind_addr.set_port(port);
    }

    info!("Hand Cricket Server v{}", VERSION);
    info!("Balls per innings: {}", BALLS_PER_INNINGS);

    let gateway = Gateway::new(config);
    gateway.run().await.context("gateway terminated")?;

    Ok(())
}
