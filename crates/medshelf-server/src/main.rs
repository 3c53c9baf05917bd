//! Server entry point.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use medshelf_server::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().context("Failed to load server configuration")?;
    medshelf_server::serve(config).await
}
