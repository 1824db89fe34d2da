use anyhow::Context;
use tracing_subscriber::EnvFilter;

use bulkmail::{AppConfig, BulkMailServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments set the environment.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let server = BulkMailServer::new(config).context("building SMTP transport")?;

    match server.check_transport().await {
        Ok(()) => tracing::info!("SMTP relay reachable"),
        Err(e) => tracing::warn!(error = %e, "SMTP relay check failed; sends may fail"),
    }

    server.serve().await.context("server stopped")?;
    Ok(())
}
