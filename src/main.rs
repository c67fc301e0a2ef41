use anyhow::Result;
use i18n_bootstrap::{bootstrap, config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("i18n_bootstrap=info".parse()?)
        )
        .init();

    info!("Starting i18n bootstrap");

    // Load configuration from environment
    let config = config::Config::from_env()?;

    bootstrap::run(config).await?;

    info!("Server stopped");
    Ok(())
}
