use anyhow::{bail, Context, Result};
use i18n_bootstrap::config;
use i18n_bootstrap::i18n::{I18nOptions, TranslationValidator};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("check_translations=info".parse()?)
        )
        .init();

    let config = config::Config::from_env()?;
    let root = &config.translations_dir;
    info!("Checking translations in {}", root.display());

    let report = TranslationValidator::validate(root, &I18nOptions::default())
        .await
        .with_context(|| format!("Failed to scan {}", root.display()))?;

    for warning in &report.warnings {
        warn!("{}", warning);
    }
    for err in &report.errors {
        error!("{}", err);
    }

    if report.has_errors() {
        bail!("{} error(s) found", report.errors.len());
    }

    info!(
        "✓ Translations OK ({} warning(s))",
        report.warnings.len()
    );
    Ok(())
}
