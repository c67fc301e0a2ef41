//! Process startup: discover languages, initialize the translation runtime,
//! build the router, then listen.
//!
//! Each step runs once, in order. A failing step aborts startup; the
//! listener is never bound when an earlier step fails.

use crate::config::Config;
use crate::i18n::{discover_languages, I18nError, I18nOptions, Translator};
use crate::server;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(thiserror::Error, Debug)]
pub enum BootstrapError {
    /// Translations root missing or unreadable
    #[error(transparent)]
    Filesystem(I18nError),

    /// Malformed or inconsistent configuration, including unreadable resources
    #[error(transparent)]
    Configuration(I18nError),

    #[error("Failed to bind {addr}: {source}")]
    ListenerBind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

impl From<I18nError> for BootstrapError {
    fn from(err: I18nError) -> Self {
        match err {
            I18nError::Discovery { .. } => Self::Filesystem(err),
            other => Self::Configuration(other),
        }
    }
}

/// Steps 1 and 2: build the options from the translations root and
/// initialize the translation runtime.
pub async fn init_i18n(config: &Config) -> Result<Translator, BootstrapError> {
    let root = &config.translations_dir;

    // One scan serves as both the supported and the preload list.
    let languages = discover_languages(root).await?;
    info!(
        "Discovered {} language(s) in {}: {:?}",
        languages.len(),
        root.display(),
        languages
    );

    let options = I18nOptions::for_translations(root, languages);
    let translator = Translator::init(options).await?;
    Ok(translator)
}

/// Step 4: bind the listener. Step 3 is [`server::router`].
pub async fn bind(config: &Config) -> Result<TcpListener, BootstrapError> {
    let addr = config.bind_addr();
    TcpListener::bind(addr)
        .await
        .map_err(|source| BootstrapError::ListenerBind { addr, source })
}

/// Serve `app` on an already bound listener until `shutdown` resolves,
/// then drain pending missing-key reports.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    translator: Arc<Translator>,
    shutdown: F,
) -> Result<(), BootstrapError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{}", addr);
    }

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(BootstrapError::Serve);

    translator.close().await;
    result
}

/// Run the whole startup sequence and serve until `shutdown` resolves.
pub async fn run_until<F>(config: Config, shutdown: F) -> Result<(), BootstrapError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let translator = Arc::new(init_i18n(&config).await?);
    let app = server::router(Arc::clone(&translator));
    let listener = match bind(&config).await {
        Ok(listener) => listener,
        Err(e) => {
            translator.close().await;
            return Err(e);
        }
    };
    serve(listener, app, translator, shutdown).await
}

/// Run the whole startup sequence and serve until ctrl-c.
pub async fn run(config: Config) -> Result<(), BootstrapError> {
    run_until(config, shutdown_signal()).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
