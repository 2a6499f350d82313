pub mod api;
pub mod chat;
pub mod config;
pub mod core_state;
pub mod export;
pub mod ingest;
pub mod labs;
pub mod models;
pub mod pipeline;
pub mod session_store;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Server(#[from] api::ServerError),
}

/// Load configuration, restore sessions, and serve until Ctrl-C.
///
/// State is built before the async runtime exists and dropped after it is
/// gone: the blocking HTTP client inside it must not be created or dropped
/// on a runtime thread.
pub fn run() -> Result<(), StartupError> {
    config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let app_config = config::AppConfig::from_env();
    app_config.log_summary();

    let core = Arc::new(core_state::CoreState::from_config(app_config));
    tracing::info!(
        sessions = core.sessions.len(),
        strategies = ?core.extractor.strategy_names(),
        llm_configured = core.llm_configured(),
        "State ready"
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(api::serve(core.clone()));
    drop(runtime);

    core.persist_sessions();
    result.map_err(StartupError::from)
}
