pub mod adapter;
pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod models;
pub mod patch;
pub mod record;
pub mod service;
pub mod store;

use crate::auth::LoginCheck;
use crate::config::ServerConfig;
use crate::http::{build_router, AppState};
use crate::service::CommandService;
use crate::store::JsonFileStore;
use std::path::Path;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

pub async fn run() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;
    init_tracing(config.log_dir.as_deref()).map_err(anyhow::Error::msg)?;
    serve(config).await
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let store = Arc::new(JsonFileStore::new(&config.data_path));
    if config.create_if_missing && store.ensure_exists()? {
        tracing::info!(path = %store.path().display(), "created empty command store");
    }

    let login = LoginCheck::new(config.login_password.clone());
    if !login.is_configured() {
        tracing::warn!("TERMINAL_DB_LOGIN_PASSWORD is not set; every login will be rejected");
    }

    let commands = CommandService::new(store, config.serialize_writes);
    let app = build_router(AppState::new(commands.clone(), login));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(
        addr = %config.bind,
        store = %commands.store_description(),
        serialize_writes = config.serialize_writes,
        "server listening"
    );
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn init_tracing(log_dir: Option<&Path>) -> Result<(), String> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let Some(log_dir) = log_dir else {
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
            .map_err(|error| error.to_string());
    };

    std::fs::create_dir_all(log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "server.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}
