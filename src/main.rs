// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{process::ExitCode, sync::Arc};

use takeout_gate::{
    api::router,
    config::{ConfigError, Settings, StoreSettings},
    session_store::{
        InMemorySessionStore, RedisSessionStore, SessionLookup, SessionStore, StoreError,
    },
    state::{AppState, StateError},
    telemetry::init_tracing,
};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("session store: {0}")]
    Store(#[from] StoreError),
    #[error("interceptor chain: {0}")]
    State(#[from] StateError),
    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(settings.log_format);

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Takeout gate failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> Result<(), StartupError> {
    let store = open_store(&settings.store).await?;
    let sessions = Arc::new(SessionLookup::new(store, settings.store.lookup_timeout));
    let state = AppState::from_settings(&settings.auth, sessions)?;
    let app = router(state);

    let addr = settings.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Takeout gate listening (docs at /swagger-ui)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Takeout gate stopped");
    Ok(())
}

async fn open_store(settings: &StoreSettings) -> Result<Arc<dyn SessionStore>, StoreError> {
    match &settings.redis_url {
        Some(url) => {
            let store = RedisSessionStore::connect(url, settings.key_prefix.clone()).await?;
            if !settings.seed_sessions.is_empty() {
                tracing::warn!("SEED_SESSIONS ignored when REDIS_URL is set");
            }
            tracing::info!(prefix = %settings.key_prefix, "Using Redis session store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("REDIS_URL not set, using in-memory session store (development only)");
            let store = InMemorySessionStore::new(settings.memory_capacity);
            store.seed(&settings.seed_sessions, settings.seed_ttl);
            if !store.is_empty() {
                tracing::info!(count = store.len(), "Seeded development sessions");
            }
            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
