// SPDX-License-Identifier: MIT

//! Dependency composition and graceful shutdown.
//!
//! Open storage, build the bus and services, start the HTTP listener and
//! the WebSocket bridge, then wait for the shutdown signal: stop
//! accepting, close WebSockets with a normal code, and give in-flight
//! requests a bounded drain window.

use crate::config::Config;
use crate::http::{self, AppState};
use crate::ws;
use maestro_core::{IdGen, SystemClock};
use maestro_engine::services::{ServiceCtx, Services};
use maestro_engine::{
    DigestConfig, DigestService, EventBus, FsManifestGenerator, SpawnConfig, SpawnService,
};
use maestro_storage::Storage;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// How long in-flight work may drain after the shutdown signal.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("storage failed to open: {0}")]
    Storage(#[from] maestro_storage::StoreError),

    #[error("listener failed to bind: {0}")]
    Bind(std::io::Error),

    #[error("http server failed: {0}")]
    Serve(std::io::Error),
}

/// Build the full stack from a config.
pub fn build_state(config: &Config, bus: EventBus) -> Result<AppState, ServerError> {
    let storage = Arc::new(Storage::open(&config.state_dir)?);
    let ctx = ServiceCtx::new(storage, bus, Arc::new(IdGen::new()), SystemClock);
    let services = Services::new(ctx.clone());
    let digest = DigestService::new(ctx.clone(), DigestConfig::default());
    let spawner = SpawnService::new(
        ctx,
        services.sessions.clone(),
        services.templates.clone(),
        Arc::new(FsManifestGenerator),
        SpawnConfig {
            server_url: config.advertised_url(),
            sessions_dir: config.sessions_dir.clone(),
            agent_command: config.agent_command.clone(),
        },
    );
    Ok(AppState::new(services, digest, spawner))
}

/// Run until the token is cancelled.
pub async fn run(config: Config, shutdown: CancellationToken) -> Result<(), ServerError> {
    let bus = EventBus::new();
    let state = build_state(&config, bus.clone())?;
    let router = http::router(state);

    let http_listener = TcpListener::bind(("0.0.0.0", config.http_port))
        .await
        .map_err(ServerError::Bind)?;
    let ws_listener = TcpListener::bind(("0.0.0.0", config.ws_port))
        .await
        .map_err(ServerError::Bind)?;
    info!(
        http = %http_listener.local_addr().map(|a| a.to_string()).unwrap_or_default(),
        ws = %ws_listener.local_addr().map(|a| a.to_string()).unwrap_or_default(),
        state_dir = %config.state_dir.display(),
        "maestro server listening"
    );

    let bridge = tokio::spawn(ws::run(ws_listener, bus, shutdown.clone()));

    let serve_shutdown = shutdown.clone();
    axum::serve(http_listener, router)
        .with_graceful_shutdown(async move { serve_shutdown.cancelled().await })
        .await
        .map_err(ServerError::Serve)?;

    // The HTTP side is drained; give the bridge its bounded window.
    if tokio::time::timeout(SHUTDOWN_DEADLINE, bridge).await.is_err() {
        tracing::warn!("websocket bridge did not stop within the shutdown deadline");
    }
    info!("maestro server stopped");
    Ok(())
}
