pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use log::info;

use crate::config::TimeLimits;
use crate::engine::EnginePool;

pub use error::ApiError;

pub struct AppState {
    pub pool: EnginePool,
    pub limits: TimeLimits,
}

impl AppState {
    pub fn new(pool: EnginePool, limits: TimeLimits) -> Self { Self { pool, limits } }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/new_game", post(handlers::new_game))
        .route("/make_move", post(handlers::make_move))
        .route("/get_best_move", post(handlers::get_best_move))
        .route("/analyze_position", post(handlers::analyze_position))
        .route("/validate_fen", post(handlers::validate_fen))
        .route("/game_info", post(handlers::game_info))
        .with_state(state)
}

/// Serves until SIGINT/SIGTERM, then shuts the engine pool down.
pub async fn serve(host: &str, port: u16, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("http server stopped; shutting down engines");
    state.pool.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => { sig.recv().await; }
            Err(e) => { log::error!("failed to listen for SIGTERM: {e}"); std::future::pending::<()>().await }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
