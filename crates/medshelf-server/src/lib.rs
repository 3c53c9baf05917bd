//! Medshelf HTTP server.
//!
//! Thin axum veneer over [`medshelf_core`]: routing, bearer-token identity,
//! and the `{success, data}` response envelope. The storage backend is chosen
//! by configuration at startup; everything else is backend-agnostic.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use anyhow::Context;
use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use medshelf_core::{MedicationService, MedicationStore, SledStore, SqliteStore};

use crate::config::{ServerConfig, StoreBackend};
use crate::state::AppState;

/// Open the configured storage backend.
pub fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn MedicationStore>> {
    let store: Arc<dyn MedicationStore> = match config.backend {
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(&config.sqlite_path).with_context(
            || {
                format!(
                    "Failed to open SQLite store at {}",
                    config.sqlite_path.display()
                )
            },
        )?),
        StoreBackend::Sled => Arc::new(SledStore::open(&config.sled_path).with_context(|| {
            format!("Failed to open sled store at {}", config.sled_path.display())
        })?),
    };
    Ok(store)
}

/// Build the application router around a ready state.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route(
            "/medications",
            get(handlers::medications::list).post(handlers::medications::create),
        )
        .route("/medications/search", get(handlers::medications::search))
        .route("/medications/exists", get(handlers::medications::exists))
        .route("/medications/images/:filename", get(handlers::images::serve))
        .route(
            "/medications/:id",
            get(handlers::medications::get_by_id)
                .put(handlers::medications::update)
                .delete(handlers::medications::delete),
        )
        .route(
            "/medications/:id/reviews",
            get(handlers::reviews::list).post(handlers::reviews::create),
        )
        .route(
            "/medications/:id/reviews/:review_id",
            get(handlers::reviews::get_by_id)
                .put(handlers::reviews::update)
                .delete(handlers::reviews::delete),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(cors)
}

/// Open the store, bind, and serve until shutdown.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let store = open_store(&config)?;
    let service = Arc::new(MedicationService::new(store));
    let state = AppState {
        service,
        config: Arc::new(config),
    };

    let addr = state.config.addr()?;
    let app = build_router(state.clone());

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;
    info!(%addr, backend = ?state.config.backend, "medshelf server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed while running")?;

    info!("medshelf server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received shutdown signal");
    }
}
