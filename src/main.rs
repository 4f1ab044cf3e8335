//! Lean Coffee Board Backend
//!
//! A REST backend for a shared Lean Coffee board with SQLite persistence and
//! polling-based convergence between participants.

mod api;
mod config;
mod db;
mod engine;
mod errors;
mod models;
mod refresh;
mod session;
mod store;
mod view;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use session::SessionRegistry;
use store::BoardStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BoardStore>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lean Coffee Board Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let store: Arc<dyn BoardStore> =
        Arc::new(Repository::new(pool, config.stage_labels.clone()));

    let sessions = Arc::new(SessionRegistry::new());

    // Start the polling refresh loop
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let refresh_task = refresh::spawn(
        sessions.clone(),
        store.clone(),
        config.refresh_settings(),
        shutdown_rx,
    );

    // Create application state
    let state = AppState {
        store,
        sessions,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await?;

    shutdown_tx.send(true).ok();
    if let Some(task) = refresh_task {
        task.await.ok();
    }

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // Browser clients may be served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Boards
        .route("/boards", post(api::create_board))
        .route("/boards/{board_id}", get(api::get_board))
        .route("/boards/{board_id}/sessions", post(api::join_board))
        // Sessions
        .route(
            "/sessions/{session_id}",
            get(api::get_session).delete(api::leave_session),
        )
        .route("/sessions/{session_id}/topic", put(api::set_topic))
        .route("/sessions/{session_id}/max-votes", put(api::set_max_votes))
        .route("/sessions/{session_id}/sort", put(api::set_sort))
        .route("/sessions/{session_id}/merge", post(api::merge_selected))
        // Cards
        .route("/sessions/{session_id}/cards", post(api::add_card))
        .route(
            "/sessions/{session_id}/cards/{card_id}",
            put(api::edit_card).delete(api::delete_card),
        )
        .route(
            "/sessions/{session_id}/cards/{card_id}/move",
            post(api::move_card),
        )
        .route(
            "/sessions/{session_id}/cards/{card_id}/vote",
            post(api::vote_card),
        )
        .route(
            "/sessions/{session_id}/cards/{card_id}/selection",
            put(api::select_card),
        );

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
