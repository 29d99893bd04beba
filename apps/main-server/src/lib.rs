//! Worktrack Server
//!
//! REST API over a personal list of work items. Every work route is scoped
//! to the caller resolved from the session cookie or a bearer token.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

use std::sync::Arc;

use auth::{JwtConfig, JwtManager, ProvisioningResolver, SessionResolver, SqliteSessionStore};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use work_store::{SqliteWorkStore, WorkStore};

use crate::config::Config;
use crate::state::{AppState, SharedState};

/// Creates the application router with all routes configured.
pub fn create_app(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let timeout = TimeoutLayer::new(state.config.request_timeout());

    api::create_router(state.clone())
        .with_state(state)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Creates the application state from its collaborators.
pub fn create_state(
    config: Config,
    store: Arc<dyn WorkStore>,
    sessions: Arc<dyn SessionResolver>,
) -> SharedState {
    Arc::new(AppState::new(config, store, sessions))
}

/// Connects to the database, creates the tables and picks the session backend.
///
/// Sessions are JWTs when a secret is configured and database rows otherwise.
/// In JWT mode every resolved user is inserted into `users` before use.
pub async fn open_state(config: Config) -> anyhow::Result<SharedState> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    // The works table references users, so the session tables go first.
    let session_store = SqliteSessionStore::new(pool.clone());
    session_store.init().await?;

    let work_store = SqliteWorkStore::new(pool);
    work_store.init().await?;

    let sessions: Arc<dyn SessionResolver> = match &config.jwt_secret {
        Some(secret) => {
            tracing::info!("Using JWT sessions");
            let jwt_config =
                JwtConfig::new(secret).with_expiration_hours(config.jwt_expiration_hours);
            // JWT subjects get a users row on first sight, since works reference users.
            Arc::new(ProvisioningResolver::new(
                JwtManager::new(jwt_config),
                session_store,
            ))
        }
        None => {
            tracing::info!("Using database sessions");
            Arc::new(session_store)
        }
    };

    Ok(create_state(config, Arc::new(work_store), sessions))
}

/// Builds the CORS policy for the configured origins.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true)
}

/// Initializes tracing with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
