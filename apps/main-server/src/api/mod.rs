//! API endpoints.

pub mod auth;
pub mod docs;
pub mod work;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};
use work_protocol::API_BASE_PATH;

use crate::error::ServerError;
use crate::middleware::auth_middleware;
use crate::state::SharedState;

/// Creates the API router with all endpoints.
pub fn create_router(state: SharedState) -> Router<SharedState> {
    let works = Router::new()
        .route("/", get(work::list_works))
        .route("/add", post(work::add_work))
        .route("/update/:id", patch(work::update_work))
        .route("/delete/:id", delete(work::delete_work))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    let identity = Router::new()
        .route("/get-session", get(auth::get_session))
        .route("/sign-out", post(auth::sign_out));

    Router::new()
        .nest(
            API_BASE_PATH,
            works.nest("/auth", identity).merge(docs::router()),
        )
        // Health check
        .route("/health", get(health_check))
        .fallback(not_found)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

async fn not_found() -> ServerError {
    ServerError::NotFound("Not found".to_string())
}
