//! Identity-provider endpoints under `/api/auth`.

use auth::{SessionCredential, bearer_token, resolve_identity};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use axum_extra::extract::{CookieJar, cookie::Cookie};
use serde::Serialize;
use utoipa::ToSchema;

use crate::middleware::session_cookie;
use crate::state::SharedState;

/// Body of `GET /api/auth/get-session`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub user: SessionUser,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionUser {
    pub id: String,
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

/// Returns the caller's session, or `null` when there is none.
#[utoipa::path(
    get,
    path = "/api/auth/get-session",
    tag = "auth",
    responses((status = 200, description = "Session of the caller, or null", body = SessionView))
)]
pub async fn get_session(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Json<Option<SessionView>> {
    let cookie = session_cookie(&headers, &state.config.session_cookie);
    let user = resolve_identity(
        state.sessions.as_ref(),
        cookie.as_deref(),
        authorization(&headers),
    )
    .await;

    Json(user.map(|id| SessionView {
        user: SessionUser { id: id.to_string() },
    }))
}

/// Revokes every presented session and expires the session cookie.
///
/// Database sessions are deleted. JWTs are remembered as revoked by the
/// running process until they expire.
#[utoipa::path(
    post,
    path = "/api/auth/sign-out",
    tag = "auth",
    responses((status = 204, description = "Signed out"))
)]
pub async fn sign_out(
    State(state): State<SharedState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> impl IntoResponse {
    let cookie_name = state.config.session_cookie.clone();

    let cookie = jar
        .get(&cookie_name)
        .map(|c| SessionCredential::Cookie(c.value().to_string()));
    let bearer = authorization(&headers)
        .and_then(bearer_token)
        .map(|t| SessionCredential::Bearer(t.to_string()));

    for credential in cookie.into_iter().chain(bearer) {
        if let Err(e) = state.sessions.revoke(&credential).await {
            tracing::warn!(transport = credential.transport(), error = %e, "Failed to revoke session");
        }
    }

    let jar = jar.remove(Cookie::build((cookie_name, "")).path("/"));
    (jar, StatusCode::NO_CONTENT)
}
