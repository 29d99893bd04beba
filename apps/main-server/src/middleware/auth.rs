//! Authentication middleware.

use auth::resolve_identity;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use entities::UserId;

use crate::error::ServerError;
use crate::state::SharedState;

/// Authenticated user information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// User ID.
    pub id: UserId,
}

/// Reads the session cookie named `cookie_name`.
pub fn session_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
}

fn authorization_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Authentication middleware.
///
/// Resolves the caller from the session cookie, then from the bearer token,
/// and stores the authenticated user in the request extensions. Requests
/// without a resolvable identity get a 401 and never reach the handler.
pub async fn auth_middleware(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie = session_cookie(request.headers(), &state.config.session_cookie);
    let authorization = authorization_header(request.headers());

    let Some(id) = resolve_identity(
        state.sessions.as_ref(),
        cookie.as_deref(),
        authorization.as_deref(),
    )
    .await
    else {
        tracing::debug!(path = %request.uri().path(), "Rejected unauthenticated request");
        return ServerError::Unauthorized.into_response();
    };

    request.extensions_mut().insert(AuthenticatedUser { id });
    next.run(request).await
}
