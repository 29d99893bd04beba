//! Credential transports and identity resolution.

use async_trait::async_trait;
use entities::UserId;
use tracing::{debug, warn};

use crate::AuthResult;

/// How a session token reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCredential {
    /// Token carried by the session cookie (web clients).
    Cookie(String),
    /// Token carried by `Authorization: Bearer` (mobile clients).
    Bearer(String),
}

impl SessionCredential {
    /// Returns the raw token.
    pub fn token(&self) -> &str {
        match self {
            Self::Cookie(token) | Self::Bearer(token) => token,
        }
    }

    /// Returns a short name of the transport, for logs.
    pub fn transport(&self) -> &'static str {
        match self {
            Self::Cookie(_) => "cookie",
            Self::Bearer(_) => "bearer",
        }
    }
}

/// Identity-provider seam: turns one credential into a user id.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Resolves the credential. `Ok(None)` means no live session.
    async fn resolve(&self, credential: &SessionCredential) -> AuthResult<Option<UserId>>;

    /// Ends the session behind the credential, if the backend tracks sessions.
    async fn revoke(&self, _credential: &SessionCredential) -> AuthResult<()> {
        Ok(())
    }
}

/// Extracts the token from an `Authorization` header value using the Bearer scheme.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves the caller from the two transports in fixed order.
///
/// The session cookie is tried first and wins when it yields a user. Only
/// then is the `Authorization` header consulted. A resolver error on one
/// path counts as "no user" for that path.
pub async fn resolve_identity(
    resolver: &dyn SessionResolver,
    cookie_token: Option<&str>,
    authorization: Option<&str>,
) -> Option<UserId> {
    let cookie = cookie_token
        .filter(|token| !token.is_empty())
        .map(|token| SessionCredential::Cookie(token.to_string()));
    let bearer = authorization
        .and_then(bearer_token)
        .map(|token| SessionCredential::Bearer(token.to_string()));

    for credential in cookie.into_iter().chain(bearer) {
        match resolver.resolve(&credential).await {
            Ok(Some(user)) => {
                debug!(user_id = %user, transport = credential.transport(), "Resolved session");
                return Some(user);
            }
            Ok(None) => {
                debug!(transport = credential.transport(), "No session for credential");
            }
            Err(e) => {
                warn!(transport = credential.transport(), error = %e, "Session resolution failed");
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::AuthError;

    /// Resolver that answers from a fixed table and records every lookup.
    struct TableResolver {
        entries: Vec<(SessionCredential, AuthResult<Option<UserId>>)>,
        calls: Mutex<Vec<SessionCredential>>,
    }

    impl TableResolver {
        fn new(entries: Vec<(SessionCredential, AuthResult<Option<UserId>>)>) -> Self {
            Self {
                entries,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<SessionCredential> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SessionResolver for TableResolver {
        async fn resolve(&self, credential: &SessionCredential) -> AuthResult<Option<UserId>> {
            self.calls.lock().unwrap().push(credential.clone());
            match self.entries.iter().find(|(c, _)| c == credential) {
                Some((_, Ok(user))) => Ok(user.clone()),
                Some((_, Err(_))) => Err(AuthError::Storage("unavailable".to_string())),
                None => Ok(None),
            }
        }
    }

    fn cookie(token: &str) -> SessionCredential {
        SessionCredential::Cookie(token.to_string())
    }

    fn bearer(token: &str) -> SessionCredential {
        SessionCredential::Bearer(token.to_string())
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("bearer abc"), None);
    }

    #[tokio::test]
    async fn test_cookie_wins_over_bearer() {
        let resolver = TableResolver::new(vec![
            (cookie("c1"), Ok(Some(UserId::new("web-user")))),
            (bearer("b1"), Ok(Some(UserId::new("mobile-user")))),
        ]);

        let user = resolve_identity(&resolver, Some("c1"), Some("Bearer b1")).await;

        assert_eq!(user, Some(UserId::new("web-user")));
        assert_eq!(resolver.calls(), vec![cookie("c1")]);
    }

    #[tokio::test]
    async fn test_falls_back_to_bearer() {
        let resolver = TableResolver::new(vec![(bearer("b1"), Ok(Some(UserId::new("mobile-user"))))]);

        let user = resolve_identity(&resolver, Some("stale"), Some("Bearer b1")).await;

        assert_eq!(user, Some(UserId::new("mobile-user")));
        assert_eq!(resolver.calls(), vec![cookie("stale"), bearer("b1")]);
    }

    #[tokio::test]
    async fn test_cookie_error_still_tries_bearer() {
        let resolver = TableResolver::new(vec![
            (cookie("c1"), Err(AuthError::InvalidToken)),
            (bearer("b1"), Ok(Some(UserId::new("u")))),
        ]);

        let user = resolve_identity(&resolver, Some("c1"), Some("Bearer b1")).await;
        assert_eq!(user, Some(UserId::new("u")));
    }

    #[tokio::test]
    async fn test_no_credentials_is_unauthenticated() {
        let resolver = TableResolver::new(Vec::new());

        assert_eq!(resolve_identity(&resolver, None, None).await, None);
        assert_eq!(resolve_identity(&resolver, None, Some("Basic xyz")).await, None);
        assert!(resolver.calls().is_empty());
    }
}
