//! JWT session tokens.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use entities::UserId;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::{
    AuthError, AuthResult, DEFAULT_JWT_ISSUER, DEFAULT_SESSION_TTL_HOURS, SessionCredential,
    SessionResolver,
};

/// JWT claims of a worktrack session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// Issuer.
    pub iss: String,
    /// JWT ID.
    pub jti: String,
}

impl Claims {
    /// Creates new claims for a user.
    pub fn new(user_id: &UserId, issuer: &str, expiration_hours: u64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours as i64);

        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: issuer.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Returns the user ID.
    pub fn user_id(&self) -> AuthResult<UserId> {
        if self.sub.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(UserId::new(self.sub.clone()))
    }
}

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Token expiration in hours.
    pub expiration_hours: u64,
    /// Token issuer.
    pub issuer: String,
}

impl JwtConfig {
    /// Creates a new JWT configuration.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours: DEFAULT_SESSION_TTL_HOURS,
            issuer: DEFAULT_JWT_ISSUER.to_string(),
        }
    }

    /// Sets the expiration time in hours.
    pub fn with_expiration_hours(mut self, hours: u64) -> Self {
        self.expiration_hours = hours;
        self
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

/// Session backend where the token itself carries the user id.
///
/// Revoked tokens are remembered by `jti` until they expire. The list lives
/// in process memory, so a restart forgets it.
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    revoked: Arc<RwLock<HashMap<String, i64>>>,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.config.issuer)
            .field("expiration_hours", &self.config.expiration_hours)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    /// Creates a new JWT manager.
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
            revoked: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Generates a session token for a user.
    pub fn generate_token(&self, user_id: &UserId) -> AuthResult<String> {
        let claims = Claims::new(user_id, &self.config.issuer, self.config.expiration_hours);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::JwtEncoding(e.to_string()))
    }

    /// Validates and decodes a token.
    pub fn validate_token(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        Ok(token_data.claims)
    }

    /// Returns true if the token's id was revoked.
    async fn is_revoked(&self, claims: &Claims) -> bool {
        self.revoked.read().await.contains_key(&claims.jti)
    }
}

#[async_trait]
impl SessionResolver for JwtManager {
    async fn resolve(&self, credential: &SessionCredential) -> AuthResult<Option<UserId>> {
        let claims = match self.validate_token(credential.token()) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Rejected session token");
                return Ok(None);
            }
        };

        if self.is_revoked(&claims).await {
            debug!(jti = %claims.jti, "Rejected revoked session token");
            return Ok(None);
        }

        claims.user_id().map(Some)
    }

    async fn revoke(&self, credential: &SessionCredential) -> AuthResult<()> {
        // Tokens that no longer validate cannot resolve anyway.
        let Ok(claims) = self.validate_token(credential.token()) else {
            return Ok(());
        };

        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp >= now);
        revoked.insert(claims.jti, claims.exp);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-must-be-long-enough-for-security";

    #[test]
    fn test_jwt_generation_and_validation() {
        let manager = JwtManager::new(JwtConfig::new(SECRET));
        let user_id = UserId::new("user-1");

        let token = manager.generate_token(&user_id).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.iss, DEFAULT_JWT_ISSUER);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_invalid_token() {
        let manager = JwtManager::new(JwtConfig::new(SECRET));
        assert!(manager.validate_token("invalid-token").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let manager1 = JwtManager::new(JwtConfig::new("secret-one-must-be-long-enough"));
        let manager2 = JwtManager::new(JwtConfig::new("secret-two-must-be-long-enough"));

        let token = manager1.generate_token(&UserId::new("user-1")).unwrap();
        assert!(manager2.validate_token(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let issuer_a = JwtManager::new(JwtConfig::new(SECRET).with_issuer("a"));
        let issuer_b = JwtManager::new(JwtConfig::new(SECRET).with_issuer("b"));

        let token = issuer_a.generate_token(&UserId::new("user-1")).unwrap();
        assert!(issuer_b.validate_token(&token).is_err());
    }

    #[tokio::test]
    async fn test_resolves_on_either_transport() {
        let manager = JwtManager::new(JwtConfig::new(SECRET));
        let token = manager.generate_token(&UserId::new("user-1")).unwrap();

        for credential in [
            SessionCredential::Cookie(token.clone()),
            SessionCredential::Bearer(token.clone()),
        ] {
            let user = manager.resolve(&credential).await.unwrap();
            assert_eq!(user, Some(UserId::new("user-1")));
        }
    }

    #[tokio::test]
    async fn test_revoked_token_stops_resolving() {
        let manager = JwtManager::new(JwtConfig::new(SECRET));
        let revoked = manager.generate_token(&UserId::new("user-1")).unwrap();
        let other = manager.generate_token(&UserId::new("user-1")).unwrap();

        manager
            .revoke(&SessionCredential::Cookie(revoked.clone()))
            .await
            .unwrap();

        // Revocation follows the token, whichever transport carries it.
        let user = manager
            .resolve(&SessionCredential::Bearer(revoked))
            .await
            .unwrap();
        assert_eq!(user, None);

        let user = manager
            .resolve(&SessionCredential::Bearer(other))
            .await
            .unwrap();
        assert_eq!(user, Some(UserId::new("user-1")));
    }

    #[tokio::test]
    async fn test_revoking_garbage_is_a_no_op() {
        let manager = JwtManager::new(JwtConfig::new(SECRET));
        manager
            .revoke(&SessionCredential::Bearer("garbage".to_string()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_garbage_resolves_to_none() {
        let manager = JwtManager::new(JwtConfig::new(SECRET));
        let user = manager
            .resolve(&SessionCredential::Bearer("garbage".to_string()))
            .await
            .unwrap();
        assert_eq!(user, None);
    }
}
