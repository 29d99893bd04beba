//! Session storage backends.
//!
//! Sessions are opaque random tokens. Only the SHA-256 hash of a token is
//! kept, together with the owning user and an expiry.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use entities::UserId;
use tokio::sync::RwLock;

use crate::{
    AuthResult, SessionCredential, SessionResolver, generate_session_token, hash_session_token,
};

/// A session backend that can also mint sessions.
#[async_trait]
pub trait SessionStore: SessionResolver {
    /// Issues a new session for `user` and returns the raw token.
    async fn issue(&self, user: &UserId, ttl: Duration) -> AuthResult<String>;

    /// Removes expired sessions. Returns the number removed.
    async fn cleanup_expired(&self) -> AuthResult<usize>;
}

#[derive(Debug, Clone)]
struct StoredSession {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

impl StoredSession {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// In-memory session store (for testing and single-process mode).
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
}

impl MemorySessionStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns true if no session is stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionResolver for MemorySessionStore {
    async fn resolve(&self, credential: &SessionCredential) -> AuthResult<Option<UserId>> {
        let hash = hash_session_token(credential.token());
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&hash)
            .filter(|s| s.is_live(Utc::now()))
            .map(|s| s.user_id.clone()))
    }

    async fn revoke(&self, credential: &SessionCredential) -> AuthResult<()> {
        let hash = hash_session_token(credential.token());
        self.sessions.write().await.remove(&hash);
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn issue(&self, user: &UserId, ttl: Duration) -> AuthResult<String> {
        let token = generate_session_token();
        let session = StoredSession {
            user_id: user.clone(),
            expires_at: Utc::now() + ttl,
        };
        self.sessions
            .write()
            .await
            .insert(hash_session_token(&token), session);
        Ok(token)
    }

    async fn cleanup_expired(&self) -> AuthResult<usize> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before_count = sessions.len();
        sessions.retain(|_, s| s.is_live(now));
        Ok(before_count - sessions.len())
    }
}

#[cfg(feature = "sqlx")]
pub use sqlx_store::*;

#[cfg(feature = "sqlx")]
mod sqlx_store {
    use std::collections::HashSet;

    use sqlx::{Pool, Sqlite};
    use tracing::{debug, info};

    use super::*;
    use crate::AuthError;

    fn storage(context: &str) -> impl FnOnce(sqlx::Error) -> AuthError + '_ {
        move |e| AuthError::Storage(format!("{context}: {e}"))
    }

    /// SQLite session store. Owns the `users` and `sessions` tables.
    #[derive(Clone)]
    pub struct SqliteSessionStore {
        pool: Pool<Sqlite>,
    }

    impl SqliteSessionStore {
        /// Creates a new SQLite store.
        pub fn new(pool: Pool<Sqlite>) -> Self {
            Self { pool }
        }

        /// Creates the `users` and `sessions` tables if they do not exist.
        pub async fn init(&self) -> AuthResult<()> {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY,
                    name TEXT,
                    email TEXT UNIQUE,
                    created_at TEXT NOT NULL
                )
                "#,
            )
            .execute(&self.pool)
            .await
            .map_err(storage("Failed to create users table"))?;

            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS sessions (
                    token_hash TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    expires_at INTEGER NOT NULL,
                    created_at INTEGER NOT NULL
                )
                "#,
            )
            .execute(&self.pool)
            .await
            .map_err(storage("Failed to create sessions table"))?;

            sqlx::query(
                r#"
                CREATE INDEX IF NOT EXISTS idx_sessions_expires_at
                ON sessions (expires_at)
                "#,
            )
            .execute(&self.pool)
            .await
            .map_err(storage("Failed to create index"))?;

            info!("Session tables ready");
            Ok(())
        }

        /// Inserts the user row if it does not exist yet.
        pub async fn ensure_user(
            &self,
            user: &UserId,
            name: Option<&str>,
            email: Option<&str>,
        ) -> AuthResult<()> {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO users (id, name, email, created_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(user.as_str())
            .bind(name)
            .bind(email)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(storage("Failed to insert user"))?;
            Ok(())
        }
    }

    #[async_trait]
    impl SessionResolver for SqliteSessionStore {
        async fn resolve(&self, credential: &SessionCredential) -> AuthResult<Option<UserId>> {
            let row: Option<(String,)> = sqlx::query_as(
                r#"
                SELECT user_id FROM sessions
                WHERE token_hash = ? AND expires_at > ?
                "#,
            )
            .bind(hash_session_token(credential.token()))
            .bind(Utc::now().timestamp())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage("Failed to look up session"))?;

            Ok(row.map(|(user_id,)| UserId::new(user_id)))
        }

        async fn revoke(&self, credential: &SessionCredential) -> AuthResult<()> {
            sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
                .bind(hash_session_token(credential.token()))
                .execute(&self.pool)
                .await
                .map_err(storage("Failed to revoke session"))?;
            Ok(())
        }
    }

    /// Resolver that records every resolved user in the `users` table.
    ///
    /// Token backends such as JWT vouch for users the database has never
    /// seen. Rows that reference `users(id)` need the user to exist first.
    pub struct ProvisioningResolver<R> {
        inner: R,
        users: SqliteSessionStore,
        known: RwLock<HashSet<UserId>>,
    }

    impl<R: SessionResolver> ProvisioningResolver<R> {
        /// Wraps `inner`, inserting resolved users through `users`.
        pub fn new(inner: R, users: SqliteSessionStore) -> Self {
            Self {
                inner,
                users,
                known: RwLock::new(HashSet::new()),
            }
        }
    }

    #[async_trait]
    impl<R: SessionResolver> SessionResolver for ProvisioningResolver<R> {
        async fn resolve(&self, credential: &SessionCredential) -> AuthResult<Option<UserId>> {
            let user = self.inner.resolve(credential).await?;

            if let Some(user) = &user {
                if !self.known.read().await.contains(user) {
                    self.users.ensure_user(user, None, None).await?;
                    debug!(user_id = %user, "Provisioned user row");
                    self.known.write().await.insert(user.clone());
                }
            }

            Ok(user)
        }

        async fn revoke(&self, credential: &SessionCredential) -> AuthResult<()> {
            self.inner.revoke(credential).await
        }
    }

    #[async_trait]
    impl SessionStore for SqliteSessionStore {
        async fn issue(&self, user: &UserId, ttl: Duration) -> AuthResult<String> {
            let token = generate_session_token();
            let now = Utc::now();

            sqlx::query(
                r#"
                INSERT INTO sessions (token_hash, user_id, expires_at, created_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(hash_session_token(&token))
            .bind(user.as_str())
            .bind((now + ttl).timestamp())
            .bind(now.timestamp())
            .execute(&self.pool)
            .await
            .map_err(storage("Failed to store session"))?;

            Ok(token)
        }

        async fn cleanup_expired(&self) -> AuthResult<usize> {
            let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
                .bind(Utc::now().timestamp())
                .execute(&self.pool)
                .await
                .map_err(storage("Failed to cleanup expired sessions"))?;

            Ok(result.rows_affected() as usize)
        }
    }

    #[cfg(test)]
    mod tests {
        use sqlx::sqlite::SqlitePoolOptions;

        use super::*;
        use crate::{JwtConfig, JwtManager};

        async fn store() -> SqliteSessionStore {
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await
                .unwrap();
            let store = SqliteSessionStore::new(pool);
            store.init().await.unwrap();
            store
        }

        #[tokio::test]
        async fn test_issue_resolve_revoke() {
            let store = store().await;
            let user = UserId::new("user-1");
            store.ensure_user(&user, Some("Ada"), None).await.unwrap();

            let token = store.issue(&user, Duration::hours(1)).await.unwrap();
            let credential = SessionCredential::Cookie(token);

            assert_eq!(store.resolve(&credential).await.unwrap(), Some(user));

            store.revoke(&credential).await.unwrap();
            assert_eq!(store.resolve(&credential).await.unwrap(), None);
        }

        #[tokio::test]
        async fn test_expired_session_is_ignored_and_cleaned() {
            let store = store().await;
            let user = UserId::new("user-1");
            store.ensure_user(&user, None, None).await.unwrap();

            let token = store.issue(&user, Duration::seconds(-5)).await.unwrap();
            let credential = SessionCredential::Bearer(token);

            assert_eq!(store.resolve(&credential).await.unwrap(), None);
            assert_eq!(store.cleanup_expired().await.unwrap(), 1);
        }

        async fn user_count(store: &SqliteSessionStore) -> i64 {
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
                .fetch_one(&store.pool)
                .await
                .unwrap();
            count
        }

        #[tokio::test]
        async fn test_provisioning_inserts_resolved_user_once() {
            let store = store().await;
            let jwt = JwtManager::new(JwtConfig::new("provisioning-secret-long-enough"));
            let token = jwt.generate_token(&UserId::new("alice")).unwrap();
            let resolver = ProvisioningResolver::new(jwt, store.clone());
            let credential = SessionCredential::Bearer(token);

            for _ in 0..2 {
                let user = resolver.resolve(&credential).await.unwrap();
                assert_eq!(user, Some(UserId::new("alice")));
            }
            assert_eq!(user_count(&store).await, 1);

            // A session can now reference the provisioned user.
            store
                .issue(&UserId::new("alice"), Duration::hours(1))
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_provisioning_skips_unresolved_credentials() {
            let store = store().await;
            let jwt = JwtManager::new(JwtConfig::new("provisioning-secret-long-enough"));
            let resolver = ProvisioningResolver::new(jwt, store.clone());

            let user = resolver
                .resolve(&SessionCredential::Cookie("garbage".to_string()))
                .await
                .unwrap();
            assert_eq!(user, None);
            assert_eq!(user_count(&store).await, 0);
        }

        #[tokio::test]
        async fn test_session_requires_existing_user() {
            let store = store().await;
            let result = store.issue(&UserId::new("ghost"), Duration::hours(1)).await;
            assert!(result.is_err());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic_operations() {
        let store = MemorySessionStore::new();
        let user = UserId::new("user-1");

        let token = store.issue(&user, Duration::hours(1)).await.unwrap();

        // Same token resolves on both transports
        let cookie = SessionCredential::Cookie(token.clone());
        let bearer = SessionCredential::Bearer(token);
        assert_eq!(store.resolve(&cookie).await.unwrap(), Some(user.clone()));
        assert_eq!(store.resolve(&bearer).await.unwrap(), Some(user));

        store.revoke(&cookie).await.unwrap();
        assert_eq!(store.resolve(&bearer).await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_store_unknown_token() {
        let store = MemorySessionStore::new();
        let credential = SessionCredential::Bearer("unknown".to_string());
        assert_eq!(store.resolve(&credential).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_cleanup() {
        let store = MemorySessionStore::new();
        let user = UserId::new("user-1");

        let stale = store.issue(&user, Duration::seconds(-10)).await.unwrap();
        let fresh = store.issue(&user, Duration::hours(1)).await.unwrap();

        assert_eq!(
            store
                .resolve(&SessionCredential::Cookie(stale))
                .await
                .unwrap(),
            None
        );

        let removed = store.cleanup_expired().await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
        assert!(
            store
                .resolve(&SessionCredential::Cookie(fresh))
                .await
                .unwrap()
                .is_some()
        );
    }
}
