//! SQLite work store implementation.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use entities::{UserId, WorkItem, WorkStatus};
use sqlx::{FromRow, Pool, Sqlite};
use tracing::info;
use work_protocol::WorkPatch;

use crate::{WorkStore, WorkStoreError, WorkStoreResult};

/// Database row for WorkItem.
#[derive(Debug, FromRow)]
pub struct WorkRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub end_date: Option<String>,
    pub created_at: String,
}

impl TryFrom<WorkRow> for WorkItem {
    type Error = WorkStoreError;

    fn try_from(row: WorkRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<WorkStatus>()
            .map_err(|e| WorkStoreError::corrupt(&row.id, e.to_string()))?;
        let end_date = row
            .end_date
            .as_deref()
            .map(|raw| parse_timestamp(&row.id, raw))
            .transpose()?;
        let created_at = parse_timestamp(&row.id, &row.created_at)?;

        Ok(WorkItem {
            id: row.id,
            owner_id: UserId::new(row.owner_id),
            title: row.title,
            description: row.description,
            status,
            end_date,
            created_at,
        })
    }
}

fn parse_timestamp(id: &str, raw: &str) -> WorkStoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| WorkStoreError::corrupt(id, format!("bad timestamp '{raw}': {e}")))
}

/// Fixed-width UTC text, so rows sort by `created_at` lexicographically.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// SQLite work store. Owns the `works` table.
#[derive(Clone)]
pub struct SqliteWorkStore {
    pool: Pool<Sqlite>,
}

impl SqliteWorkStore {
    /// Creates a new SQLite store.
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Creates the `works` table if it does not exist. The `users` table must
    /// already exist.
    pub async fn init(&self) -> WorkStoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS works (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'todo'
                    CHECK (status IN ('backlog', 'todo', 'in-progress', 'done', 'cancelled')),
                end_date TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_works_owner_id
            ON works (owner_id, created_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Works table ready");
        Ok(())
    }
}

#[async_trait]
impl WorkStore for SqliteWorkStore {
    async fn list_by_owner(&self, owner: &UserId) -> WorkStoreResult<Vec<WorkItem>> {
        let rows: Vec<WorkRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, title, description, status, end_date, created_at
            FROM works
            WHERE owner_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WorkItem::try_from).collect()
    }

    async fn create(&self, item: WorkItem) -> WorkStoreResult<WorkItem> {
        sqlx::query(
            r#"
            INSERT INTO works (id, owner_id, title, description, status, end_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.id)
        .bind(item.owner_id.as_str())
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.status.as_str())
        .bind(item.end_date.as_ref().map(format_timestamp))
        .bind(format_timestamp(&item.created_at))
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    async fn get_by_id(&self, id: &str) -> WorkStoreResult<Option<WorkItem>> {
        let row: Option<WorkRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, title, description, status, end_date, created_at
            FROM works
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(WorkItem::try_from).transpose()
    }

    async fn update_by_id(
        &self,
        id: &str,
        patch: &WorkPatch,
    ) -> WorkStoreResult<Option<WorkItem>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE works SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                status = COALESCE(?, status),
                end_date = COALESCE(?, end_date)
            WHERE id = ?
            "#,
        )
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.end_date.as_ref().map(format_timestamp))
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let row: Option<WorkRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, title, description, status, end_date, created_at
            FROM works
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        row.map(WorkItem::try_from).transpose()
    }

    async fn delete_by_id(&self, id: &str) -> WorkStoreResult<bool> {
        let result = sqlx::query("DELETE FROM works WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn store_with_users(users: &[&str]) -> SqliteWorkStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query("CREATE TABLE users (id TEXT PRIMARY KEY, created_at TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        for user in users {
            sqlx::query("INSERT INTO users (id, created_at) VALUES (?, ?)")
                .bind(user)
                .bind(Utc::now().to_rfc3339())
                .execute(&pool)
                .await
                .unwrap();
        }

        let store = SqliteWorkStore::new(pool);
        store.init().await.unwrap();
        store
    }

    fn item(owner: &str, title: &str, created_at: DateTime<Utc>) -> WorkItem {
        WorkItem::new(UserId::new(owner), title, WorkStatus::Backlog, created_at)
            .with_description("desc")
    }

    #[tokio::test]
    async fn test_create_and_list_round_trip() {
        let store = store_with_users(&["alice", "bob"]).await;
        let now = Utc::now();
        let deadline = "2025-06-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();

        let first = store
            .create(item("alice", "first", now).with_end_date(deadline))
            .await
            .unwrap();
        store
            .create(item("bob", "other", now + Duration::milliseconds(1)))
            .await
            .unwrap();
        let second = store
            .create(item("alice", "second", now + Duration::milliseconds(2)))
            .await
            .unwrap();

        let listed = store.list_by_owner(&UserId::new("alice")).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[0].end_date, Some(deadline));
        assert_eq!(listed[1].id, second.id);
        assert!(listed.iter().all(|i| i.owner_id.as_str() == "alice"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = store_with_users(&["alice"]).await;
        let created = store.create(item("alice", "t", Utc::now())).await.unwrap();

        let patch = WorkPatch {
            title: Some("renamed".to_string()),
            status: Some(WorkStatus::InProgress),
            ..WorkPatch::default()
        };
        let updated = store
            .update_by_id(&created.id, &patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.status, WorkStatus::InProgress);
        assert_eq!(updated.description.as_deref(), Some("desc"));

        let empty = store
            .update_by_id(&created.id, &WorkPatch::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(empty, updated);

        assert!(store.delete_by_id(&created.id).await.unwrap());
        assert!(!store.delete_by_id(&created.id).await.unwrap());
        assert!(
            store
                .update_by_id(&created.id, &WorkPatch::status(WorkStatus::Done))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_unknown_owner_rejected_by_foreign_key() {
        let store = store_with_users(&["alice"]).await;
        let result = store.create(item("ghost", "t", Utc::now())).await;
        assert!(matches!(result, Err(WorkStoreError::Database(_))));
    }

    #[tokio::test]
    async fn test_owner_removal_cascades() {
        let store = store_with_users(&["alice"]).await;
        store.create(item("alice", "t", Utc::now())).await.unwrap();

        sqlx::query("DELETE FROM users WHERE id = 'alice'")
            .execute(&store.pool)
            .await
            .unwrap();

        let listed = store.list_by_owner(&UserId::new("alice")).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_status_constraint_enforced() {
        let store = store_with_users(&["alice"]).await;
        let result = sqlx::query(
            "INSERT INTO works (id, owner_id, title, status, created_at) VALUES ('x', 'alice', 't', 'archived', '2025-01-01T00:00:00Z')",
        )
        .execute(&store.pool)
        .await;
        assert!(result.is_err());
    }
}
