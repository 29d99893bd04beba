//! Drives a served worktrack API with the kanban client.

use std::net::SocketAddr;
use std::sync::Arc;

use auth::{SessionStore, SqliteSessionStore};
use chrono::Duration;
use entities::{UserId, WorkStatus};
use kanban_sync::{
    ClientError, DragEnd, DropLocation, HttpWorkClient, IgnoreReason, KanbanSync, SyncOutcome,
    WorkApi,
};
use sqlx::sqlite::SqlitePoolOptions;
use work_protocol::{CreateWork, WorkMutation};
use work_store::SqliteWorkStore;
use worktrack_server::{config::Config, create_app, create_state};

struct Server {
    addr: SocketAddr,
    sessions: SqliteSessionStore,
}

impl Server {
    async fn start() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let sessions = SqliteSessionStore::new(pool.clone());
        sessions.init().await.unwrap();
        let works = SqliteWorkStore::new(pool);
        works.init().await.unwrap();

        let state = create_state(
            Config::default(),
            Arc::new(works),
            Arc::new(sessions.clone()),
        );
        let app = create_app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, sessions }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    async fn sign_in(&self, user: &str) -> String {
        let user = UserId::new(user);
        self.sessions.ensure_user(&user, None, None).await.unwrap();
        self.sessions.issue(&user, Duration::hours(1)).await.unwrap()
    }
}

fn form(title: &str, status: &str) -> WorkMutation {
    WorkMutation {
        title: Some(title.to_string()),
        description: Some("from the board".to_string()),
        status: Some(status.to_string()),
        end_date: None,
    }
}

fn drag(id: &str, from: WorkStatus, to: WorkStatus) -> DragEnd {
    DragEnd::new(id, DropLocation::new(from, 0), DropLocation::new(to, 0))
}

#[tokio::test]
async fn test_board_round_trip() {
    let server = Server::start().await;
    let token = server.sign_in("alice").await;

    let client = HttpWorkClient::new(&server.url()).unwrap().with_bearer(token);
    client.health_check().await.unwrap();

    let mut sync = KanbanSync::new(client);
    sync.refresh().await.unwrap();
    assert!(sync.board().items().is_empty());

    let created = sync.create_item(&form("Pay bills", "todo")).await.unwrap();
    assert_eq!(sync.board().items().len(), 1);

    let outcome = sync
        .drop_item(drag(&created.id, WorkStatus::Todo, WorkStatus::InProgress))
        .await;
    assert!(matches!(outcome, SyncOutcome::Applied(_)));
    assert_eq!(
        sync.board().get(&created.id).unwrap().status,
        WorkStatus::InProgress
    );

    let outcome = sync
        .drop_item(drag(&created.id, WorkStatus::InProgress, WorkStatus::Done))
        .await;
    assert!(matches!(outcome, SyncOutcome::Applied(_)));

    // Done is terminal on the board
    let outcome = sync
        .drop_item(drag(&created.id, WorkStatus::Done, WorkStatus::Todo))
        .await;
    assert!(matches!(outcome, SyncOutcome::Ignored(IgnoreReason::Terminal)));
    assert_eq!(sync.board().get(&created.id).unwrap().status, WorkStatus::Done);

    sync.delete_item(&created.id).await.unwrap();
    assert!(sync.board().items().is_empty());
    assert!(!sync.is_stale());
}

#[tokio::test]
async fn test_cookie_client_sees_only_own_items() {
    let server = Server::start().await;
    let alice = server.sign_in("alice").await;
    let bob = server.sign_in("bob").await;

    let alice_client = HttpWorkClient::new(&server.url()).unwrap().with_bearer(alice);
    let bob_client = HttpWorkClient::new(&server.url())
        .unwrap()
        .with_cookie(auth::DEFAULT_SESSION_COOKIE, bob);

    let work = CreateWork {
        title: "Alice only".to_string(),
        description: "private".to_string(),
        status: WorkStatus::Backlog,
        end_date: None,
    };
    alice_client.create(&work).await.unwrap();

    assert_eq!(alice_client.list().await.unwrap().len(), 1);
    assert!(bob_client.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_error_mapping() {
    let server = Server::start().await;
    let token = server.sign_in("alice").await;

    let anonymous = HttpWorkClient::new(&server.url()).unwrap();
    assert!(matches!(anonymous.list().await, Err(ClientError::Unauthorized)));

    let client = HttpWorkClient::new(&server.url()).unwrap().with_bearer(token);
    let invalid = CreateWork {
        title: String::new(),
        description: "d".to_string(),
        status: WorkStatus::Todo,
        end_date: None,
    };
    match client.create(&invalid).await {
        Err(ClientError::Validation(errors)) => assert!(errors.has_field("title")),
        other => panic!("expected validation error, got {other:?}"),
    }

    let patch = work_protocol::WorkPatch::status(WorkStatus::Done);
    assert!(matches!(
        client.update("missing", &patch).await,
        Err(ClientError::NotFound)
    ));
    client.delete("missing").await.unwrap();
}
