use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use khrua_api::{
    auth,
    config::AppConfig,
    db,
    events::{self, Broadcaster, EventSender},
    handlers::AppServices,
    AppState,
};

const TEST_JWT_SECRET: &str = "khrua_test_secret_key_for_testing_purposes_only";

/// Helper harness: application state backed by a throwaway SQLite database,
/// with the event processor running.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
    db_path: PathBuf,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_path = std::env::temp_dir().join(format!("khrua-test-{}.db", Uuid::new_v4()));

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_JWT_SECRET,
            "127.0.0.1",
            18_080,
            "test",
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.upload_dir = std::env::temp_dir()
            .join(format!("khrua-uploads-{}", Uuid::new_v4()))
            .to_string_lossy()
            .into_owned();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let broadcaster = Arc::new(Broadcaster::new(16));
        let event_task = tokio::spawn(events::process_events(event_rx, broadcaster.clone()));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()));

        let state = AppState {
            db: db_arc,
            config: cfg.clone(),
            event_sender,
            broadcaster,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", khrua_api::api_v1_routes())
            .with_state(state.clone());

        let token = auth::issue_admin_token(&cfg.jwt_secret, "test-admin", 3600)
            .expect("failed to issue test token");

        Self {
            router,
            state,
            token,
            db_path,
            _event_task: event_task,
        }
    }

    /// Issue an unauthenticated request against the router.
    pub async fn request(&self, method: Method, uri: &str, json: Option<Value>) -> Response {
        self.send(method, uri, json, None).await
    }

    /// Issue a request carrying the admin bearer token.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        json: Option<Value>,
    ) -> Response {
        self.send(method, uri, json, Some(self.token.clone())).await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        json: Option<Value>,
        token: Option<String>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let request = match json {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", self.db_path.display(), suffix));
        }
    }
}

/// Collects a response body into JSON.
pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Asserts a status code, printing the body when it mismatches.
pub async fn assert_status(response: Response, expected: StatusCode) -> Value {
    let status = response.status();
    let json = response_json(response).await;
    assert_eq!(status, expected, "unexpected status, body: {}", json);
    json
}
