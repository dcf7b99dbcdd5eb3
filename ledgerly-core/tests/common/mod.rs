//! Shared test utilities for ledgerly-core integration tests
//!
//! Spawns an in-process stand-in for the backend's `/auth` and
//! `/notifications` routes.
//!
//! Note: Some helpers may appear unused because each test file compiles this
//! module independently.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// How the fake backend answers `/auth/refresh`
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshBehavior {
    Renew,
    ServerError,
    Unauthorized,
}

/// Recorded requests and scripted state of the fake backend
pub struct FakeBackend {
    pub password: String,
    pub refresh: Mutex<RefreshBehavior>,
    /// Lifetime of tokens issued by login and refresh
    pub token_lifetime_secs: i64,
    pub notifications: Mutex<Vec<Value>>,
    /// `Authorization` header of every request, in arrival order
    pub authorizations: Mutex<Vec<Option<String>>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            password: "correct horse".to_string(),
            refresh: Mutex::new(RefreshBehavior::Renew),
            token_lifetime_secs: 3600,
            notifications: Mutex::new(Vec::new()),
            authorizations: Mutex::new(Vec::new()),
        }
    }
}

#[allow(dead_code)]
impl FakeBackend {
    pub fn set_refresh(&self, behavior: RefreshBehavior) {
        *self.refresh.lock().unwrap() = behavior;
    }

    /// Prepend a notification so listings stay newest first
    pub fn push_notification(&self, id: u64, title: &str) {
        self.notifications.lock().unwrap().insert(
            0,
            json!({
                "id": id,
                "title": title,
                "message": format!("{} body", title),
                "type": "info",
                "is_read": false,
                "created_at": "2024-03-01T09:30:15.123456",
            }),
        );
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.authorizations.lock().unwrap().last().cloned().flatten()
    }

    fn record(&self, headers: &HeaderMap) {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.authorizations.lock().unwrap().push(value);
    }

    fn issue_token(&self) -> String {
        let now = Utc::now().timestamp();
        token_with_claims(json!({
            "user_id": 7,
            "iat": now,
            "exp": now + self.token_lifetime_secs,
        }))
    }
}

/// Sign `claims` the way the backend does
pub fn token_with_claims(claims: Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"backend-secret"),
    )
    .unwrap()
}

/// Token expiring `secs` from now
#[allow(dead_code)]
pub fn token_expiring_in(secs: i64) -> String {
    token_with_claims(json!({ "user_id": 7, "exp": Utc::now().timestamp() + secs }))
}

/// Spawns the fake backend, returns its state and base URL
pub async fn spawn_backend() -> (Arc<FakeBackend>, String) {
    spawn_backend_with(FakeBackend::default()).await
}

/// Spawns a fake backend with custom state
pub async fn spawn_backend_with(backend: FakeBackend) -> (Arc<FakeBackend>, String) {
    let state = Arc::new(backend);
    let router = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/notifications/", get(list_notifications))
        .route("/notifications/read-all", put(mark_all_read))
        .route("/notifications/clear-all", delete(clear_all))
        .route("/notifications/:id/read", put(mark_read))
        .with_state(Arc::clone(&state));

    let addr = spawn_router(router).await;
    (state, format!("http://{}", addr))
}

async fn spawn_router(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    addr
}

type Shared = State<Arc<FakeBackend>>;

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
    #[allow(dead_code)]
    remember: bool,
}

async fn login(State(backend): Shared, headers: HeaderMap, Json(body): Json<LoginBody>) -> Response {
    backend.record(&headers);
    if body.email.is_empty() || body.password != backend.password {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect email or password");
    }
    Json(json!({ "access_token": backend.issue_token(), "token_type": "bearer" })).into_response()
}

async fn refresh(State(backend): Shared, headers: HeaderMap) -> Response {
    backend.record(&headers);
    let behavior = *backend.refresh.lock().unwrap();
    match behavior {
        RefreshBehavior::Renew => {
            Json(json!({ "access_token": backend.issue_token() })).into_response()
        }
        RefreshBehavior::ServerError => {
            detail(StatusCode::INTERNAL_SERVER_ERROR, "Token refresh failed")
        }
        RefreshBehavior::Unauthorized => detail(StatusCode::UNAUTHORIZED, "Session expired"),
    }
}

#[derive(Deserialize)]
struct ListParams {
    limit: Option<usize>,
}

async fn list_notifications(
    State(backend): Shared,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Json<Vec<Value>> {
    backend.record(&headers);
    let limit = params.limit.unwrap_or(20);
    let notifications = backend.notifications.lock().unwrap();
    Json(notifications.iter().take(limit).cloned().collect())
}

async fn mark_read(State(backend): Shared, headers: HeaderMap, Path(id): Path<u64>) -> Response {
    backend.record(&headers);
    let mut notifications = backend.notifications.lock().unwrap();
    match notifications.iter_mut().find(|n| n["id"] == id) {
        Some(notification) => {
            notification["is_read"] = Value::Bool(true);
            Json(json!({ "status": "success" })).into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Notification not found"),
    }
}

async fn mark_all_read(State(backend): Shared, headers: HeaderMap) -> Json<Value> {
    backend.record(&headers);
    for notification in backend.notifications.lock().unwrap().iter_mut() {
        notification["is_read"] = Value::Bool(true);
    }
    Json(json!({ "status": "success" }))
}

async fn clear_all(State(backend): Shared, headers: HeaderMap) -> Json<Value> {
    backend.record(&headers);
    backend.notifications.lock().unwrap().clear();
    Json(json!({ "status": "cleared" }))
}
