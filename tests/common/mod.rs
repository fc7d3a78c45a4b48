#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use registry_auth::services::auth::ClaimsPayload;
use serde_json::json;

pub const FAKE_HEADER: &str = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9";

/// Serve `router` on an ephemeral port, returning its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });
    format!("http://{addr}")
}

/// In-memory stand-in for the identity API.
#[derive(Clone, Default)]
pub struct MockIdentity {
    /// token -> login
    pub users: Arc<Vec<(String, String)>>,
    /// (org, login) pairs that answer 204
    pub members: Arc<Vec<(String, String)>>,
    pub user_calls: Arc<AtomicUsize>,
    pub membership_calls: Arc<Mutex<Vec<String>>>,
}

impl MockIdentity {
    pub fn new(users: &[(&str, &str)], members: &[(&str, &str)]) -> Self {
        let owned = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect::<Vec<_>>()
        };
        Self {
            users: Arc::new(owned(users)),
            members: Arc::new(owned(members)),
            ..Self::default()
        }
    }

    pub fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    pub fn membership_calls(&self) -> Vec<String> {
        self.membership_calls.lock().expect("lock").clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/user", get(user))
            .route("/orgs/{org}/members/{login}", get(membership))
            .with_state(self.clone())
    }

    pub async fn spawn(&self) -> String {
        serve(self.router()).await
    }
}

fn token_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("token ")
        .map(str::to_owned)
}

async fn user(State(mock): State<MockIdentity>, headers: HeaderMap) -> Response {
    mock.user_calls.fetch_add(1, Ordering::SeqCst);

    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if accept != "application/vnd.github+json" {
        return StatusCode::NOT_ACCEPTABLE.into_response();
    }

    let login = token_of(&headers).and_then(|token| {
        mock.users
            .iter()
            .find(|(known, _)| *known == token)
            .map(|(_, login)| login.clone())
    });

    match login {
        Some(login) => Json(json!({ "login": login, "id": 12345, "type": "User" })).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Bad credentials" })),
        )
            .into_response(),
    }
}

async fn membership(
    State(mock): State<MockIdentity>,
    Path((org, login)): Path<(String, String)>,
) -> StatusCode {
    mock.membership_calls
        .lock()
        .expect("lock")
        .push(org.clone());

    if mock.members.iter().any(|(o, l)| *o == org && *l == login) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn claims(actor: &str, repository: &str, audience: &str, expires_in: i64) -> ClaimsPayload {
    let now = now();
    ClaimsPayload {
        subject: format!("repo:{repository}:ref:refs/heads/main"),
        audience: audience.to_string(),
        repository: repository.to_string(),
        actor: actor.to_string(),
        workflow_name: "CI".to_string(),
        r#ref: "refs/heads/main".to_string(),
        issued_at: now,
        expires_at: now + expires_in,
    }
}

/// header.payload.signature with a signature nobody checks.
pub fn unsigned_token(payload: &ClaimsPayload) -> String {
    format!(
        "{FAKE_HEADER}.{}.fake-signature",
        payload.to_segment().expect("encode claims")
    )
}

pub fn b64url(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}
