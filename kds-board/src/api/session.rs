//! Dashboard session gate
//!
//! Cookie-based login with the station password from configuration. When no
//! password is configured the gate is disabled and every request passes.
//!
//! Tokens live in memory only; restarting the service logs every client out.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use rand::{distributions::Alphanumeric, Rng};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::AppState;

const SESSION_COOKIE: &str = "kds_session";
const TOKEN_LEN: usize = 32;

/// Active session tokens for this process
#[derive(Clone, Default)]
pub struct SessionStore {
    password: Option<String>,
    tokens: Arc<RwLock<HashSet<String>>>,
}

impl SessionStore {
    pub fn new(password: Option<String>) -> Self {
        Self {
            password,
            tokens: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Whether the gate is active at all
    pub fn gate_enabled(&self) -> bool {
        self.password.is_some()
    }

    pub async fn is_authenticated(&self, token: Option<&str>) -> bool {
        if !self.gate_enabled() {
            return true;
        }
        match token {
            Some(token) => self.tokens.read().await.contains(token),
            None => false,
        }
    }

    async fn open_session(&self) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        self.tokens.write().await.insert(token.clone());
        token
    }

    async fn close_session(&self, token: &str) {
        self.tokens.write().await.remove(token);
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    password: String,
}

/// Extract the session token from the Cookie header
fn session_token(request: &Request) -> Option<String> {
    let cookies = request
        .headers()
        .get(header::COOKIE)?
        .to_str()
        .ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Middleware rejecting unauthenticated requests to protected routes
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let token = session_token(&request);
    if state.sessions.is_authenticated(token.as_deref()).await {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "not authenticated" })),
        )
            .into_response()
    }
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Response {
    match &state.sessions.password {
        None => Json(json!({ "authenticated": true })).into_response(),
        Some(expected) if *expected == request.password => {
            let token = state.sessions.open_session().await;
            info!("Dashboard session opened");
            (
                [(
                    header::SET_COOKIE,
                    format!(
                        "{}={}; HttpOnly; Path=/; SameSite=Lax",
                        SESSION_COOKIE, token
                    ),
                )],
                Json(json!({ "authenticated": true })),
            )
                .into_response()
        }
        Some(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "wrong password" })),
        )
            .into_response(),
    }
}

/// POST /api/logout
pub async fn logout(State(state): State<AppState>, request: Request) -> Response {
    if let Some(token) = session_token(&request) {
        state.sessions.close_session(&token).await;
    }
    (
        [(
            header::SET_COOKIE,
            format!("{}=; HttpOnly; Path=/; Max-Age=0", SESSION_COOKIE),
        )],
        Json(json!({ "authenticated": false })),
    )
        .into_response()
}

/// GET /api/session — consulted by the dashboard at mount
pub async fn session_status(State(state): State<AppState>, request: Request) -> Response {
    let token = session_token(&request);
    let authenticated = state.sessions.is_authenticated(token.as_deref()).await;
    Json(json!({ "authenticated": authenticated })).into_response()
}
