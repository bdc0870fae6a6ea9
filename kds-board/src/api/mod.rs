//! REST API for the counter dashboard
//!
//! Thin HTTP surface over the board engine: order lists, checklist toggles,
//! gated status transitions, notification controls, and the SSE event
//! stream the browser plays the alert sound from. Everything except the
//! session endpoints and the health check sits behind the session gate.

pub mod handlers;
pub mod session;
pub mod sse;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::checklist::ChecklistStore;
use crate::error::Error;
use crate::notifier::NotificationController;
use crate::poller::OrderPoller;
use crate::state::BoardState;
use crate::transition::TransitionService;
use kds_common::events::EventBus;
use session::SessionStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub board: BoardState,
    pub notifier: Arc<NotificationController>,
    pub transition: Arc<TransitionService>,
    pub checklist: ChecklistStore,
    pub poller: Arc<OrderPoller>,
    pub events: EventBus,
    pub sessions: SessionStore,
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/orders", get(handlers::get_orders))
        .route("/orders/:id/status", post(handlers::update_order_status))
        .route("/orders/:id/checklist", post(handlers::toggle_checklist))
        .route(
            "/notifications",
            get(handlers::get_notifications).post(handlers::set_notifications),
        )
        .route("/events", get(handlers::sse_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api",
            Router::new()
                .route("/login", post(session::login))
                .route("/logout", post(session::logout))
                .route("/session", get(session::session_status))
                .merge(protected),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "kds-board",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
        "last_poll": state.board.last_poll().await,
    }))
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::ChecklistIncomplete { .. } => StatusCode::CONFLICT,
            Error::Remote { .. } | Error::Transport(_) | Error::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
            Error::Database(_) | Error::Config(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
