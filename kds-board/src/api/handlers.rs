//! HTTP request handlers
//!
//! Request/response DTOs and the thin glue between routes and the engine.

use axum::{
    extract::{Path, State},
    response::sse::Sse,
    Json,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::api::AppState;
use crate::error::Result;
use crate::notifier::NotificationStatus;
use kds_common::orders::{Order, OrderStatus};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    active: Vec<Order>,
    completed: Vec<Order>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleChecklistRequest {
    key: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleChecklistResponse {
    key: String,
    checked: bool,
    /// Whether the order may now move to completed; absent when the order
    /// is not on the board
    can_complete: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationsRequest {
    enabled: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/orders — latest poll result
pub async fn get_orders(State(state): State<AppState>) -> Json<OrdersResponse> {
    Json(OrdersResponse {
        active: state.board.active_orders().await,
        completed: state.board.completed_orders().await,
    })
}

/// POST /api/orders/:id/status — gated transition
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    // Unknown tags bounce here with 400, before any remote call
    let new_status: OrderStatus = request.status.parse().map_err(crate::error::Error::from)?;
    let order = state.transition.transition(order_id, new_status).await?;
    Ok(Json(order))
}

/// POST /api/orders/:id/checklist — flip one item's prepared flag
pub async fn toggle_checklist(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(request): Json<ToggleChecklistRequest>,
) -> Result<Json<ToggleChecklistResponse>> {
    let checked = state.checklist.toggle(order_id, &request.key).await?;

    let can_complete = match state.board.find_order(order_id).await {
        Some(order) => Some(state.checklist.can_complete(&order).await?),
        None => None,
    };

    Ok(Json(ToggleChecklistResponse {
        key: request.key,
        checked,
        can_complete,
    }))
}

/// GET /api/notifications
pub async fn get_notifications(State(state): State<AppState>) -> Json<NotificationStatus> {
    Json(state.notifier.status().await)
}

/// POST /api/notifications — mute or unmute the alert loop
pub async fn set_notifications(
    State(state): State<AppState>,
    Json(request): Json<NotificationsRequest>,
) -> Result<Json<NotificationStatus>> {
    if request.enabled {
        state.notifier.unmute().await?;
    } else {
        state.notifier.mute().await?;
    }
    Ok(Json(state.notifier.status().await))
}

/// GET /api/events — SSE stream
pub async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<axum::response::sse::Event, Infallible>>> {
    crate::api::sse::event_stream(&state.events)
}
