use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::Server;
use crate::{metrics, payload::AlertmanagerPayload};

pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn metrics() -> String {
    metrics::gather_metrics()
}

/// Validates and enqueues an Alertmanager webhook payload.
///
/// Only `"firing"` groups reach the delivery queue; anything else is
/// acknowledged and discarded at this boundary. A full queue maps to 503 so
/// Alertmanager sees the overload.
pub async fn webhook(
    State(server): State<Arc<Server>>,
    headers: HeaderMap,
    Json(payload): Json<AlertmanagerPayload>,
) -> Response {
    if !authorized(server.webhook_token.as_deref(), &headers) {
        warn!("unauthorized webhook request");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    metrics::WEBHOOKS_RECEIVED_TOTAL.inc();

    if payload.status != "firing" {
        info!(status = %payload.status, "ignoring non-firing alert");
        return StatusCode::OK.into_response();
    }

    if !server.queue.enqueue(payload) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    StatusCode::OK.into_response()
}

/// Checks the bearer token when webhook authentication is configured.
fn authorized(webhook_token: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(token) = webhook_token else {
        return true;
    };
    headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .map(|value| value == format!("Bearer {token}"))
        .unwrap_or(false)
}
