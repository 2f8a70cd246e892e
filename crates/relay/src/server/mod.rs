mod routes;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::{config::Config, queue::DeliveryQueue};

/// Maximum accepted webhook body size.
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub struct Server {
    queue: Arc<DeliveryQueue>,
    webhook_token: Option<String>,
}

impl Server {
    pub fn new(config: &Config, queue: Arc<DeliveryQueue>) -> Self {
        Self {
            queue,
            webhook_token: config.server.webhook_token.clone(),
        }
    }

    pub fn build_router(self) -> Router {
        let state = Arc::new(self);

        Router::new()
            .route("/healthz", get(routes::healthz))
            .route("/webhook", post(routes::webhook))
            .route("/metrics", get(routes::metrics))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
