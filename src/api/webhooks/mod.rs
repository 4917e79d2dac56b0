//! Webhook endpoints for channel integrations

use std::sync::Arc;

use axum::{Router, routing::post};

use super::ApiState;

pub mod telegram;

/// Build webhooks router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/{secret}", post(telegram::handle_update))
        .with_state(state)
}
