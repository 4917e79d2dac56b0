//! Telegram webhook handler

pub mod types;

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use url::Url;

use self::types::TelegramUpdate;
use crate::api::ApiState;
use crate::{Error, Result};

/// Header Telegram uses to echo the secret given to `setWebhook`
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Telegram webhook response
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub ok: bool,
}

fn respond(status: StatusCode, ok: bool) -> (StatusCode, Json<WebhookResponse>) {
    (status, Json(WebhookResponse { ok }))
}

/// Handle an incoming Telegram update at `POST /webhook/{secret}`
///
/// The update is processed before responding. Every authorized, well-formed
/// update gets `200 {"ok": true}`, whatever the processing outcome.
pub async fn handle_update(
    State(state): State<Arc<ApiState>>,
    Path(secret): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<WebhookResponse>) {
    if !constant_time_eq(secret.as_bytes(), state.path_secret.expose_secret().as_bytes()) {
        tracing::warn!("webhook path secret mismatch");
        return respond(StatusCode::NOT_FOUND, false);
    }

    if let Some(expected) = state.webhook_secret.as_ref() {
        let provided = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());

        let matches = provided.is_some_and(|provided| {
            constant_time_eq(provided.as_bytes(), expected.expose_secret().as_bytes())
        });
        if !matches {
            tracing::warn!("Telegram webhook secret mismatch");
            return respond(StatusCode::FORBIDDEN, false);
        }
    }

    let update: TelegramUpdate = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!(error = %e, "malformed Telegram update");
            return respond(StatusCode::BAD_REQUEST, false);
        }
    };

    tracing::debug!(update_id = update.update_id, "received Telegram update");
    state.handler.handle(update).await;

    respond(StatusCode::OK, true)
}

/// Constant-time byte comparison for secrets
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Public webhook URL for a deployment base URL and path secret
///
/// `https://bot.example.com/base` becomes
/// `https://bot.example.com/base/webhook/<secret>`.
///
/// # Errors
///
/// Returns error if `base` is not an absolute http(s) URL
pub fn webhook_url(base: &str, path_secret: &str) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| Error::Config(format!("invalid public URL '{base}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "public URL must use http or https, got '{}'",
            url.scheme()
        )));
    }

    url.path_segments_mut()
        .map_err(|()| Error::Config(format!("public URL '{base}' cannot be a base")))?
        .pop_if_empty()
        .push("webhook")
        .push(path_secret);

    Ok(url)
}
