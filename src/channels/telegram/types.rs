//! Telegram Bot API request/response types

use serde::{Deserialize, Serialize};

/// Telegram sendMessage request
#[derive(Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
}

/// Telegram setWebhook request
#[derive(Serialize)]
pub(crate) struct SetWebhookRequest<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<&'a str>,
}

/// Telegram getFile request
#[derive(Serialize)]
pub(crate) struct GetFileRequest<'a> {
    pub file_id: &'a str,
}

/// File metadata from Telegram getFile response
#[derive(Debug, Deserialize)]
pub struct TelegramFile {
    pub file_id: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    pub file_path: Option<String>,
}

/// Bot identity from getMe
#[derive(Debug, Deserialize)]
pub(crate) struct BotUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// Telegram API response wrapper
#[derive(Debug, Deserialize)]
pub struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

impl<T> TelegramResponse<T> {
    /// Convert into the result payload, or the API's error description
    ///
    /// # Errors
    ///
    /// Returns the description when `ok` is false or the result is missing
    pub fn into_result(self) -> std::result::Result<T, String> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(self
                .description
                .unwrap_or_else(|| "no description".to_string())),
        }
    }
}
