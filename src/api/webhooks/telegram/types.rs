//! Telegram webhook types

use serde::{Deserialize, Serialize};

/// Telegram Update object (simplified)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

/// Telegram Message object (simplified)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: TelegramChat,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    /// Document/file attachment
    #[serde(default)]
    pub document: Option<TelegramDocument>,
}

/// Telegram document
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramDocument {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// Telegram Chat object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramChat {
    pub id: i64,
}

/// Telegram User object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub username: Option<String>,
}

impl TelegramUser {
    /// Human-readable label for logs
    #[must_use]
    pub fn label(&self) -> String {
        self.username
            .as_ref()
            .map_or_else(|| format!("ID:{}", self.id), |u| format!("@{u}"))
    }
}
