//! Telegram channel adapter
//!
//! Receives updates through the webhook route and talks to the Bot API
//! for file resolution, downloads and replies.

mod api;
pub mod types;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use super::{BotApi, OutgoingDocument, RemoteFile};
use crate::config::TelegramConfig;
use crate::{Error, Result};

/// Telegram channel adapter
pub struct TelegramChannel {
    token: SecretString,
    api_base: String,
    client: Client,
}

impl TelegramChannel {
    /// Create a Telegram channel from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            token: SecretString::from(config.bot_token.expose_secret().to_string()),
            api_base: config.api_base.clone(),
            client,
        })
    }

    /// URL for a Bot API method
    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.token.expose_secret())
    }

    /// URL for downloading a file by its server-relative path
    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.api_base,
            self.token.expose_secret(),
            file_path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl BotApi for TelegramChannel {
    async fn get_file(&self, file_id: &str) -> Result<RemoteFile> {
        let file = self.get_file_info(file_id).await?;
        let path = file
            .file_path
            .ok_or_else(|| Error::Channel("Telegram getFile returned no file_path".to_string()))?;
        Ok(RemoteFile {
            path,
            size: file.file_size,
        })
    }

    async fn download_file(&self, file_path: &str, max_size: u64) -> Result<Vec<u8>> {
        self.download(file_path, max_size).await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_text(chat_id, text).await
    }

    async fn send_document(&self, chat_id: i64, document: OutgoingDocument) -> Result<()> {
        self.upload_document(chat_id, document).await
    }
}
