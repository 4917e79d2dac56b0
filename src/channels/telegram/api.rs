//! Raw Telegram Bot API calls

use reqwest::RequestBuilder;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use super::types::{
    BotUser, GetFileRequest, SendMessageRequest, SetWebhookRequest, TelegramFile,
    TelegramResponse,
};
use crate::channels::OutgoingDocument;
use crate::{Error, Result};

impl super::TelegramChannel {
    /// Send a prepared Bot API request and unwrap the response envelope
    ///
    /// Transport errors are stripped of their URL, since it carries the token.
    async fn execute<T: DeserializeOwned>(&self, method: &str, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Telegram {method} error: {}", e.without_url())))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::Channel(format!("Telegram {method} response read error: {}", e.without_url()))
        })?;

        let parsed: TelegramResponse<T> = serde_json::from_str(&body).map_err(|e| {
            Error::Channel(format!("Telegram {method} parse error ({status}): {e}"))
        })?;

        parsed
            .into_result()
            .map_err(|description| Error::Channel(format!("Telegram {method} error: {status} - {description}")))
    }

    /// Fetch file metadata via `getFile`
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub async fn get_file_info(&self, file_id: &str) -> Result<TelegramFile> {
        let request = self
            .client
            .post(self.method_url("getFile"))
            .json(&GetFileRequest { file_id });

        let file: TelegramFile = self.execute("getFile", request).await?;
        tracing::debug!(file_id, size = ?file.file_size, "Telegram file resolved");
        Ok(file)
    }

    /// Download a file by the path returned from `getFile`
    ///
    /// The body is read chunk by chunk and abandoned as soon as it is known
    /// to exceed `max_size`, either from `Content-Length` or from the bytes
    /// received so far.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooLarge`] past `max_size`, or a channel error if the
    /// download fails or returns a non-success status
    pub async fn download(&self, file_path: &str, max_size: u64) -> Result<Vec<u8>> {
        let mut response = self
            .client
            .get(self.file_url(file_path))
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Telegram file download error: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Channel(format!(
                "Telegram file download error: {status}"
            )));
        }

        if response.content_length().is_some_and(|len| len > max_size) {
            tracing::debug!(file_path, length = ?response.content_length(), "Telegram file over limit");
            return Err(Error::TooLarge { limit: max_size });
        }

        let mut data = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            Error::Channel(format!("Telegram file download read error: {}", e.without_url()))
        })? {
            if (data.len() + chunk.len()) as u64 > max_size {
                tracing::debug!(file_path, received = data.len() + chunk.len(), "Telegram file over limit");
                return Err(Error::TooLarge { limit: max_size });
            }
            data.extend_from_slice(&chunk);
        }

        tracing::debug!(file_path, bytes = data.len(), "Telegram file downloaded");
        Ok(data)
    }

    /// Send a plain-text message to a chat
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        let request = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessageRequest {
                chat_id,
                text,
                disable_web_page_preview: Some(true),
            });

        let _: serde_json::Value = self.execute("sendMessage", request).await?;
        tracing::debug!(chat_id, "Telegram message sent");
        Ok(())
    }

    /// Upload a document to a chat as multipart form data
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub async fn upload_document(&self, chat_id: i64, document: OutgoingDocument) -> Result<()> {
        let size = document.data.len();
        let part = Part::bytes(document.data)
            .file_name(document.file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| Error::Channel(format!("Telegram sendDocument error: {e}")))?;

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);
        if let Some(caption) = document.caption {
            form = form.text("caption", caption);
        }

        let request = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form);

        let _: serde_json::Value = self.execute("sendDocument", request).await?;
        tracing::debug!(chat_id, bytes = size, "Telegram document sent");
        Ok(())
    }

    /// Set webhook URL for receiving updates
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<()> {
        let request = self
            .client
            .post(self.method_url("setWebhook"))
            .json(&SetWebhookRequest {
                url,
                allowed_updates: Some(vec!["message"]),
                secret_token,
            });

        let _: bool = self.execute("setWebhook", request).await?;
        tracing::info!("Telegram webhook set");
        Ok(())
    }

    /// Delete the registered webhook
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub async fn delete_webhook(&self) -> Result<()> {
        let request = self.client.post(self.method_url("deleteWebhook"));

        let _: bool = self.execute("deleteWebhook", request).await?;
        tracing::info!("Telegram webhook deleted");
        Ok(())
    }

    /// Validate the bot token by calling `getMe`
    ///
    /// Returns the bot's username when it has one.
    ///
    /// # Errors
    ///
    /// Returns error if the token is invalid
    pub async fn get_me(&self) -> Result<Option<String>> {
        let request = self.client.get(self.method_url("getMe"));

        let me: BotUser = self
            .execute("getMe", request)
            .await
            .map_err(|e| Error::Channel(format!("Invalid Telegram bot token: {e}")))?;

        tracing::info!(bot_id = me.id, username = ?me.username, "Telegram token valid");
        Ok(me.username)
    }
}
