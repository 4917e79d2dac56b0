//! Update handler: one inbound update in, at most one reply out
//!
//! Decision order for a message:
//!
//! 1. no document: welcome text
//! 2. declared size over the limit: "too large", nothing is downloaded
//! 3. size from `getFile` over the limit, or the download runs past it:
//!    "too large", the transfer is abandoned
//! 4. `getFile` or download fails: "failed to retrieve"
//! 5. archive cannot be opened: "failed to open"
//! 6. no file with the target extension: no reply
//! 7. extracted file over the limit: "extracted too large"
//! 8. otherwise the document is uploaded with a caption
//!
//! Failures never propagate to the webhook caller; they end up as a reply
//! and a log line.

pub mod replies;

use std::sync::Arc;

use tracing::Instrument;

use crate::api::webhooks::telegram::types::{TelegramUpdate, TelegramUser};
use crate::archive::{self, Extraction, SelectedDocument};
use crate::channels::{BotApi, OutgoingDocument};
use crate::config::ExtractConfig;
use crate::{Error, Result, fb2};

/// Which branch of the decision table an update took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Update without a message, or a message from a bot
    Ignored,
    /// No attachment; welcome text sent
    Welcome,
    /// Attachment over the size limit (declared or downloaded)
    FileTooLarge,
    /// `getFile` or the download failed
    DownloadFailed,
    /// Downloaded bytes are not a readable archive
    ArchiveInvalid,
    /// Archive holds no file with the target extension
    NoMatch,
    /// Matching file decompressed beyond the limit
    ExtractedTooLarge,
    /// Document uploaded
    Delivered,
}

impl Outcome {
    /// Stable name for logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Welcome => "welcome",
            Self::FileTooLarge => "file_too_large",
            Self::DownloadFailed => "download_failed",
            Self::ArchiveInvalid => "archive_invalid",
            Self::NoMatch => "no_match",
            Self::ExtractedTooLarge => "extracted_too_large",
            Self::Delivered => "delivered",
        }
    }
}

/// Processes inbound updates against the Bot API
pub struct UpdateHandler {
    bot: Arc<dyn BotApi>,
    config: ExtractConfig,
}

impl UpdateHandler {
    /// Create a handler with its outbound API and settings
    #[must_use]
    pub fn new(bot: Arc<dyn BotApi>, config: ExtractConfig) -> Self {
        Self { bot, config }
    }

    /// Handler settings
    #[must_use]
    pub const fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Handle one update
    pub async fn handle(&self, update: TelegramUpdate) -> Outcome {
        let invocation = uuid::Uuid::new_v4();
        let span = tracing::info_span!("update", update_id = update.update_id, %invocation);

        async {
            let outcome = self.process(update).await;
            tracing::info!(outcome = outcome.as_str(), "update handled");
            outcome
        }
        .instrument(span)
        .await
    }

    async fn process(&self, update: TelegramUpdate) -> Outcome {
        let Some(message) = update.message else {
            tracing::debug!("update carries no message");
            return Outcome::Ignored;
        };

        if message.from.as_ref().is_some_and(|u| u.is_bot) {
            return Outcome::Ignored;
        }

        let chat_id = message.chat.id;
        let Some(document) = message.document else {
            let text = replies::welcome(&self.config.target_extension, self.config.max_file_size);
            self.reply(chat_id, &text).await;
            return Outcome::Welcome;
        };

        let sender = message
            .from
            .as_ref()
            .map_or_else(|| "unknown".to_string(), TelegramUser::label);
        tracing::info!(
            chat_id,
            message_id = message.message_id,
            file_id = %document.file_id,
            file_name = ?document.file_name,
            size = ?document.file_size,
            sender = %sender,
            "processing document"
        );

        if document
            .file_size
            .is_some_and(|size| size > self.config.max_file_size)
        {
            self.reply(chat_id, &replies::file_too_large(self.config.max_file_size))
                .await;
            return Outcome::FileTooLarge;
        }

        let data = match self.fetch(&document.file_id).await {
            Ok(data) => data,
            Err(Error::TooLarge { limit }) => {
                tracing::info!(chat_id, file_id = %document.file_id, limit, "file over limit");
                self.reply(chat_id, &replies::file_too_large(self.config.max_file_size))
                    .await;
                return Outcome::FileTooLarge;
            }
            Err(e) => {
                tracing::error!(chat_id, file_id = %document.file_id, error = %e, "file download failed");
                self.reply(chat_id, replies::RETRIEVE_FAILED).await;
                return Outcome::DownloadFailed;
            }
        };

        let config = self.config.clone();
        let extraction = tokio::task::spawn_blocking(move || archive::extract_document(&data, &config))
            .await
            .unwrap_or_else(|e| Err(Error::Io(std::io::Error::other(e))));

        match extraction {
            Ok(Extraction::Found(selected)) => {
                self.deliver(chat_id, selected).await;
                Outcome::Delivered
            }
            Ok(Extraction::NoMatch) => {
                tracing::info!(
                    chat_id,
                    extension = %self.config.target_extension,
                    "no matching document in archive"
                );
                Outcome::NoMatch
            }
            Ok(Extraction::TooLarge { file_name, size }) => {
                tracing::info!(chat_id, file_name = %file_name, size, "extracted document too large");
                self.reply(chat_id, &replies::extracted_too_large(self.config.max_file_size))
                    .await;
                Outcome::ExtractedTooLarge
            }
            Err(Error::Archive(reason)) => {
                tracing::warn!(chat_id, reason = %reason, "invalid archive");
                self.reply(chat_id, replies::ARCHIVE_INVALID).await;
                Outcome::ArchiveInvalid
            }
            Err(e) => {
                tracing::error!(chat_id, error = %e, "archive processing failed");
                self.reply(chat_id, replies::ARCHIVE_INVALID).await;
                Outcome::ArchiveInvalid
            }
        }
    }

    /// Resolve and download an attachment, bounded by the size limit
    ///
    /// Declared sizes are optional in the Bot API, so the size `getFile`
    /// reports is checked again before anything is transferred.
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>> {
        let limit = self.config.max_file_size;
        let file = self.bot.get_file(file_id).await?;

        if file.size.is_some_and(|size| size > limit) {
            return Err(Error::TooLarge { limit });
        }

        self.bot.download_file(&file.path, limit).await
    }

    /// Upload the selected document back to the chat
    async fn deliver(&self, chat_id: i64, selected: SelectedDocument) {
        let caption = self.caption_for(&selected);
        let size = selected.data.len();
        let document = OutgoingDocument {
            file_name: selected.file_name,
            data: selected.data,
            caption: Some(caption),
        };

        match self.bot.send_document(chat_id, document).await {
            Ok(()) => tracing::info!(chat_id, bytes = size, "document delivered"),
            Err(e) => tracing::error!(chat_id, error = %e, "failed to send document"),
        }
    }

    fn caption_for(&self, selected: &SelectedDocument) -> String {
        if !self.config.metadata_caption || self.config.target_extension != "fb2" {
            return replies::DOCUMENT_CAPTION.to_string();
        }

        match fb2::read_metadata(&selected.data) {
            Ok(metadata) => metadata
                .caption()
                .unwrap_or_else(|| replies::DOCUMENT_CAPTION.to_string()),
            Err(e) => {
                tracing::warn!(file_name = %selected.file_name, error = %e, "failed to read FB2 metadata");
                replies::DOCUMENT_CAPTION.to_string()
            }
        }
    }

    /// Send a text reply, logging failures
    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.bot.send_message(chat_id, text).await {
            tracing::error!(chat_id, error = %e, "failed to send reply");
        }
    }
}
