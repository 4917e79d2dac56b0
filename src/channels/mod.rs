//! Messaging channel adapters
//!
//! The update handler talks to the messaging platform only through the
//! `BotApi` trait, so tests can substitute a recording mock.

mod telegram;

use async_trait::async_trait;

pub use telegram::TelegramChannel;
pub use telegram::types::{TelegramFile, TelegramResponse};

use crate::Result;

/// A document to upload as a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingDocument {
    /// File name shown to the recipient
    pub file_name: String,

    /// Raw file contents
    pub data: Vec<u8>,

    /// Optional caption
    pub caption: Option<String>,
}

/// A file resolved on the platform, ready to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Server-relative download path
    pub path: String,

    /// Size reported by the platform, if any
    pub size: Option<u64>,
}

/// Outbound Bot API operations used by the update handler
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Resolve a file identifier to its download path and reported size
    async fn get_file(&self, file_id: &str) -> Result<RemoteFile>;

    /// Download the raw bytes behind a path returned by `get_file`
    ///
    /// Never holds more than `max_size` bytes: a longer body fails with
    /// [`crate::Error::TooLarge`].
    async fn download_file(&self, file_path: &str, max_size: u64) -> Result<Vec<u8>>;

    /// Send a plain text message
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Upload a document
    async fn send_document(&self, chat_id: i64, document: OutgoingDocument) -> Result<()>;
}
