//! Unzip Bot - Telegram webhook bot that extracts documents from ZIP archives
//!
//! A user sends a ZIP archive; the bot downloads it, extracts it into
//! per-request temporary storage, picks the first file with the target
//! extension (`.fb2` by default) and sends it back.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │   Telegram  ──POST /webhook/{secret}──►  api │
//! └──────────────────────┬───────────────────────┘
//!                        │
//! ┌──────────────────────▼───────────────────────┐
//! │   handler   │  archive  │  fb2 (captions)    │
//! └──────────────────────┬───────────────────────┘
//!                        │ BotApi
//! ┌──────────────────────▼───────────────────────┐
//! │   channels::TelegramChannel (Bot API)        │
//! └──────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod archive;
pub mod channels;
pub mod config;
pub mod error;
pub mod fb2;
pub mod handler;

pub use api::webhooks::telegram::types::{
    TelegramChat, TelegramDocument, TelegramMessage, TelegramUpdate, TelegramUser,
};
pub use api::{ApiServer, ApiState};
pub use channels::{BotApi, OutgoingDocument, RemoteFile, TelegramChannel};
pub use config::{Config, ExtractConfig, SelectionPolicy};
pub use error::{Error, Result};
pub use handler::{Outcome, UpdateHandler};
