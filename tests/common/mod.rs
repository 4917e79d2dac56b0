//! Shared test utilities
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use unzip_bot::{
    BotApi, Error, ExtractConfig, OutgoingDocument, RemoteFile, SelectionPolicy, TelegramUpdate,
};
use zip::write::SimpleFileOptions;

/// Something the mock bot was asked to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Message { chat_id: i64, text: String },
    Document { chat_id: i64, document: OutgoingDocument },
}

/// Recording `BotApi` with canned downloads
#[derive(Default)]
pub struct MockBot {
    files: HashMap<String, Vec<u8>>,
    reported_sizes: HashMap<String, u64>,
    hide_sizes: bool,
    fail_download: bool,
    fail_send: bool,
    get_file_calls: AtomicUsize,
    download_calls: AtomicUsize,
    sent: Mutex<Vec<Sent>>,
}

impl MockBot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `data` for `file_id`
    pub fn with_file(mut self, file_id: &str, data: Vec<u8>) -> Self {
        self.files.insert(file_id.to_string(), data);
        self
    }

    /// Report `size` from `get_file` for `file_id` instead of the real length
    pub fn reporting_size(mut self, file_id: &str, size: u64) -> Self {
        self.reported_sizes.insert(file_id.to_string(), size);
        self
    }

    /// Resolve files without a size, as the Bot API may
    pub fn without_sizes(mut self) -> Self {
        self.hide_sizes = true;
        self
    }

    /// Resolve files but fail every download
    pub fn failing_download(mut self) -> Self {
        self.fail_download = true;
        self
    }

    /// Fail every outbound message and upload
    pub fn failing_send(mut self) -> Self {
        self.fail_send = true;
        self
    }

    pub fn get_file_calls(&self) -> usize {
        self.get_file_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub async fn sent(&self) -> Vec<Sent> {
        self.sent.lock().await.clone()
    }

    /// Texts of all sent messages
    pub async fn messages(&self) -> Vec<String> {
        self.sent()
            .await
            .into_iter()
            .filter_map(|s| match s {
                Sent::Message { text, .. } => Some(text),
                Sent::Document { .. } => None,
            })
            .collect()
    }

    /// All uploaded documents
    pub async fn documents(&self) -> Vec<OutgoingDocument> {
        self.sent()
            .await
            .into_iter()
            .filter_map(|s| match s {
                Sent::Document { document, .. } => Some(document),
                Sent::Message { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl BotApi for MockBot {
    async fn get_file(&self, file_id: &str) -> unzip_bot::Result<RemoteFile> {
        self.get_file_calls.fetch_add(1, Ordering::SeqCst);
        let data = self
            .files
            .get(file_id)
            .ok_or_else(|| Error::Channel(format!("getFile failed: unknown file {file_id}")))?;

        let size = match self.reported_sizes.get(file_id) {
            Some(size) => Some(*size),
            None if self.hide_sizes => None,
            None => Some(data.len() as u64),
        };

        Ok(RemoteFile {
            path: format!("documents/{file_id}"),
            size,
        })
    }

    async fn download_file(&self, file_path: &str, max_size: u64) -> unzip_bot::Result<Vec<u8>> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_download {
            return Err(Error::Channel("download failed: 502 Bad Gateway".to_string()));
        }
        let file_id = file_path.trim_start_matches("documents/");
        let data = self
            .files
            .get(file_id)
            .ok_or_else(|| Error::Channel(format!("download failed: 404 for {file_path}")))?;

        if data.len() as u64 > max_size {
            return Err(Error::TooLarge { limit: max_size });
        }
        Ok(data.clone())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> unzip_bot::Result<()> {
        if self.fail_send {
            return Err(Error::Channel("sendMessage failed: chat not found".to_string()));
        }
        self.sent.lock().await.push(Sent::Message {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: i64,
        document: OutgoingDocument,
    ) -> unzip_bot::Result<()> {
        if self.fail_send {
            return Err(Error::Channel("sendDocument failed: chat not found".to_string()));
        }
        self.sent.lock().await.push(Sent::Document { chat_id, document });
        Ok(())
    }
}

/// Build an in-memory ZIP archive from `(name, contents)` pairs
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, contents) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Handler settings with temporary files under `tmp_root`
pub fn extract_config(tmp_root: &Path) -> ExtractConfig {
    ExtractConfig {
        tmp_dir: Some(tmp_root.to_path_buf()),
        selection: SelectionPolicy::Sorted,
        ..ExtractConfig::default()
    }
}

/// Whether a directory has no entries left
pub fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}

/// A plain text message update
pub fn text_update(chat_id: i64, text: &str) -> TelegramUpdate {
    serde_json::from_value(serde_json::json!({
        "update_id": 1000,
        "message": {
            "message_id": 1,
            "date": 1_700_000_000,
            "chat": { "id": chat_id, "type": "private" },
            "from": { "id": chat_id, "is_bot": false, "first_name": "Test" },
            "text": text
        }
    }))
    .unwrap()
}

/// A message update carrying a document
pub fn document_update(
    chat_id: i64,
    file_id: &str,
    file_name: &str,
    file_size: Option<u64>,
) -> TelegramUpdate {
    let mut document = serde_json::json!({
        "file_id": file_id,
        "file_unique_id": format!("u-{file_id}"),
        "file_name": file_name,
        "mime_type": "application/zip"
    });
    if let Some(size) = file_size {
        document["file_size"] = serde_json::json!(size);
    }

    serde_json::from_value(serde_json::json!({
        "update_id": 1001,
        "message": {
            "message_id": 2,
            "date": 1_700_000_000,
            "chat": { "id": chat_id, "type": "private" },
            "from": { "id": chat_id, "is_bot": false, "first_name": "Test", "username": "tester" },
            "document": document
        }
    }))
    .unwrap()
}
