//! TOML configuration file loading
//!
//! Supports `~/.config/unzip-bot/config.toml` (or the path in
//! `UNZIP_BOT_CONFIG`) as a persistent config source. All fields are
//! optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct BotConfigFile {
    /// Telegram Bot API settings
    #[serde(default)]
    pub telegram: TelegramFileConfig,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Archive extraction settings
    #[serde(default)]
    pub extract: ExtractFileConfig,
}

/// Telegram-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct TelegramFileConfig {
    pub bot_token: Option<String>,

    /// URL path segment that gates the webhook route
    pub path_secret: Option<String>,

    /// Expected `X-Telegram-Bot-Api-Secret-Token` header value
    pub webhook_secret: Option<String>,

    /// Bot API base URL (without `/bot<token>`)
    pub api_base: Option<String>,

    /// Outbound request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Port to listen on
    pub port: Option<u16>,
}

/// Extraction configuration
#[derive(Debug, Default, Deserialize)]
pub struct ExtractFileConfig {
    /// Size limit in bytes for both the archive and the extracted document
    pub max_file_size: Option<u64>,

    /// Document extension to look for (without the dot)
    pub target_extension: Option<String>,

    /// `sorted` or `filesystem`
    pub selection: Option<String>,

    /// Build the reply caption from FB2 metadata
    pub metadata_caption: Option<bool>,

    /// Directory for temporary archives and extraction trees
    pub tmp_dir: Option<PathBuf>,
}

/// Default config file location
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "unzip-bot")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Parse a config file from TOML text
///
/// # Errors
///
/// Returns error if the text is not valid TOML for this schema
pub fn parse_config_file(content: &str) -> Result<BotConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the config file, returning defaults when it does not exist
///
/// An explicit `path` that cannot be read or parsed is an error; a missing
/// file at the default location is not.
///
/// # Errors
///
/// Returns error if an explicitly requested file is missing or invalid
pub fn load_config_file(path: Option<&Path>) -> Result<BotConfigFile> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return Ok(BotConfigFile::default()),
        },
    };

    if !explicit && !path.exists() {
        return Ok(BotConfigFile::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let file = parse_config_file(&content)?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(file)
}
