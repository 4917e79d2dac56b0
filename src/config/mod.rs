//! Configuration management for the unzip bot
//!
//! Values are resolved once at startup with the precedence
//! env > TOML file > default and then passed down explicitly.

pub mod file;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use self::file::BotConfigFile;
use crate::{Error, Result};

/// Default size limit for archives and extracted documents (32 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 32 * 1024 * 1024;

/// Default document extension extracted from archives
pub const DEFAULT_TARGET_EXTENSION: &str = "fb2";

/// Default Telegram Bot API base URL
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Default outbound request timeout
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default listen port
const DEFAULT_PORT: u16 = 8080;

/// Bot configuration
#[derive(Debug)]
pub struct Config {
    /// Telegram Bot API and webhook settings
    pub telegram: TelegramConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Update handler settings
    pub extract: ExtractConfig,
}

/// Telegram Bot API and webhook configuration
#[derive(Debug)]
pub struct TelegramConfig {
    /// Bot token (from `TELEGRAM_BOT_TOKEN`)
    pub bot_token: SecretString,

    /// URL path segment gating the webhook route (from `WEBHOOK_PATH_SECRET`)
    pub path_secret: SecretString,

    /// Expected `X-Telegram-Bot-Api-Secret-Token` header, if any
    pub webhook_secret: Option<SecretString>,

    /// Bot API base URL
    pub api_base: String,

    /// Timeout applied to every outbound request
    pub request_timeout: Duration,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

/// Order in which the extracted tree is searched for the target document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Visit entries sorted by file name (deterministic)
    #[default]
    Sorted,
    /// Visit entries in whatever order the filesystem enumerates them
    FilesystemOrder,
}

impl FromStr for SelectionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sorted" => Ok(Self::Sorted),
            "filesystem" | "fs" => Ok(Self::FilesystemOrder),
            other => Err(Error::Config(format!(
                "unknown selection policy '{other}' (expected 'sorted' or 'filesystem')"
            ))),
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sorted => f.write_str("sorted"),
            Self::FilesystemOrder => f.write_str("filesystem"),
        }
    }
}

/// Update handler configuration
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Limit applied to the declared attachment size and the extracted file
    pub max_file_size: u64,

    /// Target extension, lowercase, without the leading dot
    pub target_extension: String,

    /// Search order for the first matching document
    pub selection: SelectionPolicy,

    /// Build the caption from FB2 metadata instead of the fixed text
    pub metadata_caption: bool,

    /// Root for temporary files; the system temp dir when `None`
    pub tmp_dir: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            target_extension: DEFAULT_TARGET_EXTENSION.to_string(),
            selection: SelectionPolicy::default(),
            metadata_caption: false,
            tmp_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from the process environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a required value is missing or a value is malformed
    pub fn load(config_path: Option<&Path>, port: Option<u16>) -> Result<Self> {
        let fc = file::load_config_file(config_path)?;
        Self::from_sources(|key| std::env::var(key).ok(), fc, port)
    }

    /// Resolve configuration from an env lookup, a parsed file and CLI overrides
    ///
    /// # Errors
    ///
    /// Returns error if the bot token or path secret is missing, or a value
    /// is malformed
    pub fn from_sources<F>(env: F, fc: BotConfigFile, port: Option<u16>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let bot_token = non_empty("TELEGRAM_BOT_TOKEN")
            .or(fc.telegram.bot_token)
            .ok_or_else(|| Error::Config("TELEGRAM_BOT_TOKEN is not set".to_string()))?;

        let path_secret = non_empty("WEBHOOK_PATH_SECRET")
            .or(fc.telegram.path_secret)
            .ok_or_else(|| Error::Config("WEBHOOK_PATH_SECRET is not set".to_string()))?;

        let webhook_secret = non_empty("TELEGRAM_WEBHOOK_SECRET").or(fc.telegram.webhook_secret);

        let api_base = non_empty("TELEGRAM_API_BASE")
            .or(fc.telegram.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let request_timeout_secs = match non_empty("UNZIP_BOT_REQUEST_TIMEOUT") {
            Some(v) => parse_number::<u64>("UNZIP_BOT_REQUEST_TIMEOUT", &v)?,
            None => fc
                .telegram
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let port = match port {
            Some(p) => p,
            None => match non_empty("UNZIP_BOT_PORT").or_else(|| non_empty("PORT")) {
                Some(v) => parse_number::<u16>("UNZIP_BOT_PORT", &v)?,
                None => fc.server.port.unwrap_or(DEFAULT_PORT),
            },
        };

        let max_file_size = match non_empty("UNZIP_BOT_MAX_FILE_SIZE") {
            Some(v) => parse_number::<u64>("UNZIP_BOT_MAX_FILE_SIZE", &v)?,
            None => fc.extract.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE),
        };

        let target_extension = non_empty("UNZIP_BOT_TARGET_EXTENSION")
            .or(fc.extract.target_extension)
            .map_or_else(|| DEFAULT_TARGET_EXTENSION.to_string(), |e| normalize_extension(&e));
        if target_extension.is_empty() {
            return Err(Error::Config("target extension must not be empty".to_string()));
        }

        let selection = non_empty("UNZIP_BOT_SELECTION")
            .or(fc.extract.selection)
            .map(|s| s.parse::<SelectionPolicy>())
            .transpose()?
            .unwrap_or_default();

        let metadata_caption = match non_empty("UNZIP_BOT_METADATA_CAPTION") {
            Some(v) => parse_bool("UNZIP_BOT_METADATA_CAPTION", &v)?,
            None => fc.extract.metadata_caption.unwrap_or(false),
        };

        let tmp_dir = non_empty("UNZIP_BOT_TMP_DIR")
            .map(PathBuf::from)
            .or(fc.extract.tmp_dir);

        Ok(Self {
            telegram: TelegramConfig {
                bot_token: SecretString::from(bot_token),
                path_secret: SecretString::from(path_secret),
                webhook_secret: webhook_secret.map(SecretString::from),
                api_base,
                request_timeout: Duration::from_secs(request_timeout_secs),
            },
            server: ServerConfig { port },
            extract: ExtractConfig {
                max_file_size,
                target_extension,
                selection,
                metadata_caption,
                tmp_dir,
            },
        })
    }
}

/// Lowercase an extension and strip a leading dot
#[must_use]
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a number, got '{value}'")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{key} must be a boolean, got '{value}'"))),
    }
}
