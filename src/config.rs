//! Configuration and settings management
//!
//! Loads settings from environment variables and optional config files.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Chat every inbound message is relayed to (operator chat or group)
    pub forward_chat_id: i64,

    /// Media-fetch tool binary name or path
    #[serde(default = "default_downloader_bin")]
    pub downloader_bin: String,

    /// Staging directory for downloaded media; system temp dir when unset
    #[serde(default)]
    pub download_dir: Option<String>,

    /// Lyrics provider base URL
    #[serde(default = "default_lyrics_api_url")]
    pub lyrics_api_url: String,

    /// Anime metadata provider endpoint
    #[serde(default = "default_anilist_api_url")]
    pub anilist_api_url: String,

    /// Server-side wait for `getUpdates` long polling, in seconds
    #[serde(default = "default_long_poll_timeout_secs")]
    pub long_poll_timeout_secs: u64,

    /// Idle delay between poll iterations, in seconds
    #[serde(default = "default_idle_delay_secs")]
    pub idle_delay_secs: u64,
}

fn default_downloader_bin() -> String {
    "yt-dlp".to_string()
}

fn default_lyrics_api_url() -> String {
    "https://api.lyrics.ovh".to_string()
}

fn default_anilist_api_url() -> String {
    "https://graphql.anilist.co".to_string()
}

const fn default_long_poll_timeout_secs() -> u64 {
    30
}

const fn default_idle_delay_secs() -> u64 {
    1
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required key
    /// (`TELEGRAM_TOKEN`, `FORWARD_CHAT_ID`) is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            // Add in the current environment file
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked into git
            .add_source(File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of APP)
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Also accept plain uppercase environment variables
            .add_source(Environment::default())
            .build()?;

        s.try_deserialize()
    }

    /// Media staging directory, falling back to the system temp dir
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .as_ref()
            .map_or_else(std::env::temp_dir, PathBuf::from)
    }
}
