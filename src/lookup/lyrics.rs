//! Lyrics lookup against the lyrics.ovh API.

use super::{LookupError, LyricsLookup};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Per-request timeout; the provider is slow on misses
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct LyricsReply {
    #[serde(default)]
    lyrics: Option<String>,
}

/// Client for the lyrics.ovh lookup API
pub struct LyricsClient {
    http: reqwest::Client,
    base_url: String,
}

impl LyricsClient {
    /// Create a client against the given provider base URL.
    pub fn new(base_url: &str) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LyricsLookup for LyricsClient {
    async fn lyrics(&self, query: &str) -> Result<String, LookupError> {
        debug!(query, "looking up lyrics");

        let response = self
            .http
            .get(format!("{}/v1/{query}", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound);
        }
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let reply: LyricsReply = response
            .json()
            .await
            .map_err(|e| LookupError::Malformed(e.to_string()))?;

        reply.lyrics.ok_or(LookupError::NotFound)
    }
}
