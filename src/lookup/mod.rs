//! Third-party content lookup clients.
//!
//! Two independent stateless query clients: lyrics (lyrics.ovh) and anime
//! metadata (AniList GraphQL). Both sit behind traits so handlers can be
//! tested with stub lookups.

pub mod anime;
pub mod lyrics;

pub use anime::{format_anime_info, AniListClient, AnimeInfo};
pub use lyrics::LyricsClient;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the content lookup providers
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("no result for query")]
    NotFound,
}

/// Free-text lyrics lookup
#[async_trait]
pub trait LyricsLookup: Send + Sync {
    /// Fetch lyrics for a song query such as `"Artist - Title"`.
    async fn lyrics(&self, query: &str) -> Result<String, LookupError>;
}

/// Free-text anime metadata lookup
#[async_trait]
pub trait AnimeLookup: Send + Sync {
    /// Search for one anime by title and return its normalized metadata.
    async fn search(&self, name: &str) -> Result<AnimeInfo, LookupError>;
}
