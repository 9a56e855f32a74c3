//! Anime metadata lookup against the AniList GraphQL API.

use super::{AnimeLookup, LookupError};
use crate::utils::{strip_markup, truncate_chars};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::fmt::Write;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Ceiling for the description block in a reply
const DESCRIPTION_CHAR_LIMIT: usize = 300;

/// How many related titles to surface
const MAX_RELATED: usize = 3;

/// One search query with a fixed field selection
const SEARCH_QUERY: &str = "\
query ($search: String) {
  Media(search: $search, type: ANIME) {
    title { romaji english }
    description(asHtml: false)
    episodes
    status
    averageScore
    coverImage { large }
    recommendations(perPage: 3) {
      nodes { mediaRecommendation { title { romaji } } }
    }
  }
}";

// ── Wire types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GraphQlReply {
    #[serde(default)]
    data: Option<ReplyData>,
}

#[derive(Debug, Deserialize)]
struct ReplyData {
    #[serde(rename = "Media")]
    media: Option<MediaNode>,
}

#[derive(Debug, Deserialize)]
struct MediaNode {
    title: Option<TitleNode>,
    description: Option<String>,
    episodes: Option<u32>,
    status: Option<String>,
    #[serde(rename = "averageScore")]
    average_score: Option<u32>,
    #[serde(rename = "coverImage")]
    cover_image: Option<CoverNode>,
    recommendations: Option<RecommendationsNode>,
}

#[derive(Debug, Deserialize)]
struct TitleNode {
    romaji: Option<String>,
    english: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoverNode {
    large: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecommendationsNode {
    #[serde(default)]
    nodes: Vec<RecommendationNode>,
}

#[derive(Debug, Deserialize)]
struct RecommendationNode {
    #[serde(rename = "mediaRecommendation")]
    media_recommendation: Option<RecommendedMediaNode>,
}

#[derive(Debug, Deserialize)]
struct RecommendedMediaNode {
    title: Option<TitleNode>,
}

// ── Normalized result ───────────────────────────────────────────

/// Normalized metadata for one anime search hit
#[derive(Debug, Clone)]
pub struct AnimeInfo {
    pub title: String,
    pub status: String,
    pub episodes: Option<u32>,
    pub score: Option<u32>,
    pub description: String,
    pub cover_url: Option<String>,
    pub related: Vec<String>,
}

impl From<MediaNode> for AnimeInfo {
    fn from(media: MediaNode) -> Self {
        let title = media
            .title
            .and_then(|t| t.romaji.or(t.english))
            .unwrap_or_else(|| "Unknown".to_string());
        let related = media
            .recommendations
            .map(|r| {
                r.nodes
                    .into_iter()
                    .filter_map(|n| n.media_recommendation)
                    .filter_map(|m| m.title.and_then(|t| t.romaji.or(t.english)))
                    .take(MAX_RELATED)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            title,
            status: media.status.unwrap_or_else(|| "UNKNOWN".to_string()),
            episodes: media.episodes,
            score: media.average_score,
            description: media.description.unwrap_or_default(),
            cover_url: media.cover_image.and_then(|c| c.large),
            related,
        }
    }
}

/// Format the fixed multi-field display block for one result.
///
/// Field order is part of the reply contract: title, status, episode
/// count, score, then the stripped and truncated description.
pub fn format_anime_info(info: &AnimeInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Title: {}", info.title);
    let _ = writeln!(out, "Status: {}", info.status);
    match info.episodes {
        Some(n) => {
            let _ = writeln!(out, "Episodes: {n}");
        }
        None => {
            let _ = writeln!(out, "Episodes: ?");
        }
    }
    match info.score {
        Some(s) => {
            let _ = writeln!(out, "Score: {s}/100");
        }
        None => {
            let _ = writeln!(out, "Score: ?");
        }
    }
    let _ = write!(out, "Description: {}", summarize_description(&info.description));
    if !info.related.is_empty() {
        let _ = write!(out, "\nRelated: {}", info.related.join(", "));
    }
    out
}

/// Strip markup and truncate the provider description to a fixed length.
fn summarize_description(description: &str) -> String {
    let clean = strip_markup(description);
    let truncated = truncate_chars(&clean, DESCRIPTION_CHAR_LIMIT);
    if truncated.len() < clean.len() {
        format!("{truncated}…")
    } else {
        truncated
    }
}

// ── Client ──────────────────────────────────────────────────────

/// Client for the AniList GraphQL API
pub struct AniListClient {
    http: reqwest::Client,
    endpoint: String,
}

impl AniListClient {
    /// Create a client against the given GraphQL endpoint.
    pub fn new(endpoint: &str) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl AnimeLookup for AniListClient {
    async fn search(&self, name: &str) -> Result<AnimeInfo, LookupError> {
        debug!(name, "looking up anime metadata");

        let body = json!({
            "query": SEARCH_QUERY,
            "variables": { "search": name },
        });

        let response = self.http.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let reply: GraphQlReply = response
            .json()
            .await
            .map_err(|e| LookupError::Malformed(e.to_string()))?;

        reply
            .data
            .and_then(|d| d.media)
            .map(AnimeInfo::from)
            .ok_or(LookupError::NotFound)
    }
}
