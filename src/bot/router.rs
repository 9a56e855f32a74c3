//! Command classification and dispatch.
//!
//! One inbound message is matched against an ordered command set (specific
//! commands first, then a generic URL pattern, then a catch-all); the first
//! match wins and exactly one handler runs. Before dispatch the message is
//! relayed to the operator chat; relay failures are logged and never
//! surfaced to the originating user.

use crate::downloader::{MediaFetcher, MediaKind};
use crate::lookup::{format_anime_info, AnimeLookup, LookupError, LyricsLookup};
use crate::telegram::{ChatApi, Message, TelegramError};
use crate::utils::truncate_chars;
use lazy_regex::lazy_regex;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Ceiling applied to every text reply before sending
const REPLY_CHAR_LIMIT: usize = 4000;

const WELCOME_TEXT: &str = "👋 Welcome to the Music & Anime Bot! Use /help to see all features.";

const HELP_TEXT: &str = "Here are commands you can use:\n\
    - Send a Spotify/YouTube link to get audio\n\
    - Send Instagram reel link for video\n\
    - @lyrics SongName - ArtistName\n\
    - @animeinfo AnimeName";

const LYRICS_USAGE: &str = "Please provide song and artist: @lyrics SongName - Artist";
const ANIME_USAGE: &str = "Please provide an anime name like: @animeinfo Jujutsu Kaisen";
const UNRECOGNIZED_TEXT: &str = "❓ Unknown command or link. Use /help to see available commands.";

const LYRICS_NOT_FOUND: &str = "Lyrics not found.";
const LYRICS_FETCH_ERROR: &str = "Lyrics fetch error.";
const ANIME_NOT_FOUND: &str = "Anime not found.";
const ANIME_LOOKUP_ERROR: &str = "Anime lookup error.";
const MEDIA_SEND_FAILED: &str = "Downloaded the file but failed to send it. Please try again.";

/// Match the first http(s) link embedded in a message
static RE_URL: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"https?://[\w./?=&%-]+");

/// Classification of one inbound message, derived purely from its text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Lyrics(String),
    AnimeInfo(String),
    MediaUrl(String),
    Unrecognized,
}

impl Command {
    /// Classify message text by first match against the ordered command set.
    pub fn classify(text: &str) -> Self {
        let text = text.trim();
        if text.starts_with("/start") {
            return Self::Start;
        }
        if text.starts_with("/help") {
            return Self::Help;
        }
        if let Some(rest) = text.strip_prefix("@lyrics") {
            return Self::Lyrics(rest.trim().to_string());
        }
        if let Some(rest) = text.strip_prefix("@animeinfo") {
            return Self::AnimeInfo(rest.trim().to_string());
        }
        if let Some(m) = RE_URL.find(text) {
            return Self::MediaUrl(m.as_str().to_string());
        }
        Self::Unrecognized
    }
}

/// Stateless dispatcher over injected collaborators
pub struct Router {
    api: Arc<dyn ChatApi>,
    lyrics: Arc<dyn LyricsLookup>,
    anime: Arc<dyn AnimeLookup>,
    fetcher: Arc<dyn MediaFetcher>,
    forward_chat_id: i64,
}

impl Router {
    /// Wire up a router against its collaborators.
    pub fn new(
        api: Arc<dyn ChatApi>,
        lyrics: Arc<dyn LyricsLookup>,
        anime: Arc<dyn AnimeLookup>,
        fetcher: Arc<dyn MediaFetcher>,
        forward_chat_id: i64,
    ) -> Self {
        Self {
            api,
            lyrics,
            anime,
            fetcher,
            forward_chat_id,
        }
    }

    /// Handle one inbound message to completion.
    ///
    /// Never fails: delivery errors are logged, the cursor owned by the
    /// caller is unaffected either way.
    pub async fn handle_message(&self, msg: &Message) {
        let Some(text) = msg.text.as_deref() else {
            debug!(chat_id = msg.chat.id, "ignoring message without text");
            return;
        };

        self.relay_to_operator(msg).await;

        let outcome = match Command::classify(text) {
            Command::Start => self.api.send_message(msg.chat.id, WELCOME_TEXT).await,
            Command::Help => self.api.send_message(msg.chat.id, HELP_TEXT).await,
            Command::Lyrics(query) => self.handle_lyrics(msg.chat.id, &query).await,
            Command::AnimeInfo(name) => self.handle_anime(msg.chat.id, &name).await,
            Command::MediaUrl(url) => self.handle_media(msg.chat.id, &url).await,
            Command::Unrecognized => self.api.send_message(msg.chat.id, UNRECOGNIZED_TEXT).await,
        };

        if let Err(e) = outcome {
            error!(chat_id = msg.chat.id, error = %e, "failed to deliver response");
        }
    }

    /// Relay the message to the operator chat. Best effort only: a failed
    /// relay is logged and dispatch continues.
    async fn relay_to_operator(&self, msg: &Message) {
        if let Err(e) = self
            .api
            .forward_message(self.forward_chat_id, msg.chat.id, msg.message_id)
            .await
        {
            warn!(chat_id = msg.chat.id, error = %e, "failed to relay message to operator");
        }
    }

    async fn handle_lyrics(&self, chat_id: i64, query: &str) -> Result<(), TelegramError> {
        if query.is_empty() {
            return self.api.send_message(chat_id, LYRICS_USAGE).await;
        }

        let reply = match self.lyrics.lyrics(query).await {
            Ok(lyrics) => format!("🎶 Lyrics for {query}:\n\n{lyrics}"),
            Err(LookupError::NotFound) => LYRICS_NOT_FOUND.to_string(),
            Err(e) => {
                warn!(query, error = %e, "lyrics lookup failed");
                LYRICS_FETCH_ERROR.to_string()
            }
        };

        self.api
            .send_message(chat_id, &truncate_chars(reply, REPLY_CHAR_LIMIT))
            .await
    }

    async fn handle_anime(&self, chat_id: i64, name: &str) -> Result<(), TelegramError> {
        if name.is_empty() {
            return self.api.send_message(chat_id, ANIME_USAGE).await;
        }

        match self.anime.search(name).await {
            Ok(info) => {
                let block = format_anime_info(&info);
                if let Some(cover) = info.cover_url.as_deref() {
                    if let Err(e) = self.api.send_photo(chat_id, cover, &block).await {
                        warn!(name, error = %e, "cover photo send failed, falling back to text");
                        return self.api.send_message(chat_id, &block).await;
                    }
                    Ok(())
                } else {
                    self.api.send_message(chat_id, &block).await
                }
            }
            Err(LookupError::NotFound) => self.api.send_message(chat_id, ANIME_NOT_FOUND).await,
            Err(e) => {
                warn!(name, error = %e, "anime lookup failed");
                self.api.send_message(chat_id, ANIME_LOOKUP_ERROR).await
            }
        }
    }

    async fn handle_media(&self, chat_id: i64, url: &str) -> Result<(), TelegramError> {
        let kind = MediaKind::for_url(url);

        match self.fetcher.fetch(url, kind).await {
            Ok(job) => {
                let sent = match job.kind() {
                    MediaKind::Audio => self.api.send_audio(chat_id, job.path(), None).await,
                    MediaKind::Video => self.api.send_video(chat_id, job.path(), None).await,
                };
                // The file is released before any follow-up reply goes out.
                drop(job);

                match sent {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        warn!(url, error = %e, "media delivery failed");
                        self.api.send_message(chat_id, MEDIA_SEND_FAILED).await
                    }
                }
            }
            Err(e) => {
                warn!(url, error = %e, "media download failed");
                let reply = format!("Download failed: {e}");
                self.api
                    .send_message(chat_id, &truncate_chars(reply, REPLY_CHAR_LIMIT))
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_commands_first() {
        assert_eq!(Command::classify("/start"), Command::Start);
        assert_eq!(Command::classify("/help"), Command::Help);
        // A link inside a /help message must not shadow the command.
        assert_eq!(
            Command::classify("/help https://youtu.be/abc"),
            Command::Help
        );
    }

    #[test]
    fn classify_lyrics_with_and_without_query() {
        assert_eq!(
            Command::classify("@lyrics Bohemian Rhapsody - Queen"),
            Command::Lyrics("Bohemian Rhapsody - Queen".to_string())
        );
        assert_eq!(Command::classify("@lyrics "), Command::Lyrics(String::new()));
        assert_eq!(Command::classify("@lyrics"), Command::Lyrics(String::new()));
    }

    #[test]
    fn classify_animeinfo() {
        assert_eq!(
            Command::classify("@animeinfo Jujutsu Kaisen"),
            Command::AnimeInfo("Jujutsu Kaisen".to_string())
        );
        assert_eq!(
            Command::classify("@animeinfo "),
            Command::AnimeInfo(String::new())
        );
    }

    #[test]
    fn classify_extracts_embedded_url() {
        assert_eq!(
            Command::classify("check this out https://youtu.be/dQw4w9WgXcQ please"),
            Command::MediaUrl("https://youtu.be/dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn classify_falls_through_to_unrecognized() {
        assert_eq!(Command::classify("hello there"), Command::Unrecognized);
        assert_eq!(Command::classify(""), Command::Unrecognized);
        assert_eq!(Command::classify("/settings"), Command::Unrecognized);
    }
}
