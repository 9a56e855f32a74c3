//! Telegram Bot API wire types and HTTP client.
//!
//! Long-polling transport: the bot polls `getUpdates` with an explicit
//! offset instead of registering a webhook, so no public endpoint is
//! needed and the update cursor stays under the caller's control.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors talking to the Telegram Bot API
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("telegram returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("telegram rejected {method}: {description}")]
    Rejected {
        method: &'static str,
        description: String,
    },
    #[error("failed to read media file: {0}")]
    Io(#[from] std::io::Error),
}

// ── Wire types (subset of fields we need) ───────────────────────

/// One inbound event, identified by a strictly increasing id
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Unique identifier for this update
    pub update_id: i64,
    /// New incoming message, when the update is a message
    pub message: Option<Message>,
}

/// A Telegram Message object
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Unique message identifier within its chat
    pub message_id: i64,
    /// Sender of the message
    pub from: Option<User>,
    /// Chat the message belongs to
    pub chat: Chat,
    /// Text of the message, absent for stickers, media, etc.
    pub text: Option<String>,
}

/// A Telegram User object
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// A Telegram Chat object
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Envelope every Bot API method responds with
#[derive(Debug, Deserialize)]
struct ApiReply<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SendPhotoRequest<'a> {
    chat_id: i64,
    photo: &'a str,
    caption: &'a str,
}

#[derive(Debug, Serialize)]
struct ForwardMessageRequest {
    chat_id: i64,
    from_chat_id: i64,
    message_id: i64,
}

// ── Chat API seam ───────────────────────────────────────────────

/// Operations the poller and router need from the chat platform.
///
/// A trait so the dispatch pipeline can be exercised against fakes.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Fetch updates with `update_id >= offset`, long-polling up to
    /// `timeout_secs` on the server side.
    async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError>;

    /// Send a plain text message.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError>;

    /// Send a photo by URL with a caption.
    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: &str,
    ) -> Result<(), TelegramError>;

    /// Upload a local audio file; completes before the file may be deleted.
    async fn send_audio(
        &self,
        chat_id: i64,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), TelegramError>;

    /// Upload a local video file; completes before the file may be deleted.
    async fn send_video(
        &self,
        chat_id: i64,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), TelegramError>;

    /// Forward an existing message to another chat.
    async fn forward_message(
        &self,
        chat_id: i64,
        from_chat_id: i64,
        message_id: i64,
    ) -> Result<(), TelegramError>;
}

// ── HTTP client ─────────────────────────────────────────────────

/// Low-level client for Telegram Bot API operations
pub struct TelegramApi {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramApi {
    /// Create a new client for the given bot token.
    ///
    /// The request timeout must exceed the long-poll window, and uploads
    /// of larger media files need headroom too.
    pub fn new(token: &str) -> Result<Self, TelegramError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            base_url: format!("https://api.telegram.org/bot{token}"),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    /// Check HTTP status and the `ok` flag, returning the payload.
    async fn read_reply<T: DeserializeOwned + Default>(
        method: &'static str,
        response: reqwest::Response,
    ) -> Result<T, TelegramError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelegramError::Status { status, body });
        }

        let reply: ApiReply<T> = response.json().await?;
        if !reply.ok {
            return Err(TelegramError::Rejected {
                method,
                description: reply.description.unwrap_or_default(),
            });
        }
        reply.result.ok_or_else(|| TelegramError::Rejected {
            method,
            description: "missing result".to_string(),
        })
    }

    /// Check HTTP status and the `ok` flag, discarding the payload.
    async fn ensure_ok(
        method: &'static str,
        response: reqwest::Response,
    ) -> Result<(), TelegramError> {
        Self::read_reply::<serde_json::Value>(method, response)
            .await
            .map(|_| ())
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        method: &'static str,
        body: &B,
    ) -> Result<(), TelegramError> {
        let response = self.http.post(self.url(method)).json(body).send().await?;
        Self::ensure_ok(method, response).await
    }

    /// Upload one local file as a multipart form field.
    async fn send_media(
        &self,
        method: &'static str,
        field: &'static str,
        mime: &str,
        chat_id: i64,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), TelegramError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "media".to_string(), |n| n.to_string_lossy().into_owned());

        debug!(method, path = %path.display(), size = bytes.len(), "uploading media file");

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)?;
        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part(field, part);
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }

        let response = self
            .http
            .post(self.url(method))
            .multipart(form)
            .send()
            .await?;
        Self::ensure_ok(method, response).await
    }
}

#[async_trait]
impl ChatApi for TelegramApi {
    async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let params = [
            ("offset", offset.to_string()),
            ("timeout", timeout_secs.to_string()),
        ];
        let response = self
            .http
            .get(self.url("getUpdates"))
            .query(&params)
            .send()
            .await?;
        Self::read_reply("getUpdates", response).await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        self.post_json("sendMessage", &SendMessageRequest { chat_id, text })
            .await
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: &str,
    ) -> Result<(), TelegramError> {
        self.post_json(
            "sendPhoto",
            &SendPhotoRequest {
                chat_id,
                photo: photo_url,
                caption,
            },
        )
        .await
    }

    async fn send_audio(
        &self,
        chat_id: i64,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), TelegramError> {
        self.send_media("sendAudio", "audio", "audio/mpeg", chat_id, path, caption)
            .await
    }

    async fn send_video(
        &self,
        chat_id: i64,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), TelegramError> {
        self.send_media("sendVideo", "video", "video/mp4", chat_id, path, caption)
            .await
    }

    async fn forward_message(
        &self,
        chat_id: i64,
        from_chat_id: i64,
        message_id: i64,
    ) -> Result<(), TelegramError> {
        self.post_json(
            "forwardMessage",
            &ForwardMessageRequest {
                chat_id,
                from_chat_id,
                message_id,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_get_updates_reply() {
        let json = r#"{
            "ok": true,
            "result": [
                {
                    "update_id": 123456789,
                    "message": {
                        "message_id": 42,
                        "from": {"id": 100, "first_name": "John", "username": "johndoe"},
                        "chat": {"id": 100, "type": "private"},
                        "text": "Hello bot!",
                        "date": 1707900000
                    }
                }
            ]
        }"#;

        let reply: ApiReply<Vec<Update>> = serde_json::from_str(json).unwrap();
        assert!(reply.ok);

        let updates = reply.result.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 123_456_789);

        let msg = updates[0].message.as_ref().unwrap();
        assert_eq!(msg.message_id, 42);
        assert_eq!(msg.chat.id, 100);
        assert_eq!(msg.text.as_deref(), Some("Hello bot!"));
        assert_eq!(msg.from.as_ref().unwrap().username.as_deref(), Some("johndoe"));
    }

    #[test]
    fn deserialize_update_without_message() {
        // Updates can be callback queries, edited messages, etc.
        let json = r#"{"update_id": 999}"#;
        let update: Update = serde_json::from_str(json).unwrap();
        assert_eq!(update.update_id, 999);
        assert!(update.message.is_none());
    }

    #[test]
    fn deserialize_message_without_text() {
        // Stickers, photos and the like carry no text field
        let json = r#"{
            "update_id": 1,
            "message": {
                "message_id": 7,
                "chat": {"id": 5, "type": "private"},
                "date": 1707900000
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let msg = update.message.unwrap();
        assert!(msg.text.is_none());
        assert!(msg.from.is_none());
    }

    #[test]
    fn deserialize_rejected_reply() {
        let json = r#"{"ok": false, "description": "Unauthorized"}"#;
        let reply: ApiReply<Vec<Update>> = serde_json::from_str(json).unwrap();
        assert!(!reply.ok);
        assert!(reply.result.is_none());
        assert_eq!(reply.description.as_deref(), Some("Unauthorized"));
    }
}
