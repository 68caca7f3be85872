//! Chat types — wire request, settings, and transport errors.
//!
//! The endpoint speaks a single JSON request shape and answers with a raw
//! UTF-8 text stream, so the only framing we own is the request body.

use std::fmt;

use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DEVELOPER_MESSAGE: &str = "You are a helpful AI assistant.";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Models offered by the settings form.
pub const SUPPORTED_MODELS: [&str; 3] = ["gpt-4.1-mini", "gpt-4o-mini", "gpt-3.5-turbo"];

/// Number of trailing credential characters mixed into a request key.
pub const CREDENTIAL_SUFFIX_CHARS: usize = 8;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while opening or reading a chat stream.
///
/// `Clone` so a deduplicated outcome can be handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// The HTTP request could not be sent.
    #[error("chat request failed: {0}")]
    Request(String),

    /// The endpoint returned a non-success HTTP status.
    #[error("chat response error: status {status}")]
    Response { status: u16, body: String },

    /// The endpoint answered without a readable body.
    #[error("chat response has no readable body")]
    MissingBody,

    /// The body stream broke after it started.
    #[error("chat stream interrupted: {0}")]
    Stream(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// ROLE
// =============================================================================

/// Author of a message. Assistant messages travel as `"ai"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai")]
    Assistant,
}

impl Role {
    /// Prefix used for screen-reader announcements.
    #[must_use]
    pub fn announcement_prefix(self) -> &'static str {
        match self {
            Self::User => "You said",
            Self::Assistant => "AI responded",
        }
    }
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Credential, system prompt and model for each request. Edited by the
/// settings form; read-only from the controller's point of view.
#[derive(Clone, PartialEq, Eq)]
pub struct ChatSettings {
    pub api_key: String,
    pub developer_message: String,
    pub model: String,
}

impl ChatSettings {
    #[must_use]
    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Last [`CREDENTIAL_SUFFIX_CHARS`] characters of the key.
    #[must_use]
    pub fn credential_suffix(&self) -> &str {
        credential_suffix(&self.api_key)
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            developer_message: DEFAULT_DEVELOPER_MESSAGE.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
        }
    }
}

impl fmt::Debug for ChatSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSettings")
            .field("api_key", &redacted(&self.api_key))
            .field("developer_message", &self.developer_message)
            .field("model", &self.model)
            .finish()
    }
}

pub(crate) fn credential_suffix(api_key: &str) -> &str {
    let skip = api_key.chars().count().saturating_sub(CREDENTIAL_SUFFIX_CHARS);
    api_key
        .char_indices()
        .nth(skip)
        .map_or("", |(idx, _)| &api_key[idx..])
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// One prior turn in `chat_history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// JSON body POSTed to the chat endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub developer_message: String,
    pub user_message: String,
    pub chat_history: Vec<HistoryEntry>,
    pub model: String,
    pub api_key: String,
}

impl fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatRequest")
            .field("developer_message", &self.developer_message)
            .field("user_message", &self.user_message)
            .field("chat_history", &self.chat_history)
            .field("model", &self.model)
            .field("api_key", &redacted(&self.api_key))
            .finish()
    }
}

// =============================================================================
// TRANSPORT TRAIT
// =============================================================================

/// Raw body chunks as delivered by the transport.
pub type ChunkStream = BoxStream<'static, Result<Bytes, ChatError>>;

/// Opens a streamed chat response. Enables mocking in tests.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `request` and return the response body as a chunk stream.
    ///
    /// # Errors
    ///
    /// Returns a [`ChatError`] if the request cannot be sent, the status is
    /// not a success, or there is no body to read.
    async fn open(&self, request: &ChatRequest) -> Result<ChunkStream, ChatError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
