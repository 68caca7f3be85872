//! Conversation state.
//!
//! DESIGN
//! ======
//! `Conversation` owns the message log, the input buffer, the loading flag
//! and the settings for a single session. It is a plain state machine with
//! two phases (`Idle`, `Streaming`); the exchange controller drives it and
//! takes snapshots for the presentation layer after every transition.
//!
//! Only the most recent message is ever mutated, and only while streaming.
//! Everything earlier in the log is frozen.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::chat::types::{ChatRequest, ChatSettings, HistoryEntry, Role};

/// Fixed text of the assistant message appended when an exchange fails.
pub const ERROR_MESSAGE_TEXT: &str =
    "Sorry, there was an error processing your request. Please check your API key and try again.";

// =============================================================================
// MESSAGE
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Time-ordered (v7), so id order matches append order.
    pub id: Uuid,
    pub content: String,
    pub role: Role,
    pub timestamp: OffsetDateTime,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self { id: Uuid::now_v7(), content: content.into(), role, timestamp: OffsetDateTime::now_utc() }
    }
}

// =============================================================================
// CONVERSATION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Streaming,
}

/// Why a submission was refused. Refusals are silent in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejection {
    #[error("message is empty")]
    EmptyInput,
    #[error("no API key configured")]
    MissingCredential,
    #[error("an exchange is already in flight")]
    Busy,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    input_text: String,
    phase: Phase,
    settings: ChatSettings,
    show_settings: bool,
    announcement: String,
}

impl Conversation {
    #[must_use]
    pub fn new(settings: ChatSettings) -> Self {
        Self {
            messages: Vec::new(),
            input_text: String::new(),
            phase: Phase::Idle,
            settings,
            show_settings: false,
            announcement: String::new(),
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Streaming
    }

    #[must_use]
    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    #[must_use]
    pub fn show_settings(&self) -> bool {
        self.show_settings
    }

    /// Screen-reader text describing the latest non-empty message.
    #[must_use]
    pub fn announcement(&self) -> &str {
        &self.announcement
    }

    pub fn set_input_text(&mut self, text: impl Into<String>) {
        self.input_text = text.into();
    }

    pub fn set_settings(&mut self, settings: ChatSettings) {
        self.settings = settings;
    }

    /// Flip the settings panel and return the new visibility.
    pub fn toggle_settings(&mut self) -> bool {
        self.show_settings = !self.show_settings;
        self.show_settings
    }

    /// Check whether `user_text` could be submitted right now.
    ///
    /// # Errors
    ///
    /// Returns the first reason the submission would be refused.
    pub fn validate_submit(&self, user_text: &str) -> Result<(), SubmitRejection> {
        if user_text.trim().is_empty() {
            return Err(SubmitRejection::EmptyInput);
        }
        if !self.settings.has_credential() {
            return Err(SubmitRejection::MissingCredential);
        }
        if self.phase != Phase::Idle {
            return Err(SubmitRejection::Busy);
        }
        Ok(())
    }

    /// Append the user message, clear the input buffer and start streaming.
    ///
    /// Returns the request to send. Its history is the log as it stood
    /// before this message, minus blank entries.
    ///
    /// # Errors
    ///
    /// Refuses blank input, a missing credential, or an exchange in flight.
    pub fn submit(&mut self, user_text: &str) -> Result<ChatRequest, SubmitRejection> {
        self.validate_submit(user_text)?;

        let request = ChatRequest {
            developer_message: self.settings.developer_message.clone(),
            user_message: user_text.to_owned(),
            chat_history: self.history(),
            model: self.settings.model.clone(),
            api_key: self.settings.api_key.clone(),
        };

        self.push(Message::new(Role::User, user_text));
        self.input_text.clear();
        self.phase = Phase::Streaming;
        Ok(request)
    }

    /// Append the empty assistant message that streamed text will fill.
    pub fn open_assistant_placeholder(&mut self) {
        if self.phase != Phase::Streaming {
            tracing::warn!("conversation: placeholder requested while idle");
            return;
        }
        self.push(Message::new(Role::Assistant, String::new()));
    }

    /// Replace the content of the open assistant message with `accumulated`.
    ///
    /// This is a full replace, not an append. Returns `false` (and changes
    /// nothing) unless streaming with an assistant message last in the log.
    pub fn patch_assistant_content(&mut self, accumulated: &str) -> bool {
        if self.phase != Phase::Streaming {
            return false;
        }
        let Some(last) = self.messages.last_mut() else {
            return false;
        };
        if last.role != Role::Assistant {
            return false;
        }
        accumulated.clone_into(&mut last.content);
        self.refresh_announcement();
        true
    }

    /// End the exchange. On failure a separate assistant message carrying
    /// `failure_text` is appended; the placeholder keeps whatever it had.
    pub fn complete_or_fail(&mut self, failure_text: Option<&str>) {
        self.phase = Phase::Idle;
        if let Some(text) = failure_text {
            self.push(Message::new(Role::Assistant, text));
        }
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.refresh_announcement();
    }

    fn refresh_announcement(&mut self) {
        if let Some(last) = self.messages.last()
            && !last.content.is_empty()
        {
            self.announcement = format!("{}: {}", last.role.announcement_prefix(), last.content);
        }
    }

    fn history(&self) -> Vec<HistoryEntry> {
        self.messages
            .iter()
            .filter(|m| !m.content.trim().is_empty())
            .map(|m| HistoryEntry { role: m.role, content: m.content.clone() })
            .collect()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(ChatSettings::default())
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
