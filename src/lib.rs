//! Client-side controller for a streaming chat endpoint.
//!
//! A `ChatController` owns one conversation, sends each submitted message
//! with its history to the endpoint, and patches the growing reply into the
//! message log as chunks arrive. Presentation layers read `ChatSnapshot`s
//! from a watch channel.

pub mod chat;
pub mod config;
pub mod dedup;
pub mod services;
pub mod state;

pub use chat::{ChatError, ChatSettings, ChatTransport, HttpChatClient};
pub use config::{ChatConfig, ConfigError, ViewConfig};
pub use services::exchange::{ChatController, ChatSnapshot, ControllerParts, ExchangeOutcome};
pub use state::{Conversation, Message, SubmitRejection};
