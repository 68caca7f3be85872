//! Client configuration parsed from environment variables.
//!
//! Absent or unparseable numeric values fall back to their defaults; values
//! that parse but make no sense (a non-HTTP endpoint, a zero item height) are
//! rejected.

use std::time::Duration;

use crate::services::window::WindowConfig;

pub const DEFAULT_CHAT_ENDPOINT: &str = "http://127.0.0.1:8000/api/chat";
pub const DEFAULT_CHAT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_CHAT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_SCROLL_THROTTLE_MS: u64 = 100;
pub const DEFAULT_VIRTUALIZE_THRESHOLD: usize = 50;
pub const DEFAULT_ITEM_HEIGHT_PX: f64 = 120.0;
pub const DEFAULT_OVERSCAN: usize = 5;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid endpoint '{0}' (expected an http:// or https:// URL)")]
    InvalidEndpoint(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

// =============================================================================
// CHAT ENDPOINT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for ChatTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_CHAT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CHAT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub endpoint: String,
    pub timeouts: ChatTimeouts,
}

impl ChatConfig {
    /// Build typed endpoint config from environment variables.
    ///
    /// - `CHAT_ENDPOINT`: default `http://127.0.0.1:8000/api/chat`
    /// - `CHAT_REQUEST_TIMEOUT_SECS`: default 300
    /// - `CHAT_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not an HTTP(S) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Same as [`ChatConfig::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not an HTTP(S) URL.
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = lookup("CHAT_ENDPOINT").unwrap_or_else(|| DEFAULT_CHAT_ENDPOINT.to_owned());
        let endpoint = validate_endpoint(&endpoint)?;
        let timeouts = ChatTimeouts {
            request_secs: parse_or(&lookup, "CHAT_REQUEST_TIMEOUT_SECS", DEFAULT_CHAT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_or(&lookup, "CHAT_CONNECT_TIMEOUT_SECS", DEFAULT_CHAT_CONNECT_TIMEOUT_SECS),
        };
        Ok(Self { endpoint, timeouts })
    }

    /// Replace the endpoint, applying the same validation as the env path.
    ///
    /// # Errors
    ///
    /// Returns an error if `endpoint` is not an HTTP(S) URL.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, ConfigError> {
        self.endpoint = validate_endpoint(endpoint)?;
        Ok(self)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { endpoint: DEFAULT_CHAT_ENDPOINT.to_owned(), timeouts: ChatTimeouts::default() }
    }
}

fn validate_endpoint(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_owned())
    } else {
        Err(ConfigError::InvalidEndpoint(raw.to_owned()))
    }
}

// =============================================================================
// VIEW
// =============================================================================

/// Tunables for the scroll throttle and the message list window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewConfig {
    pub scroll_throttle: Duration,
    pub window: WindowConfig,
}

impl ViewConfig {
    /// Build view config from environment variables.
    ///
    /// - `CHAT_SCROLL_THROTTLE_MS`: default 100
    /// - `CHAT_VIRTUALIZE_THRESHOLD`: default 50
    /// - `CHAT_ITEM_HEIGHT_PX`: default 120
    /// - `CHAT_OVERSCAN`: default 5
    ///
    /// # Errors
    ///
    /// Returns an error if the item height is not a positive finite number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Same as [`ViewConfig::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the item height is not a positive finite number.
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let item_height = parse_or(&lookup, "CHAT_ITEM_HEIGHT_PX", DEFAULT_ITEM_HEIGHT_PX);
        if !item_height.is_finite() || item_height <= 0.0 {
            return Err(ConfigError::InvalidValue { key: "CHAT_ITEM_HEIGHT_PX", value: item_height.to_string() });
        }
        Ok(Self {
            scroll_throttle: Duration::from_millis(parse_or(&lookup, "CHAT_SCROLL_THROTTLE_MS", DEFAULT_SCROLL_THROTTLE_MS)),
            window: WindowConfig {
                threshold: parse_or(&lookup, "CHAT_VIRTUALIZE_THRESHOLD", DEFAULT_VIRTUALIZE_THRESHOLD),
                item_height,
                overscan: parse_or(&lookup, "CHAT_OVERSCAN", DEFAULT_OVERSCAN),
            },
        })
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self { scroll_throttle: Duration::from_millis(DEFAULT_SCROLL_THROTTLE_MS), window: WindowConfig::default() }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
