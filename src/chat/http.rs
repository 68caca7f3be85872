//! HTTP chat transport.
//!
//! POSTs the JSON request and hands back the response body as a byte stream.
//! No chunk framing is applied; the transport's own boundaries are passed
//! through untouched and decoded downstream.

use std::time::Duration;

use futures::{StreamExt, TryStreamExt};
use reqwest::StatusCode;
use tracing::debug;

use super::types::{ChatError, ChatRequest, ChatTransport, ChunkStream};
use crate::config::ChatConfig;

pub struct HttpChatClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpChatClient {
    /// Build a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ChatError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, endpoint: config.endpoint.clone() })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpChatClient {
    async fn open(&self, request: &ChatRequest) -> Result<ChunkStream, ChatError> {
        debug!(
            endpoint = %self.endpoint,
            model = %request.model,
            history_len = request.chat_history.len(),
            "chat: opening stream"
        );
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Err(ChatError::MissingBody);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Response { status: status.as_u16(), body });
        }

        Ok(response
            .bytes_stream()
            .map_err(|e| ChatError::Stream(e.to_string()))
            .boxed())
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
