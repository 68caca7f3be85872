//! Exchange controller — submit → stream → patch → complete.
//!
//! DESIGN
//! ======
//! `ChatController` wires the conversation state machine to the transport,
//! the deduplicator, the scroll throttle and the metrics recorder. Every
//! state transition republishes a `ChatSnapshot` on a `watch` channel, which
//! is the only thing the presentation layer reads.
//!
//! Locks are `std::sync::Mutex` and are never held across an await. The
//! ingest loop runs inside the deduplicated future, so a joined request
//! shares its outcome with the first caller but patches only the
//! conversation that started it.
//!
//! TRADE-OFFS
//! ==========
//! No cancellation: once submitted, an exchange runs until the stream ends
//! or fails. Failures of any kind collapse into one fixed-text assistant
//! message; the cause is only logged.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::chat::types::{ChatError, ChatRequest, ChatSettings, ChatTransport};
use crate::config::ViewConfig;
use crate::dedup::{RequestDeduplicator, RequestKey};
use crate::services::ingest::{IngestSummary, ingest_stream};
use crate::services::metrics::{MetricsRecorder, PerformanceSample, RenderTimer, duration_ms};
use crate::services::scroll::{ScrollRequest, Throttle};
use crate::services::window::{ListLayout, Viewport, WindowConfig, compute_layout};
use crate::state::{Conversation, ERROR_MESSAGE_TEXT, Message, SubmitRejection};

// =============================================================================
// TYPES
// =============================================================================

/// Read-only view of the controller state after a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSnapshot {
    pub messages: Vec<Message>,
    pub input_text: String,
    pub is_loading: bool,
    pub settings: ChatSettings,
    pub show_settings: bool,
    pub announcement: String,
    pub layout: ListLayout,
}

/// How a call to [`ChatController::submit`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    /// Refused before anything was sent. The log is unchanged.
    Rejected(SubmitRejection),
    Completed(IngestSummary),
    /// The transport failed; the fixed error message was appended.
    Failed(ChatError),
}

/// Collaborators injected into a controller.
pub struct ControllerParts {
    pub transport: Arc<dyn ChatTransport>,
    /// May be shared between controllers. A controller that joins another's
    /// pending request receives the finished text in one patch instead of a
    /// stream.
    pub dedup: RequestDeduplicator<IngestSummary, ChatError>,
    pub metrics: MetricsRecorder,
    pub view: ViewConfig,
    pub settings: ChatSettings,
}

impl ControllerParts {
    /// Defaults for everything but the transport.
    #[must_use]
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            dedup: RequestDeduplicator::new(),
            metrics: MetricsRecorder::new(),
            view: ViewConfig::default(),
            settings: ChatSettings::default(),
        }
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

struct ControllerInner {
    conversation: Mutex<Conversation>,
    viewport: Mutex<Viewport>,
    transport: Arc<dyn ChatTransport>,
    dedup: RequestDeduplicator<IngestSummary, ChatError>,
    metrics: MetricsRecorder,
    scroll: Throttle<ScrollRequest>,
    window: WindowConfig,
    snapshots: watch::Sender<ChatSnapshot>,
}

/// Cheap to clone; clones drive the same conversation.
#[derive(Clone)]
pub struct ChatController {
    inner: Arc<ControllerInner>,
}

impl ChatController {
    /// Build a controller. `on_scroll` is the throttled scroll-to-latest sink.
    pub fn new(parts: ControllerParts, on_scroll: impl Fn(ScrollRequest) + Send + Sync + 'static) -> Self {
        let conversation = Conversation::new(parts.settings);
        let viewport = Viewport::default();
        let initial = build_snapshot(&conversation, viewport, &parts.view.window);
        let (snapshots, _) = watch::channel(initial);

        Self {
            inner: Arc::new(ControllerInner {
                conversation: Mutex::new(conversation),
                viewport: Mutex::new(viewport),
                transport: parts.transport,
                dedup: parts.dedup,
                metrics: parts.metrics,
                scroll: Throttle::new(parts.view.scroll_throttle, on_scroll),
                window: parts.view.window,
                snapshots,
            }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> ChatSnapshot {
        let conversation = lock(&self.inner.conversation);
        let viewport = *lock(&self.inner.viewport);
        build_snapshot(&conversation, viewport, &self.inner.window)
    }

    /// Receiver that sees a fresh snapshot after every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.inner.snapshots.subscribe()
    }

    #[must_use]
    pub fn metrics(&self) -> &MetricsRecorder {
        &self.inner.metrics
    }

    pub fn set_input_text(&self, text: impl Into<String>) {
        lock(&self.inner.conversation).set_input_text(text);
        self.publish();
    }

    pub fn set_settings(&self, settings: ChatSettings) {
        lock(&self.inner.conversation).set_settings(settings);
        self.publish();
    }

    /// Flip the settings panel and return the new visibility.
    pub fn toggle_settings_panel(&self) -> bool {
        let visible = lock(&self.inner.conversation).toggle_settings();
        self.publish();
        visible
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        *lock(&self.inner.viewport) = viewport;
        self.publish();
    }

    /// Submit the current input buffer and drive the exchange to its end.
    #[allow(clippy::cast_precision_loss)]
    pub async fn submit(&self) -> ExchangeOutcome {
        let timer = RenderTimer::start();
        let request = {
            let mut conversation = lock(&self.inner.conversation);
            let text = conversation.input_text().to_owned();
            match conversation.submit(&text) {
                Ok(request) => request,
                Err(rejection) => {
                    debug!(%rejection, "exchange: submit rejected");
                    return ExchangeOutcome::Rejected(rejection);
                }
            }
        };

        info!(
            model = %request.model,
            history_len = request.chat_history.len(),
            "exchange: started"
        );
        // Scroll time is attributed to the exchange that caused it.
        self.inner.scroll.take_spent();
        self.publish();
        self.schedule_scroll();

        let key = RequestKey::for_request(&request);
        let user_chars = request.user_message.chars().count();
        let controller = self.clone();
        let mut streamed_here = false;
        let result = self
            .inner
            .dedup
            .deduplicate(key, || {
                streamed_here = true;
                async move { controller.stream_reply(request).await }
            })
            .await;

        match result {
            Ok(summary) => {
                let message_count = {
                    let mut conversation = lock(&self.inner.conversation);
                    if !streamed_here {
                        // Joined another controller's request; its text never reached this log.
                        debug!(text_len = summary.text.len(), "exchange: filling reply from joined request");
                        conversation.open_assistant_placeholder();
                        conversation.patch_assistant_content(&summary.text);
                    }
                    conversation.complete_or_fail(None);
                    conversation.messages().len()
                };
                self.publish();

                let sample = PerformanceSample {
                    render_time_ms: timer.elapsed_ms(),
                    message_count: message_count as f64,
                    average_message_length: user_chars as f64,
                    scroll_performance_ms: duration_ms(self.inner.scroll.take_spent()),
                };
                self.inner.metrics.record(sample);
                info!(
                    chunks = summary.chunks,
                    bytes = summary.bytes,
                    render_time_ms = sample.render_time_ms,
                    "exchange: completed"
                );
                ExchangeOutcome::Completed(summary)
            }
            Err(e) => {
                warn!(error = %e, "exchange: failed");
                lock(&self.inner.conversation).complete_or_fail(Some(ERROR_MESSAGE_TEXT));
                self.publish();
                self.schedule_scroll();
                ExchangeOutcome::Failed(e)
            }
        }
    }

    async fn stream_reply(&self, request: ChatRequest) -> Result<IngestSummary, ChatError> {
        lock(&self.inner.conversation).open_assistant_placeholder();
        self.publish();
        self.schedule_scroll();

        let stream = self.inner.transport.open(&request).await?;
        ingest_stream(stream, |text| {
            let patched = lock(&self.inner.conversation).patch_assistant_content(text);
            if patched {
                self.publish();
                self.schedule_scroll();
            }
        })
        .await
    }

    fn publish(&self) {
        self.inner.snapshots.send_replace(self.snapshot());
    }

    fn schedule_scroll(&self) {
        let count = lock(&self.inner.conversation).messages().len();
        if count > 0 {
            self.inner.scroll.schedule(ScrollRequest { last_index: count - 1 });
        }
    }
}

fn build_snapshot(conversation: &Conversation, viewport: Viewport, window: &WindowConfig) -> ChatSnapshot {
    ChatSnapshot {
        messages: conversation.messages().to_vec(),
        input_text: conversation.input_text().to_owned(),
        is_loading: conversation.is_loading(),
        settings: conversation.settings().clone(),
        show_settings: conversation.show_settings(),
        announcement: conversation.announcement().to_owned(),
        layout: compute_layout(conversation.messages().len(), viewport, window),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "exchange_test.rs"]
mod tests;
