//! Performance metrics for completed exchanges.
//!
//! Append-only list of samples, one per successful exchange, with a
//! component-wise average for display. The list is unbounded and lives for
//! the session; `clear` is the only way to drop samples.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Render time under which an exchange is classed as excellent.
pub const EXCELLENT_RENDER_MS: f64 = 16.0;
/// Render time under which an exchange is classed as good.
pub const GOOD_RENDER_MS: f64 = 33.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerformanceSample {
    /// Wall time from submit to completion.
    pub render_time_ms: f64,
    /// Messages in the log when the sample was taken.
    pub message_count: f64,
    /// Length of the submitted user text, in characters.
    pub average_message_length: f64,
    /// Time spent inside scroll actions during the exchange.
    pub scroll_performance_ms: f64,
}

/// Shared handle to the sample list. Clones see the same samples.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder {
    samples: Arc<Mutex<Vec<PerformanceSample>>>,
}

impl MetricsRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, sample: PerformanceSample) {
        tracing::debug!(render_time_ms = sample.render_time_ms, "metrics: sample recorded");
        lock(&self.samples).push(sample);
    }

    /// Component-wise mean of every sample; all zeros when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> PerformanceSample {
        let samples = lock(&self.samples);
        if samples.is_empty() {
            return PerformanceSample::default();
        }

        let n = samples.len() as f64;
        let sum = samples.iter().fold(PerformanceSample::default(), |acc, s| PerformanceSample {
            render_time_ms: acc.render_time_ms + s.render_time_ms,
            message_count: acc.message_count + s.message_count,
            average_message_length: acc.average_message_length + s.average_message_length,
            scroll_performance_ms: acc.scroll_performance_ms + s.scroll_performance_ms,
        });

        PerformanceSample {
            render_time_ms: sum.render_time_ms / n,
            message_count: sum.message_count / n,
            average_message_length: sum.average_message_length / n,
            scroll_performance_ms: sum.scroll_performance_ms / n,
        }
    }

    pub fn clear(&self) {
        lock(&self.samples).clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.samples).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.samples).is_empty()
    }

    /// Copy of every sample in record order.
    #[must_use]
    pub fn samples(&self) -> Vec<PerformanceSample> {
        lock(&self.samples).clone()
    }
}

// =============================================================================
// TIMING
// =============================================================================

/// Stopwatch for one exchange.
#[derive(Debug, Clone, Copy)]
pub struct RenderTimer {
    started: Instant,
}

impl RenderTimer {
    #[must_use]
    pub fn start() -> Self {
        Self { started: Instant::now() }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        duration_ms(self.elapsed())
    }
}

#[must_use]
pub fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceStatus {
    Excellent,
    Good,
    NeedsOptimization,
}

impl PerformanceStatus {
    /// Classify an average render time in milliseconds.
    #[must_use]
    pub fn from_render_time(render_time_ms: f64) -> Self {
        if render_time_ms < EXCELLENT_RENDER_MS {
            Self::Excellent
        } else if render_time_ms < GOOD_RENDER_MS {
            Self::Good
        } else {
            Self::NeedsOptimization
        }
    }
}

impl fmt::Display for PerformanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsOptimization => "Needs Optimization",
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "metrics_test.rs"]
mod tests;
