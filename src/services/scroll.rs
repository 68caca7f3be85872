//! Throttled scroll-to-latest scheduling.
//!
//! DESIGN
//! ======
//! Leading + trailing throttle. A call made more than `interval` after the
//! last run executes immediately. A call inside the window replaces any
//! deferred run with one that fires when the window closes, carrying the
//! newest argument. A burst of streamed patches therefore costs at most one
//! scroll per interval, plus one final scroll that reflects the latest
//! content.
//!
//! Deferred runs are Tokio tasks tagged with a generation number; a task
//! whose generation has been superseded exits without running.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::warn;

/// Scroll target handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    /// Index of the newest message.
    pub last_index: usize,
}

type Action<T> = Arc<dyn Fn(T) + Send + Sync>;

struct ThrottleState {
    last_run: Option<Instant>,
    generation: u64,
    deferred: Option<JoinHandle<()>>,
    /// Wall time spent inside the action since the last `take_spent`.
    spent: Duration,
    runs: u64,
}

pub struct Throttle<T> {
    interval: Duration,
    action: Action<T>,
    state: Arc<Mutex<ThrottleState>>,
}

impl<T> Clone for Throttle<T> {
    fn clone(&self) -> Self {
        Self { interval: self.interval, action: Arc::clone(&self.action), state: Arc::clone(&self.state) }
    }
}

impl<T: Send + 'static> Throttle<T> {
    pub fn new(interval: Duration, action: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            interval,
            action: Arc::new(action),
            state: Arc::new(Mutex::new(ThrottleState {
                last_run: None,
                generation: 0,
                deferred: None,
                spent: Duration::ZERO,
                runs: 0,
            })),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run the action now or defer it to the end of the current window.
    ///
    /// Deferral needs a Tokio runtime; without one the call runs immediately.
    pub fn schedule(&self, arg: T) {
        let now = Instant::now();
        let mut state = lock(&self.state);
        state.generation += 1;
        if let Some(previous) = state.deferred.take() {
            previous.abort();
        }

        let delay = match state.last_run {
            Some(last) if now.duration_since(last) <= self.interval => self.interval - now.duration_since(last),
            _ => Duration::ZERO,
        };

        if delay.is_zero() {
            state.last_run = Some(now);
            drop(state);
            run_timed(&self.action, &self.state, arg);
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("scroll: no runtime for deferred run, running immediately");
            state.last_run = Some(now);
            drop(state);
            run_timed(&self.action, &self.state, arg);
            return;
        };

        let generation = state.generation;
        let action = Arc::clone(&self.action);
        let shared = Arc::clone(&self.state);
        state.deferred = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut state = lock(&shared);
                if state.generation != generation {
                    return;
                }
                state.last_run = Some(Instant::now());
                state.deferred = None;
            }
            run_timed(&action, &shared, arg);
        }));
    }

    /// Whether a deferred run is waiting for the window to close.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        lock(&self.state).deferred.is_some()
    }

    /// Total actions executed so far.
    #[must_use]
    pub fn runs(&self) -> u64 {
        lock(&self.state).runs
    }

    /// Return the time spent inside the action since the previous call and
    /// reset the counter.
    pub fn take_spent(&self) -> Duration {
        std::mem::take(&mut lock(&self.state).spent)
    }
}

fn run_timed<T>(action: &Action<T>, state: &Mutex<ThrottleState>, arg: T) {
    let started = std::time::Instant::now();
    action(arg);
    let elapsed = started.elapsed();

    let mut state = lock(state);
    state.spent += elapsed;
    state.runs += 1;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "scroll_test.rs"]
mod tests;
