//! In-memory request deduplication.
//!
//! DESIGN
//! ======
//! A table of `RequestKey -> Shared<BoxFuture>` behind a `Mutex`. The first
//! caller for a key invokes the operation and stores its shared future;
//! callers arriving while it is pending await the same future, so an
//! accidental double submission produces one network call and one outcome.
//! The entry is removed by the shared future itself as it settles, on
//! success and on failure alike, so the next identical request starts fresh.
//!
//! TRADE-OFFS
//! ==========
//! Distinct exchanges (different text, model or credential) never collapse.
//! Outcomes must be `Clone` because every waiter receives its own copy.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::debug;

use crate::chat::types::{ChatRequest, credential_suffix};

// =============================================================================
// REQUEST KEY
// =============================================================================

/// Identity of a logical request: text, model and credential suffix.
/// Never persisted or transmitted.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RequestKey(String);

impl RequestKey {
    #[must_use]
    pub fn new(user_text: &str, model: &str, api_key: &str) -> Self {
        Self(format!("{user_text}-{model}-{}", credential_suffix(api_key)))
    }

    #[must_use]
    pub fn for_request(request: &ChatRequest) -> Self {
        Self::new(&request.user_message, &request.model, &request.api_key)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Length only; the key embeds message text.
        write!(f, "RequestKey(len={})", self.0.len())
    }
}

// =============================================================================
// DEDUPLICATOR
// =============================================================================

type SharedOutcome<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

struct PendingEntry<T, E> {
    /// Distinguishes this entry from a later one under the same key.
    id: u64,
    outcome: SharedOutcome<T, E>,
}

struct PendingTable<T, E> {
    next_id: u64,
    entries: HashMap<RequestKey, PendingEntry<T, E>>,
}

/// Shared handle; clones see the same pending table.
pub struct RequestDeduplicator<T, E> {
    pending: Arc<Mutex<PendingTable<T, E>>>,
}

impl<T, E> Clone for RequestDeduplicator<T, E> {
    fn clone(&self) -> Self {
        Self { pending: Arc::clone(&self.pending) }
    }
}

impl<T, E> Default for RequestDeduplicator<T, E> {
    fn default() -> Self {
        Self { pending: Arc::new(Mutex::new(PendingTable { next_id: 0, entries: HashMap::new() })) }
    }
}

impl<T, E> RequestDeduplicator<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `operation` unless an identical request is already pending, in
    /// which case await that request's outcome instead.
    ///
    /// # Errors
    ///
    /// Returns the operation's error, shared with every concurrent waiter.
    pub async fn deduplicate<F, Fut>(&self, key: RequestKey, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let outcome = {
            let mut pending = lock(&self.pending);
            if let Some(existing) = pending.entries.get(&key) {
                debug!(key_len = key.as_str().len(), "dedup: joining pending request");
                existing.outcome.clone()
            } else {
                let id = pending.next_id;
                pending.next_id += 1;
                let table = Arc::clone(&self.pending);
                let settle_key = key.clone();
                let fut = operation();
                let shared = async move {
                    let result = fut.await;
                    let mut pending = lock(&table);
                    if pending.entries.get(&settle_key).is_some_and(|e| e.id == id) {
                        pending.entries.remove(&settle_key);
                    }
                    result
                }
                .boxed()
                .shared();
                pending.entries.insert(key, PendingEntry { id, outcome: shared.clone() });
                shared
            }
        };
        outcome.await
    }

    #[must_use]
    pub fn is_pending(&self, key: &RequestKey) -> bool {
        lock(&self.pending).entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.pending).entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.pending).entries.is_empty()
    }

    /// Forget every pending entry. Requests already awaiting keep running.
    pub fn clear(&self) {
        lock(&self.pending).entries.clear();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "dedup_test.rs"]
mod tests;
