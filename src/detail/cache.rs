use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::debug;

use super::{DetailGenerator, GenerationError};
use crate::models::{TicketDetail, TicketDraft};

type DetailResult = Result<TicketDetail, GenerationError>;

/// Keyed store of generated ticket detail with single-flight semantics
///
/// Concurrent `get_or_generate` calls for the same id trigger exactly one
/// generator invocation; every caller observes the same result. Successes
/// are cached for the life of the cache (first write per id wins), failures
/// are not, so a failed ticket can be retried.
///
/// Constructor-injected rather than global so tests get independent caches.
pub struct DetailCache {
    inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    ready: HashMap<String, TicketDetail>,
    in_flight: HashMap<String, broadcast::Sender<DetailResult>>,
}

enum Role {
    Hit(TicketDetail),
    Waiter(broadcast::Receiver<DetailResult>),
    Leader(broadcast::Sender<DetailResult>),
}

impl DetailCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // The lock is only ever held for map lookups, never across an await
        self.inner.lock().expect("detail cache lock poisoned")
    }

    /// Cached detail for an id, if any
    pub fn get(&self, id: &str) -> Option<TicketDetail> {
        self.lock().ready.get(id).cloned()
    }

    /// Whether detail is already cached for an id
    pub fn contains(&self, id: &str) -> bool {
        self.lock().ready.contains_key(id)
    }

    /// Seed the cache with already-generated detail; an existing entry for
    /// the id is kept (first write wins)
    pub fn insert(&self, id: &str, detail: TicketDetail) {
        self.lock().ready.entry(id.to_string()).or_insert(detail);
    }

    /// Return cached detail or generate it, with at most one generation in
    /// flight per id
    ///
    /// The first caller for an uncached id becomes the leader and invokes
    /// the generator; callers arriving while that generation is outstanding
    /// wait for the leader's result instead of generating again. On success
    /// the result is cached; on failure nothing is, and a later call
    /// retries.
    pub async fn get_or_generate(
        &self,
        draft: &TicketDraft,
        generator: &dyn DetailGenerator,
    ) -> DetailResult {
        let role = {
            let mut inner = self.lock();
            if let Some(detail) = inner.ready.get(&draft.id) {
                Role::Hit(detail.clone())
            } else if let Some(tx) = inner.in_flight.get(&draft.id) {
                Role::Waiter(tx.subscribe())
            } else {
                let (tx, _) = broadcast::channel(1);
                inner.in_flight.insert(draft.id.clone(), tx.clone());
                Role::Leader(tx)
            }
        };

        match role {
            Role::Hit(detail) => Ok(detail),
            Role::Waiter(mut rx) => {
                debug!(ticket_id = %draft.id, "waiting on in-flight generation");
                rx.recv()
                    .await
                    .unwrap_or_else(|_| Err(GenerationError::Interrupted))
            }
            Role::Leader(tx) => {
                let mut guard = InFlightGuard {
                    cache: self,
                    id: &draft.id,
                    armed: true,
                };
                let result = generator.generate(draft).await;

                let resolved = {
                    let mut inner = self.lock();
                    inner.in_flight.remove(&draft.id);
                    match result {
                        // A concurrent write may have landed first; whatever
                        // is in the map is what everyone observes
                        Ok(detail) => Ok(inner
                            .ready
                            .entry(draft.id.clone())
                            .or_insert(detail)
                            .clone()),
                        Err(err) => Err(err),
                    }
                };
                guard.armed = false;

                // Waiters may have all gone away; that is fine
                let _ = tx.send(resolved.clone());
                resolved
            }
        }
    }
}

impl Default for DetailCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the in-flight entry if the leader is dropped mid-generation, so
/// waiters fail fast and later callers can retry
struct InFlightGuard<'a> {
    cache: &'a DetailCache,
    id: &'a str,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.cache.lock().in_flight.remove(self.id);
        }
    }
}
