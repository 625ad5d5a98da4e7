// In-memory cache for remote payloads (avatar images).
// Bounded LRU storage with single-flight loading per URL.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use tokio::sync::oneshot;

use crate::github::Fetcher;

/// Cached payload bytes, cheap to clone and share between rows.
pub type Payload = Arc<[u8]>;

/// Default number of payloads kept in memory.
pub const DEFAULT_CAPACITY: usize = 256;

type Waiters = Vec<oneshot::Sender<Option<Payload>>>;

struct CacheState {
    entries: LruCache<String, Payload>,
    /// Callers waiting on a fetch, keyed by URL. Keys here are never in `entries`
    /// until their fetch completes, so eviction cannot touch them.
    in_flight: HashMap<String, Waiters>,
}

enum Lookup {
    Hit(Payload),
    Wait(oneshot::Receiver<Option<Payload>>),
}

/// Content-addressed payload cache shared by every row and detail view.
pub struct FetchCache<F: Fetcher> {
    state: Arc<Mutex<CacheState>>,
    fetcher: Arc<F>,
    validate: fn(&[u8]) -> bool,
}

/// Accept payloads whose header parses as a known image format.
pub fn is_image(bytes: &[u8]) -> bool {
    imagesize::blob_size(bytes).is_ok()
}

impl<F: Fetcher> FetchCache<F> {
    /// Create a cache holding at most `capacity` payloads.
    pub fn new(fetcher: Arc<F>, capacity: usize) -> Self {
        Self::with_validator(fetcher, capacity, is_image)
    }

    /// Create a cache with a custom payload check. Payloads failing it are not stored.
    pub fn with_validator(fetcher: Arc<F>, capacity: usize, validate: fn(&[u8]) -> bool) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Arc::new(Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                in_flight: HashMap::new(),
            })),
            fetcher,
            validate,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached payload for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Payload> {
        self.lock().entries.get(key).cloned()
    }

    /// Store a payload under `key`.
    pub fn put(&self, key: impl Into<String>, bytes: Payload) {
        self.lock().entries.put(key.into(), bytes);
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a fetch for `key` is currently outstanding.
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.lock().in_flight.contains_key(key)
    }

    /// Resolve `key` from the cache, or join/start the single fetch for it.
    ///
    /// Resolves to None on transport failure or an undecodable payload. The fetch
    /// runs in its own task, so dropping this future never aborts it for other callers.
    pub async fn load(&self, key: &str) -> Option<Payload> {
        match self.lookup(key) {
            Lookup::Hit(payload) => Some(payload),
            Lookup::Wait(rx) => rx.await.ok().flatten(),
        }
    }

    fn lookup(&self, key: &str) -> Lookup {
        let mut state = self.lock();
        if let Some(hit) = state.entries.get(key) {
            return Lookup::Hit(hit.clone());
        }

        let (tx, rx) = oneshot::channel();
        let start = match state.in_flight.entry(key.to_owned()) {
            Entry::Occupied(mut waiters) => {
                tracing::trace!(key, "joining in-flight fetch");
                waiters.get_mut().push(tx);
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(vec![tx]);
                true
            }
        };
        // The fetch task's guard takes this lock when dropped.
        drop(state);

        if start {
            self.spawn_fetch(key.to_owned());
        }
        Lookup::Wait(rx)
    }

    fn spawn_fetch(&self, key: String) {
        let fetcher = Arc::clone(&self.fetcher);
        let validate = self.validate;
        let guard = InFlightGuard {
            state: Arc::clone(&self.state),
            key,
        };

        tokio::spawn(async move {
            let key = guard.key.as_str();
            let outcome = match fetcher.fetch(key).await {
                Ok(bytes) if validate(&bytes) => Some(Payload::from(bytes)),
                Ok(bytes) => {
                    tracing::warn!(key, len = bytes.len(), "discarding undecodable payload");
                    None
                }
                Err(e) => {
                    tracing::debug!(key, error = %e, "payload fetch failed");
                    None
                }
            };
            guard.finish(outcome);
        });
    }
}

/// Owns a URL's `in_flight` entry for the life of its fetch task.
///
/// If the task panics or is aborted before `finish`, dropping the guard removes
/// the entry, so its waiters see a closed channel and later loads start over.
struct InFlightGuard {
    state: Arc<Mutex<CacheState>>,
    key: String,
}

impl InFlightGuard {
    fn finish(self, outcome: Option<Payload>) {
        let waiters = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(payload) = &outcome {
                state.entries.put(self.key.clone(), payload.clone());
            }
            state.in_flight.remove(&self.key).unwrap_or_default()
        };

        for waiter in waiters {
            // A dropped receiver means that caller lost interest.
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.in_flight.remove(&self.key).is_some() {
            tracing::debug!(key = %self.key, "fetch ended without a result");
        }
    }
}
