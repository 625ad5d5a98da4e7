// Per-row avatar loading.
// Rows are recycled as the list changes; a stale load must never paint a row.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::cache::{FetchCache, Payload};
use crate::github::Fetcher;

/// A finished load, tagged with what the row was bound to when it started.
#[derive(Debug, Clone)]
pub struct ImageLoaded {
    pub slot: usize,
    pub generation: u64,
    pub key: String,
    pub payload: Option<Payload>,
}

/// Loads the image for one display slot.
///
/// A completion is only accepted while the slot is still bound to the same
/// key and generation, so results arriving after `cancel` or a rebind are
/// dropped.
#[derive(Debug)]
pub struct RowImageController {
    slot: usize,
    generation: u64,
    bound_key: Option<String>,
    task: Option<JoinHandle<()>>,
}

impl RowImageController {
    pub fn new(slot: usize, generation: u64) -> Self {
        Self {
            slot,
            generation,
            bound_key: None,
            task: None,
        }
    }

    pub fn bound_key(&self) -> Option<&str> {
        self.bound_key.as_deref()
    }

    /// Whether a completion for the current binding is still to come.
    pub fn is_loading(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Bind to `key` and start loading it.
    ///
    /// A cache hit is returned right away and no task is spawned; otherwise the
    /// result is sent to `sink` when the shared fetch resolves.
    pub fn start<F: Fetcher>(
        &mut self,
        key: &str,
        cache: &Arc<FetchCache<F>>,
        sink: &UnboundedSender<ImageLoaded>,
    ) -> Option<Payload> {
        self.cancel();
        self.bound_key = Some(key.to_string());

        if let Some(hit) = cache.get(key) {
            return Some(hit);
        }

        let cache = Arc::clone(cache);
        let sink = sink.clone();
        let loaded = ImageLoaded {
            slot: self.slot,
            generation: self.generation,
            key: key.to_string(),
            payload: None,
        };
        self.task = Some(tokio::spawn(async move {
            let payload = cache.load(&loaded.key).await;
            let _ = sink.send(ImageLoaded { payload, ..loaded });
        }));
        None
    }

    /// Stop waiting on the current load. The shared fetch itself keeps going.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.bound_key = None;
    }

    /// Whether `loaded` belongs to this row's current binding.
    pub fn accepts(&self, loaded: &ImageLoaded) -> bool {
        loaded.slot == self.slot
            && loaded.generation == self.generation
            && self.bound_key.as_deref() == Some(loaded.key.as_str())
    }
}

impl Drop for RowImageController {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Avatar loaders for every visible row of one list.
pub struct RowImages<F: Fetcher> {
    cache: Arc<FetchCache<F>>,
    rows: HashMap<usize, RowImageController>,
    next_generation: u64,
    tx: UnboundedSender<ImageLoaded>,
    rx: UnboundedReceiver<ImageLoaded>,
}

impl<F: Fetcher> RowImages<F> {
    pub fn new(cache: Arc<FetchCache<F>>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            cache,
            rows: HashMap::new(),
            next_generation: 0,
            tx,
            rx,
        }
    }

    /// Bind `slot` to `url`, dropping whatever it was bound to before.
    ///
    /// Rebinding a slot to the key it already holds keeps the running load.
    /// Once that load has finished its result was already pumped, so the
    /// slot starts over and reports again.
    pub fn bind(&mut self, slot: usize, url: &str) -> Option<Payload> {
        if self
            .rows
            .get(&slot)
            .is_some_and(|row| row.bound_key() == Some(url) && row.is_loading())
        {
            return None;
        }
        self.next_generation += 1;
        let mut row = RowImageController::new(slot, self.next_generation);
        let hit = row.start(url, &self.cache, &self.tx);
        self.rows.insert(slot, row);
        hit
    }

    pub fn release(&mut self, slot: usize) {
        self.rows.remove(&slot);
    }

    /// Release every slot at or past `len`.
    pub fn truncate(&mut self, len: usize) {
        self.rows.retain(|slot, _| *slot < len);
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn is_bound(&self, slot: usize) -> bool {
        self.rows.contains_key(&slot)
    }

    /// Completed loads for slots still bound to the same key.
    pub fn pump(&mut self) -> Vec<(usize, Option<Payload>)> {
        let mut ready = Vec::new();
        while let Ok(loaded) = self.rx.try_recv() {
            match self.rows.get(&loaded.slot) {
                Some(row) if row.accepts(&loaded) => ready.push((loaded.slot, loaded.payload)),
                _ => tracing::trace!(slot = loaded.slot, key = %loaded.key, "dropping stale image"),
            }
        }
        ready
    }
}
