// Favorite store.
// Source of truth for favorite status, shared by every screen.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::github::SearchResultItem;

use super::backend::{FavoriteBackend, FavoriteRecord, MemoryFavorites};

/// Durable set of favorited logins.
///
/// Every operation is synchronous and takes one internal lock, so `toggle` is
/// never observed half-applied. Backend write failures are logged and swallowed;
/// the in-memory set stays authoritative for the process lifetime.
pub struct FavoriteStore {
    records: Mutex<HashMap<String, FavoriteRecord>>,
    backend: Box<dyn FavoriteBackend>,
}

impl FavoriteStore {
    /// Open a store over `backend`, starting empty if the backend can't be read.
    pub fn open(backend: impl FavoriteBackend + 'static) -> Self {
        let loaded = backend.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load favorites, starting empty");
            Vec::new()
        });
        tracing::debug!(count = loaded.len(), "favorites loaded");

        let records = loaded
            .into_iter()
            .map(|record| (record.login.clone(), record))
            .collect();

        Self {
            records: Mutex::new(records),
            backend: Box::new(backend),
        }
    }

    /// A store that keeps nothing on disk.
    pub fn in_memory() -> Self {
        Self::open(MemoryFavorites::new())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, FavoriteRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_favorite(&self, login: &str) -> bool {
        self.lock().contains_key(login)
    }

    /// Insert or update the record for `record.login`, keeping its original save time.
    pub fn save(&self, record: FavoriteRecord) {
        let mut records = self.lock();
        records
            .entry(record.login.clone())
            .and_modify(|existing| existing.avatar_url = record.avatar_url.clone())
            .or_insert(record);
        self.flush(&records);
    }

    /// Remove the record for `login`. Missing logins are a no-op.
    pub fn remove(&self, login: &str) {
        let mut records = self.lock();
        if records.remove(login).is_some() {
            self.flush(&records);
        }
    }

    /// Flip the favorite status of `item`, returning the record if it is now a favorite.
    pub fn toggle(&self, item: &SearchResultItem) -> Option<FavoriteRecord> {
        let mut records = self.lock();
        let now = if records.remove(&item.login).is_some() {
            None
        } else {
            let record = FavoriteRecord::from_item(item);
            records.insert(record.login.clone(), record.clone());
            Some(record)
        };
        tracing::debug!(login = %item.login, favorite = now.is_some(), "favorite toggled");
        self.flush(&records);
        now
    }

    /// All records, oldest first.
    pub fn list_all(&self) -> Vec<FavoriteRecord> {
        let mut list: Vec<FavoriteRecord> = self.lock().values().cloned().collect();
        sorted(&mut list);
        list
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn flush(&self, records: &HashMap<String, FavoriteRecord>) {
        let mut list: Vec<FavoriteRecord> = records.values().cloned().collect();
        sorted(&mut list);
        if let Err(e) = self.backend.persist(&list) {
            tracing::warn!(error = %e, "failed to persist favorites");
        }
    }
}

fn sorted(list: &mut [FavoriteRecord]) {
    list.sort_by(|a, b| a.saved_at.cmp(&b.saved_at).then_with(|| a.login.cmp(&b.login)));
}
