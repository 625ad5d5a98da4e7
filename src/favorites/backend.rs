// Durable storage behind the favorite store.
// The store only needs load-all and persist-all; the engine is swappable.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{read_json, write_json};
use crate::error::{AppError, Result};
use crate::github::SearchResultItem;

/// A favorited user. A record existing for a login means that login is a favorite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub login: String,
    pub avatar_url: String,
    pub saved_at: DateTime<Utc>,
}

impl FavoriteRecord {
    pub fn from_item(item: &SearchResultItem) -> Self {
        Self {
            login: item.login.clone(),
            avatar_url: item.avatar_url.clone(),
            saved_at: Utc::now(),
        }
    }

    pub fn to_item(&self) -> SearchResultItem {
        SearchResultItem::new(self.login.clone(), self.avatar_url.clone())
    }
}

/// Persistence engine for favorite records.
pub trait FavoriteBackend: Send + Sync {
    /// Load every stored record.
    fn load(&self) -> Result<Vec<FavoriteRecord>>;

    /// Replace the stored records with `records`.
    fn persist(&self, records: &[FavoriteRecord]) -> Result<()>;
}

/// On-disk document format.
#[derive(Debug, Serialize, Deserialize)]
struct FavoritesFile {
    /// Version of the storage format for future migrations.
    version: u32,
    #[serde(default)]
    favorites: Vec<FavoriteRecord>,
}

const FORMAT_VERSION: u32 = 1;

/// JSON file backend with atomic writes.
pub struct JsonFavorites {
    path: PathBuf,
}

impl JsonFavorites {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl FavoriteBackend for JsonFavorites {
    fn load(&self) -> Result<Vec<FavoriteRecord>> {
        match read_json::<FavoritesFile>(&self.path)? {
            Some(file) if file.version == FORMAT_VERSION => Ok(file.favorites),
            Some(file) => Err(AppError::Other(format!(
                "unsupported favorites format version {}",
                file.version
            ))),
            None => Ok(Vec::new()),
        }
    }

    fn persist(&self, records: &[FavoriteRecord]) -> Result<()> {
        let file = FavoritesFile {
            version: FORMAT_VERSION,
            favorites: records.to_vec(),
        };
        write_json(&self.path, &file)
    }
}

/// In-memory backend, used when no data directory is available and in tests.
#[derive(Default)]
pub struct MemoryFavorites {
    records: Mutex<Vec<FavoriteRecord>>,
    fail_writes: bool,
}

impl MemoryFavorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose writes always fail.
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_writes: true,
        }
    }

    /// Records as last persisted.
    pub fn snapshot(&self) -> Vec<FavoriteRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FavoriteBackend for MemoryFavorites {
    fn load(&self) -> Result<Vec<FavoriteRecord>> {
        Ok(self.snapshot())
    }

    fn persist(&self, records: &[FavoriteRecord]) -> Result<()> {
        if self.fail_writes {
            return Err(AppError::Other("favorites write rejected".to_string()));
        }
        *self.records.lock().unwrap_or_else(PoisonError::into_inner) = records.to_vec();
        Ok(())
    }
}
