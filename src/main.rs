// ghsearch entry point.
// Builds the shared services once and hands them to the TUI loop.

use std::sync::Arc;

use ghsearch::app::{App, Services};
use ghsearch::cache::FetchCache;
use ghsearch::config::Config;
use ghsearch::error::Result;
use ghsearch::favorites::{FavoriteStore, FavoriteSyncBus, JsonFavorites};
use ghsearch::github::GitHubClient;
use ghsearch::logging;

fn main() -> Result<()> {
    let config = Config::load()?;
    logging::init(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting ghsearch");

    let runtime = tokio::runtime::Runtime::new()?;
    // Controllers spawn onto this runtime from the UI thread.
    let _guard = runtime.enter();

    let client = Arc::new(GitHubClient::from_env(&config.api_base)?);
    let store = match config.favorites_file() {
        Some(path) => FavoriteStore::open(JsonFavorites::new(path)),
        None => {
            tracing::warn!("no data directory, favorites will not be saved");
            FavoriteStore::in_memory()
        }
    };
    let services = Services {
        cache: Arc::new(FetchCache::new(
            Arc::clone(&client),
            config.image_cache_capacity,
        )),
        client,
        store: Arc::new(store),
        bus: Arc::new(FavoriteSyncBus::new()),
    };

    let mut app = App::new(services, config.debounce());

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!(error = %e, "terminal error");
    }
    tracing::info!("exiting");
    Ok(result?)
}
