// User detail controller.
// Loads one profile and its avatar; keeps the favorite marker in sync with the bus.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::cache::FetchCache;
use crate::error::{ApiError, NETWORK_ERROR_TITLE};
use crate::favorites::{FavoriteChangedEvent, FavoriteStore, FavoriteSyncBus, Subscription};
use crate::github::{Fetcher, SearchApi, SearchResultItem, UserDetail};

use super::render::RenderCommand;
use super::rows::{ImageLoaded, RowImageController};

pub struct DetailController<A: SearchApi, F: Fetcher> {
    item: SearchResultItem,
    api: Arc<A>,
    cache: Arc<FetchCache<F>>,
    store: Arc<FavoriteStore>,
    bus: Arc<FavoriteSyncBus>,
    subscription: Option<Subscription>,
    detail: Option<UserDetail>,
    request: Option<JoinHandle<()>>,
    avatar: RowImageController,
    detail_tx: UnboundedSender<Result<UserDetail, ApiError>>,
    detail_rx: UnboundedReceiver<Result<UserDetail, ApiError>>,
    image_tx: UnboundedSender<ImageLoaded>,
    image_rx: UnboundedReceiver<ImageLoaded>,
}

impl<A: SearchApi, F: Fetcher> DetailController<A, F> {
    pub fn new(
        item: SearchResultItem,
        api: Arc<A>,
        cache: Arc<FetchCache<F>>,
        store: Arc<FavoriteStore>,
        bus: Arc<FavoriteSyncBus>,
    ) -> Self {
        let (detail_tx, detail_rx) = mpsc::unbounded_channel();
        let (image_tx, image_rx) = mpsc::unbounded_channel();
        Self {
            item,
            api,
            cache,
            store,
            bus,
            subscription: None,
            detail: None,
            request: None,
            avatar: RowImageController::new(0, 0),
            detail_tx,
            detail_rx,
            image_tx,
            image_rx,
        }
    }

    pub fn item(&self) -> &SearchResultItem {
        &self.item
    }

    pub fn detail(&self) -> Option<&UserDetail> {
        self.detail.as_ref()
    }

    /// Subscribe to favorite changes and start loading the profile.
    pub fn activate(&mut self) -> Vec<RenderCommand> {
        if self.subscription.is_none() {
            self.subscription = Some(self.bus.subscribe());
        }

        let api = Arc::clone(&self.api);
        let tx = self.detail_tx.clone();
        let login = self.item.login.clone();
        if let Some(request) = self.request.take() {
            request.abort();
        }
        self.request = Some(tokio::spawn(async move {
            let _ = tx.send(api.get_detail(&login).await);
        }));

        vec![
            RenderCommand::ShowLoading,
            RenderCommand::PatchFavorite(self.store.is_favorite(&self.item.login)),
        ]
    }

    pub fn toggle_favorite(&mut self) {
        let item = self.item.clone();
        let is_favorite = self.store.toggle(&item).is_some();
        self.bus.publish(FavoriteChangedEvent { item, is_favorite });
    }

    /// Apply the loaded profile, avatar and favorite changes on the UI thread.
    pub fn pump(&mut self) -> Vec<RenderCommand> {
        let mut commands = Vec::new();

        while let Ok(result) = self.detail_rx.try_recv() {
            match result {
                Ok(detail) => {
                    let hit = self
                        .avatar
                        .start(&detail.avatar_url, &self.cache, &self.image_tx);
                    commands.push(RenderCommand::ShowDetail(detail.clone()));
                    commands.push(RenderCommand::PatchFavorite(
                        self.store.is_favorite(&self.item.login),
                    ));
                    if hit.is_some() {
                        commands.push(RenderCommand::ShowAvatar(hit));
                    }
                    self.detail = Some(detail);
                }
                Err(e) => {
                    tracing::warn!(login = %self.item.login, error = %e, "detail load failed");
                    commands.push(RenderCommand::ShowError {
                        title: NETWORK_ERROR_TITLE.to_string(),
                        message: e.message(),
                    });
                }
            }
        }

        while let Ok(loaded) = self.image_rx.try_recv() {
            if self.avatar.accepts(&loaded) {
                commands.push(RenderCommand::ShowAvatar(loaded.payload));
            }
        }

        let mut touched = false;
        if let Some(subscription) = self.subscription.as_mut() {
            while let Ok(event) = subscription.events.try_recv() {
                touched |= event.item.login == self.item.login;
            }
        }
        if touched {
            commands.push(RenderCommand::PatchFavorite(
                self.store.is_favorite(&self.item.login),
            ));
        }

        commands
    }

    pub fn teardown(&mut self) {
        if let Some(request) = self.request.take() {
            request.abort();
        }
        self.avatar.cancel();
        if let Some(subscription) = self.subscription.take() {
            self.bus.unsubscribe(subscription.token);
        }
    }
}

impl<A: SearchApi, F: Fetcher> Drop for DetailController<A, F> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::cache::fetch::tests::{CountingFetcher, PNG_1X1};
    use crate::state::search::tests::{MockApi, item, settle};

    type Controller = DetailController<MockApi, CountingFetcher>;

    fn setup(
        detail: Result<UserDetail, ApiError>,
    ) -> (Controller, Arc<FavoriteStore>, Arc<FavoriteSyncBus>) {
        let api = Arc::new(MockApi::default());
        *api.detail.lock().unwrap() = Some(detail);
        let fetcher = CountingFetcher::ok(Duration::from_millis(5));
        let cache = Arc::new(FetchCache::new(fetcher, 8));
        let store = Arc::new(FavoriteStore::in_memory());
        let bus = Arc::new(FavoriteSyncBus::new());
        let controller = DetailController::new(
            item("octocat"),
            api,
            cache,
            Arc::clone(&store),
            Arc::clone(&bus),
        );
        (controller, store, bus)
    }

    fn octocat() -> UserDetail {
        UserDetail {
            login: "octocat".to_string(),
            avatar_url: "https://avatars.example/octocat".to_string(),
            profile_url: "https://github.com/octocat".to_string(),
            display_name: Some("The Octocat".to_string()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_loads_detail_then_avatar() {
        let (mut controller, _store, _bus) = setup(Ok(octocat()));

        assert_eq!(
            controller.activate(),
            vec![RenderCommand::ShowLoading, RenderCommand::PatchFavorite(false)]
        );

        settle(20).await;
        let commands = controller.pump();
        assert_eq!(
            commands,
            vec![
                RenderCommand::ShowDetail(octocat()),
                RenderCommand::PatchFavorite(false),
            ]
        );

        settle(20).await;
        let commands = controller.pump();
        assert_eq!(commands.len(), 1);
        match &commands[0] {
            RenderCommand::ShowAvatar(Some(payload)) => assert_eq!(&payload[..], PNG_1X1),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_shows_error() {
        let (mut controller, _store, _bus) = setup(Err(ApiError::NotFound));
        controller.activate();
        settle(20).await;

        assert_eq!(
            controller.pump(),
            vec![RenderCommand::ShowError {
                title: NETWORK_ERROR_TITLE.to_string(),
                message: ApiError::NotFound.message(),
            }]
        );
        assert!(controller.detail().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_favorite_patch_follows_bus() {
        let (mut controller, store, bus) = setup(Ok(octocat()));
        controller.activate();
        settle(50).await;
        controller.pump();

        // Other users' changes are ignored.
        let other = item("hubot");
        store.toggle(&other);
        bus.publish(FavoriteChangedEvent {
            item: other,
            is_favorite: true,
        });
        assert!(controller.pump().is_empty());

        controller.toggle_favorite();
        assert_eq!(controller.pump(), vec![RenderCommand::PatchFavorite(true)]);
        assert!(store.is_favorite("octocat"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_drops_late_results() {
        let (mut controller, _store, bus) = setup(Ok(octocat()));
        controller.activate();
        controller.teardown();
        assert_eq!(bus.subscriber_count(), 0);

        settle(50).await;
        assert!(controller.pump().is_empty());
    }
}
