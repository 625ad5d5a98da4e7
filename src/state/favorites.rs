// Favorites screen controller.
// Mirrors the store; refreshes whenever any screen toggles a favorite.

use std::sync::Arc;

use crate::favorites::{FavoriteChangedEvent, FavoriteStore, FavoriteSyncBus, Subscription};
use crate::github::SearchResultItem;

use super::render::{EmptyKind, RenderCommand};

pub struct FavoritesSessionController {
    store: Arc<FavoriteStore>,
    bus: Arc<FavoriteSyncBus>,
    subscription: Option<Subscription>,
    items: Vec<SearchResultItem>,
}

impl FavoritesSessionController {
    pub fn new(store: Arc<FavoriteStore>, bus: Arc<FavoriteSyncBus>) -> Self {
        Self {
            store,
            bus,
            subscription: None,
            items: Vec::new(),
        }
    }

    /// Subscribe (once) and read the store.
    pub fn activate(&mut self) -> Vec<RenderCommand> {
        if self.subscription.is_none() {
            self.subscription = Some(self.bus.subscribe());
        }
        vec![self.refresh()]
    }

    pub fn items(&self) -> &[SearchResultItem] {
        &self.items
    }

    /// Remove (or re-add) the favorite at `index` and broadcast the change.
    pub fn toggle_favorite(&mut self, index: usize) {
        let Some(item) = self.items.get(index).cloned() else {
            return;
        };
        let is_favorite = self.store.toggle(&item).is_some();
        self.bus.publish(FavoriteChangedEvent { item, is_favorite });
    }

    /// Re-read the store once per queued change event.
    pub fn pump(&mut self) -> Vec<RenderCommand> {
        let mut pending = 0;
        if let Some(subscription) = self.subscription.as_mut() {
            while subscription.events.try_recv().is_ok() {
                pending += 1;
            }
        }
        (0..pending).map(|_| self.refresh()).collect()
    }

    pub fn teardown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.bus.unsubscribe(subscription.token);
        }
    }

    fn refresh(&mut self) -> RenderCommand {
        self.items = self
            .store
            .list_all()
            .iter()
            .map(|record| record.to_item())
            .collect();
        tracing::debug!(count = self.items.len(), "favorites refreshed");

        if self.items.is_empty() {
            RenderCommand::ShowEmpty(EmptyKind::NoFavorites)
        } else {
            RenderCommand::ShowResults(self.items.clone())
        }
    }
}

impl Drop for FavoritesSessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(login: &str) -> SearchResultItem {
        SearchResultItem::new(login, format!("https://avatars.example/{}", login))
    }

    fn setup() -> (FavoritesSessionController, Arc<FavoriteStore>, Arc<FavoriteSyncBus>) {
        let store = Arc::new(FavoriteStore::in_memory());
        let bus = Arc::new(FavoriteSyncBus::new());
        let controller = FavoritesSessionController::new(Arc::clone(&store), Arc::clone(&bus));
        (controller, store, bus)
    }

    fn toggle(store: &FavoriteStore, bus: &FavoriteSyncBus, login: &str) {
        let item = item(login);
        let is_favorite = store.toggle(&item).is_some();
        bus.publish(FavoriteChangedEvent { item, is_favorite });
    }

    #[test]
    fn test_activate_empty_store() {
        let (mut controller, _store, bus) = setup();
        assert_eq!(
            controller.activate(),
            vec![RenderCommand::ShowEmpty(EmptyKind::NoFavorites)]
        );
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_activate_lists_records() {
        let (mut controller, store, _bus) = setup();
        store.toggle(&item("a"));

        assert_eq!(
            controller.activate(),
            vec![RenderCommand::ShowResults(vec![item("a")])]
        );
    }

    #[test]
    fn test_reactivate_is_a_pure_reread() {
        let (mut controller, store, bus) = setup();
        controller.activate();
        store.toggle(&item("a"));

        assert_eq!(
            controller.activate(),
            vec![RenderCommand::ShowResults(vec![item("a")])]
        );
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_each_event_refreshes() {
        let (mut controller, store, bus) = setup();
        controller.activate();

        toggle(&store, &bus, "a");
        toggle(&store, &bus, "a");

        assert_eq!(
            controller.pump(),
            vec![
                RenderCommand::ShowEmpty(EmptyKind::NoFavorites),
                RenderCommand::ShowEmpty(EmptyKind::NoFavorites),
            ]
        );
        assert!(controller.items().is_empty());
    }

    #[test]
    fn test_toggle_from_list_removes_row() {
        let (mut controller, store, _bus) = setup();
        store.toggle(&item("a"));
        store.toggle(&item("b"));
        controller.activate();

        let index = controller
            .items()
            .iter()
            .position(|i| i.login == "a")
            .unwrap();
        controller.toggle_favorite(index);

        assert!(!store.is_favorite("a"));
        assert_eq!(
            controller.pump(),
            vec![RenderCommand::ShowResults(vec![item("b")])]
        );
    }

    #[test]
    fn test_teardown_stops_refreshes() {
        let (mut controller, store, bus) = setup();
        controller.activate();
        controller.teardown();
        assert_eq!(bus.subscriber_count(), 0);

        toggle(&store, &bus, "a");
        assert!(controller.pump().is_empty());
        assert!(controller.items().is_empty());
    }
}
