// Favorite sync bus.
// Fans out "favorite toggled" events to every live screen in publish order.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::github::SearchResultItem;

/// A favorite was toggled somewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteChangedEvent {
    pub item: SearchResultItem,
    /// Favorite status right after the toggle.
    pub is_favorite: bool,
}

/// Handle used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

/// A live subscription. The subscriber drains `events` on its own (UI) thread.
#[derive(Debug)]
pub struct Subscription {
    pub token: SubscriptionToken,
    pub events: UnboundedReceiver<FavoriteChangedEvent>,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    subscribers: Vec<(u64, UnboundedSender<FavoriteChangedEvent>)>,
}

/// In-process pub/sub for favorite changes, owned by the composition root.
#[derive(Default)]
pub struct FavoriteSyncBus {
    inner: Mutex<BusInner>,
}

impl FavoriteSyncBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BusInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, tx));
        Subscription {
            token: SubscriptionToken(id),
            events: rx,
        }
    }

    /// Stop delivery to `token`. Unknown tokens are ignored.
    pub fn unsubscribe(&self, token: SubscriptionToken) {
        self.lock().subscribers.retain(|(id, _)| *id != token.0);
    }

    /// Queue `event` for every subscriber.
    ///
    /// The lock is held for the whole fan-out, so concurrent publishers are
    /// serialized and every subscriber sees the same order.
    pub fn publish(&self, event: FavoriteChangedEvent) {
        let mut inner = self.lock();
        tracing::debug!(
            login = %event.item.login,
            favorite = event.is_favorite,
            subscribers = inner.subscribers.len(),
            "publishing favorite change"
        );
        inner
            .subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(login: &str, is_favorite: bool) -> FavoriteChangedEvent {
        FavoriteChangedEvent {
            item: SearchResultItem::new(login, "https://a"),
            is_favorite,
        }
    }

    #[test]
    fn test_delivery_preserves_order() {
        let bus = FavoriteSyncBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(event("x", true));
        bus.publish(event("y", true));
        bus.publish(event("x", false));

        for sub in [&mut a, &mut b] {
            let got: Vec<_> = std::iter::from_fn(|| sub.events.try_recv().ok()).collect();
            assert_eq!(got, vec![event("x", true), event("y", true), event("x", false)]);
        }
    }

    #[test]
    fn test_unsubscribed_gets_nothing() {
        let bus = FavoriteSyncBus::new();
        let mut sub = bus.subscribe();
        let keep = bus.subscribe();

        bus.unsubscribe(sub.token);
        bus.publish(event("x", true));

        assert!(sub.events.try_recv().is_err());
        assert_eq!(bus.subscriber_count(), 1);
        drop(keep);
    }

    #[test]
    fn test_dropped_receivers_are_pruned() {
        let bus = FavoriteSyncBus::new();
        let sub = bus.subscribe();
        drop(sub);

        bus.publish(event("x", true));
        assert_eq!(bus.subscriber_count(), 0);
    }
}
