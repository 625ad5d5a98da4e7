// Favorites module.
// Durable favorite set, its persistence backends, and the change bus.

pub mod backend;
pub mod bus;
pub mod store;

pub use backend::{FavoriteBackend, FavoriteRecord, JsonFavorites, MemoryFavorites};
pub use bus::{FavoriteChangedEvent, FavoriteSyncBus, Subscription, SubscriptionToken};
pub use store::FavoriteStore;
