// State management module.
// Screen controllers, the render boundary and the view models they feed.

pub mod detail;
pub mod favorites;
pub mod render;
pub mod rows;
pub mod search;
pub mod view;

pub use detail::DetailController;
pub use favorites::FavoritesSessionController;
pub use render::{EmptyKind, RenderCommand};
pub use rows::{ImageLoaded, RowImageController, RowImages};
pub use search::{
    DEFAULT_DEBOUNCE, Effect, SearchSession, SearchSessionController, SessionEvent, SessionState,
};
pub use view::{AvatarState, DetailView, ListBody, ListView, Row};
