// Render boundary.
// Controllers describe what to show; the presentation layer decides how.

use crate::cache::Payload;
use crate::github::{SearchResultItem, UserDetail};

/// Which empty-state message a screen should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyKind {
    /// Nothing typed yet.
    InitialSearch,
    /// A search finished with no rows (or failed).
    NoResults,
    /// The favorites list is empty.
    NoFavorites,
}

impl EmptyKind {
    pub fn title(&self) -> &'static str {
        match self {
            EmptyKind::InitialSearch => "Search GitHub users",
            EmptyKind::NoResults => "No results",
            EmptyKind::NoFavorites => "No favorites yet",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            EmptyKind::InitialSearch => "Start typing a username to search.",
            EmptyKind::NoResults => "Try a different search term.",
            EmptyKind::NoFavorites => "Press f on a user to add it to your favorites.",
        }
    }
}

/// A state-change notification for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCommand {
    ShowLoading,
    ShowEmpty(EmptyKind),
    ShowResults(Vec<SearchResultItem>),
    /// Emitted once per transition into a populated result list.
    ScrollToTop,
    /// Refresh the favorite marker of a single row in place.
    PatchRow {
        index: usize,
        login: String,
        favorite: bool,
    },
    ShowError {
        title: String,
        message: String,
    },
    ShowCancelButton(bool),
    ShowDetail(UserDetail),
    /// Favorite marker of the detail screen.
    PatchFavorite(bool),
    /// Avatar of the detail screen; None means show the placeholder.
    ShowAvatar(Option<Payload>),
}
