// Screen view models.
// Apply render commands into something the ui module can draw directly.

use ratatui::widgets::ListState;

use crate::cache::Payload;
use crate::github::{SearchResultItem, UserDetail};

use super::render::{EmptyKind, RenderCommand};

/// Avatar of a row or the detail popup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AvatarState {
    #[default]
    Pending,
    Loaded(Payload),
    /// Load failed or the payload wasn't an image; draw the placeholder.
    Missing,
}

impl AvatarState {
    fn from_payload(payload: Option<Payload>) -> Self {
        match payload {
            Some(bytes) => AvatarState::Loaded(bytes),
            None => AvatarState::Missing,
        }
    }

    /// Pixel dimensions of a loaded avatar.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        match self {
            AvatarState::Loaded(bytes) => imagesize::blob_size(bytes)
                .ok()
                .map(|size| (size.width, size.height)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Row {
    pub item: SearchResultItem,
    pub favorite: bool,
    pub avatar: AvatarState,
}

/// What a list screen currently shows.
#[derive(Debug, Clone)]
pub enum ListBody {
    Loading,
    Empty(EmptyKind),
    Rows(Vec<Row>),
}

/// List screen model shared by the Search and Favorites tabs.
#[derive(Debug, Clone)]
pub struct ListView {
    pub body: ListBody,
    pub list_state: ListState,
}

impl ListView {
    pub fn new(empty: EmptyKind) -> Self {
        Self {
            body: ListBody::Empty(empty),
            list_state: ListState::default(),
        }
    }

    /// Apply a list-level command. Returns true when the rows were replaced.
    ///
    /// `is_favorite` is consulted for fresh rows only; later changes arrive as
    /// `PatchRow` commands.
    pub fn apply(&mut self, command: RenderCommand, is_favorite: impl Fn(&str) -> bool) -> bool {
        match command {
            RenderCommand::ShowLoading => self.body = ListBody::Loading,
            RenderCommand::ShowEmpty(kind) => {
                self.body = ListBody::Empty(kind);
                self.list_state.select(None);
            }
            RenderCommand::ShowResults(items) => {
                let rows: Vec<Row> = items
                    .into_iter()
                    .map(|item| Row {
                        favorite: is_favorite(&item.login),
                        item,
                        avatar: AvatarState::Pending,
                    })
                    .collect();
                let selected = self
                    .list_state
                    .selected()
                    .map(|i| i.min(rows.len().saturating_sub(1)))
                    .or(Some(0));
                self.list_state.select(selected);
                self.body = ListBody::Rows(rows);
                return true;
            }
            RenderCommand::ScrollToTop => {
                self.list_state = ListState::default().with_selected(Some(0));
            }
            RenderCommand::PatchRow {
                index,
                login,
                favorite,
            } => {
                if let Some(row) = self.rows_mut().get_mut(index) {
                    if row.item.login == login {
                        row.favorite = favorite;
                    }
                }
            }
            other => tracing::trace!(command = ?other, "ignored by list view"),
        }
        false
    }

    pub fn rows(&self) -> &[Row] {
        match &self.body {
            ListBody::Rows(rows) => rows,
            _ => &[],
        }
    }

    fn rows_mut(&mut self) -> &mut [Row] {
        match &mut self.body {
            ListBody::Rows(rows) => rows,
            _ => &mut [],
        }
    }

    pub fn set_avatar(&mut self, index: usize, payload: Option<Payload>) {
        if let Some(row) = self.rows_mut().get_mut(index) {
            row.avatar = AvatarState::from_payload(payload);
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.list_state
            .selected()
            .filter(|&i| i < self.rows().len())
    }

    pub fn selected_item(&self) -> Option<&SearchResultItem> {
        self.selected().map(|i| &self.rows()[i].item)
    }

    pub fn select_next(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i.min(len - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// Select the previous row. Returns false when already at the top.
    pub fn select_prev(&mut self) -> bool {
        match self.list_state.selected() {
            Some(i) if i > 0 => {
                self.list_state.select(Some(i - 1));
                true
            }
            _ => false,
        }
    }
}

/// Detail popup model.
#[derive(Debug, Clone)]
pub struct DetailView {
    pub item: SearchResultItem,
    pub loading: bool,
    pub detail: Option<UserDetail>,
    pub favorite: bool,
    pub avatar: AvatarState,
}

impl DetailView {
    pub fn new(item: SearchResultItem) -> Self {
        Self {
            item,
            loading: false,
            detail: None,
            favorite: false,
            avatar: AvatarState::Pending,
        }
    }

    pub fn apply(&mut self, command: RenderCommand) {
        match command {
            RenderCommand::ShowLoading => self.loading = true,
            RenderCommand::ShowDetail(detail) => {
                self.loading = false;
                self.detail = Some(detail);
            }
            RenderCommand::PatchFavorite(favorite) => self.favorite = favorite,
            RenderCommand::ShowAvatar(payload) => self.avatar = AvatarState::from_payload(payload),
            RenderCommand::ShowError { .. } => self.loading = false,
            other => tracing::trace!(command = ?other, "ignored by detail view"),
        }
    }
}
