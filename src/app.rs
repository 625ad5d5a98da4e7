// App state and main event loop.
// Owns the screen controllers, routes keys to them and applies their render commands.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;

use crate::cache::FetchCache;
use crate::favorites::{FavoriteStore, FavoriteSyncBus};
use crate::github::{GitHubClient, RateLimit, SearchResultItem};
use crate::state::{
    DetailController, DetailView, EmptyKind, FavoritesSessionController, ListView,
    RenderCommand, RowImages, SearchSessionController,
};
use crate::ui;

/// Active tab in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Search,
    Favorites,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Search => "Search",
            Tab::Favorites => "Favorites",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Search => Tab::Favorites,
            Tab::Favorites => Tab::Search,
        }
    }
}

/// Where keystrokes go on the Search tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    List,
}

/// An error alert waiting to be dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorAlert {
    pub title: String,
    pub message: String,
}

/// Shared services built once at startup.
pub struct Services {
    pub client: Arc<GitHubClient>,
    pub cache: Arc<FetchCache<GitHubClient>>,
    pub store: Arc<FavoriteStore>,
    pub bus: Arc<FavoriteSyncBus>,
}

/// Main application state.
pub struct App {
    pub active_tab: Tab,
    pub focus: Focus,
    pub input: String,
    pub show_cancel: bool,
    pub search_view: ListView,
    pub favorites_view: ListView,
    pub detail_view: Option<DetailView>,
    pub error: Option<ErrorAlert>,
    pub show_help: bool,
    pub should_quit: bool,
    services: Services,
    search: SearchSessionController<GitHubClient>,
    favorites: FavoritesSessionController,
    detail: Option<DetailController<GitHubClient, GitHubClient>>,
    search_images: RowImages<GitHubClient>,
    favorite_images: RowImages<GitHubClient>,
}

impl App {
    pub fn new(services: Services, debounce: Duration) -> Self {
        let search = SearchSessionController::new(
            Arc::clone(&services.client),
            Arc::clone(&services.store),
            Arc::clone(&services.bus),
            debounce,
        );
        let favorites =
            FavoritesSessionController::new(Arc::clone(&services.store), Arc::clone(&services.bus));
        let search_images = RowImages::new(Arc::clone(&services.cache));
        let favorite_images = RowImages::new(Arc::clone(&services.cache));

        let mut app = Self {
            active_tab: Tab::default(),
            focus: Focus::default(),
            input: String::new(),
            show_cancel: false,
            search_view: ListView::new(EmptyKind::InitialSearch),
            favorites_view: ListView::new(EmptyKind::NoFavorites),
            detail_view: None,
            error: None,
            show_help: false,
            should_quit: false,
            services,
            search,
            favorites,
            detail: None,
            search_images,
            favorite_images,
        };

        let commands = app.search.activate();
        app.apply_search(commands);
        let commands = app.favorites.activate();
        app.apply_favorites(commands);
        app
    }

    pub fn rate_limit(&self) -> RateLimit {
        self.services.client.rate_limit()
    }

    /// Main event loop.
    pub fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> io::Result<()> {
        while !self.should_quit {
            self.pump();
            terminal.draw(|frame| ui::draw(frame, self))?;
            self.handle_events()?;
        }
        self.teardown();
        Ok(())
    }

    /// Drain every controller and image arena into the view models.
    pub fn pump(&mut self) {
        let commands = self.search.pump();
        self.apply_search(commands);

        let commands = self.favorites.pump();
        self.apply_favorites(commands);

        if let Some(detail) = self.detail.as_mut() {
            let commands = detail.pump();
            self.apply_detail(commands);
        }

        for (slot, payload) in self.search_images.pump() {
            self.search_view.set_avatar(slot, payload);
        }
        for (slot, payload) in self.favorite_images.pump() {
            self.favorites_view.set_avatar(slot, payload);
        }
    }

    fn apply_search(&mut self, commands: Vec<RenderCommand>) {
        for command in commands {
            match command {
                RenderCommand::ShowError { title, message } => {
                    self.error = Some(ErrorAlert { title, message });
                }
                RenderCommand::ShowCancelButton(visible) => self.show_cancel = visible,
                command => {
                    let store = &self.services.store;
                    let replaced = self
                        .search_view
                        .apply(command, |login| store.is_favorite(login));
                    if replaced {
                        bind_rows(&mut self.search_view, &mut self.search_images);
                    } else if self.search_view.rows().is_empty() {
                        self.search_images.clear();
                    }
                }
            }
        }
        if self.search_view.rows().is_empty() && self.focus == Focus::List {
            self.focus = Focus::Input;
        }
    }

    fn apply_favorites(&mut self, commands: Vec<RenderCommand>) {
        for command in commands {
            let store = &self.services.store;
            let replaced = self
                .favorites_view
                .apply(command, |login| store.is_favorite(login));
            if replaced {
                bind_rows(&mut self.favorites_view, &mut self.favorite_images);
            } else if self.favorites_view.rows().is_empty() {
                self.favorite_images.clear();
            }
        }
    }

    fn apply_detail(&mut self, commands: Vec<RenderCommand>) {
        for command in commands {
            if let RenderCommand::ShowError { title, message } = &command {
                self.error = Some(ErrorAlert {
                    title: title.clone(),
                    message: message.clone(),
                });
            }
            if let Some(view) = self.detail_view.as_mut() {
                view.apply(command);
            }
        }
    }

    fn open_detail(&mut self, item: SearchResultItem) {
        self.close_detail();
        let mut controller = DetailController::new(
            item.clone(),
            Arc::clone(&self.services.client),
            Arc::clone(&self.services.cache),
            Arc::clone(&self.services.store),
            Arc::clone(&self.services.bus),
        );
        self.detail_view = Some(DetailView::new(item));
        let commands = controller.activate();
        self.detail = Some(controller);
        self.apply_detail(commands);
    }

    fn close_detail(&mut self) {
        if let Some(mut controller) = self.detail.take() {
            controller.teardown();
        }
        self.detail_view = None;
    }

    fn teardown(&mut self) {
        self.close_detail();
        self.search.teardown();
        self.favorites.teardown();
        self.search_images.clear();
        self.favorite_images.clear();
    }

    /// Handle keyboard and other events.
    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        // Overlays take keys first, topmost wins.
        if self.error.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                self.error = None;
            }
            return;
        }
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return;
        }
        if self.detail.is_some() {
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') => self.close_detail(),
                KeyCode::Char('f') => {
                    if let Some(detail) = self.detail.as_mut() {
                        detail.toggle_favorite();
                    }
                }
                _ => {}
            }
            return;
        }

        if key.code == KeyCode::Tab || key.code == KeyCode::BackTab {
            self.switch_tab();
            return;
        }

        match (self.active_tab, self.focus) {
            (Tab::Search, Focus::Input) => self.handle_input_key(key),
            (Tab::Search, Focus::List) => self.handle_search_list_key(key),
            (Tab::Favorites, _) => self.handle_favorites_key(key),
        }
    }

    fn switch_tab(&mut self) {
        self.active_tab = self.active_tab.next();
        if self.active_tab == Tab::Favorites {
            let commands = self.favorites.activate();
            self.apply_favorites(commands);
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => {
                self.input.push(c);
                let commands = self.search.text_changed(self.input.clone());
                self.apply_search(commands);
            }
            KeyCode::Backspace => {
                if self.input.pop().is_some() {
                    let commands = self.search.text_changed(self.input.clone());
                    self.apply_search(commands);
                }
            }
            KeyCode::Enter => {
                let commands = self.search.submit(self.input.clone());
                self.apply_search(commands);
            }
            KeyCode::Esc => {
                self.input.clear();
                let commands = self.search.cancel();
                self.apply_search(commands);
            }
            KeyCode::Down => {
                if !self.search_view.rows().is_empty() {
                    self.focus = Focus::List;
                }
            }
            _ => {}
        }
    }

    fn handle_search_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Esc | KeyCode::Char('/') => self.focus = Focus::Input,
            KeyCode::Down | KeyCode::Char('j') => self.search_view.select_next(),
            KeyCode::Up | KeyCode::Char('k') => {
                if !self.search_view.select_prev() {
                    self.focus = Focus::Input;
                }
            }
            KeyCode::Char('f') => {
                if let Some(index) = self.search_view.selected() {
                    self.search.toggle_favorite(index);
                }
            }
            KeyCode::Enter | KeyCode::Char('o') => {
                if let Some(item) = self.search_view.selected_item().cloned() {
                    self.open_detail(item);
                }
            }
            _ => {}
        }
    }

    fn handle_favorites_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Down | KeyCode::Char('j') => self.favorites_view.select_next(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.favorites_view.select_prev();
            }
            KeyCode::Char('f') => {
                if let Some(index) = self.favorites_view.selected() {
                    self.favorites.toggle_favorite(index);
                }
            }
            KeyCode::Enter | KeyCode::Char('o') => {
                if let Some(item) = self.favorites_view.selected_item().cloned() {
                    self.open_detail(item);
                }
            }
            _ => {}
        }
    }
}

/// Point each row slot at its avatar, reusing loads for unchanged slots.
fn bind_rows(view: &mut ListView, images: &mut RowImages<GitHubClient>) {
    let urls: Vec<String> = view
        .rows()
        .iter()
        .map(|row| row.item.avatar_url.clone())
        .collect();
    images.truncate(urls.len());
    for (slot, url) in urls.iter().enumerate() {
        if let Some(hit) = images.bind(slot, url) {
            view.set_avatar(slot, Some(hit));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let client = Arc::new(GitHubClient::new("http://127.0.0.1:9/", None).unwrap());
        let services = Services {
            cache: Arc::new(FetchCache::new(Arc::clone(&client), 8)),
            client,
            store: Arc::new(FavoriteStore::in_memory()),
            bus: Arc::new(FavoriteSyncBus::new()),
        };
        App::new(services, Duration::from_millis(500))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::from(code));
    }

    #[test]
    fn test_tab_cycle() {
        assert_eq!(Tab::Search.next(), Tab::Favorites);
        assert_eq!(Tab::Favorites.next(), Tab::Search);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_shows_cancel_and_esc_clears() {
        let mut app = app();
        press(&mut app, KeyCode::Char('o'));
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.input, "oc");
        assert!(app.show_cancel);

        press(&mut app, KeyCode::Esc);
        assert!(app.input.is_empty());
        assert!(!app.show_cancel);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tab_switch_and_quit() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.active_tab, Tab::Favorites);
        assert!(app.favorites_view.rows().is_empty());

        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_q_is_text_while_typing() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.input, "q");
        assert!(!app.should_quit);

        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }
}
