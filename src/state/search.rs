// Search session state machine and its controller.
// Debounces keystrokes, keeps one live query, and ignores stale responses.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::error::{ApiError, NETWORK_ERROR_TITLE};
use crate::favorites::{FavoriteChangedEvent, FavoriteStore, FavoriteSyncBus, Subscription};
use crate::github::{SearchApi, SearchResultItem};

use super::render::{EmptyKind, RenderCommand};

/// Default quiet period before typed text becomes a query.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Current state of a search session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Loading,
    Populated(Vec<SearchResultItem>),
    Empty,
}

/// Input to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    TextChanged(String),
    SubmitPressed(String),
    CancelPressed,
    /// The debounce timer armed with `generation` elapsed.
    DebounceFired { generation: u64 },
    QueryResolved {
        seq: u64,
        result: Result<Vec<SearchResultItem>, ApiError>,
    },
    /// A favorite changed; `favorite` is the live status from the store.
    FavoriteChanged { login: String, favorite: bool },
}

/// Work the state machine asks its driver to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start (or restart) the debounce timer.
    ArmDebounce { generation: u64 },
    CancelDebounce,
    IssueQuery { seq: u64, query: String },
    Render(RenderCommand),
}

/// Pure search session state machine.
///
/// Owns the session state, the debounce generation and the query sequence
/// number. It never touches timers or the network; see
/// [`SearchSessionController`] for the driver.
#[derive(Debug, Default)]
pub struct SearchSession {
    state: SessionState,
    /// Sequence number of the only query whose result may still be applied.
    live_seq: Option<u64>,
    next_seq: u64,
    generation: u64,
    pending_text: Option<String>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Sequence number of the query currently awaited, if any.
    pub fn live_seq(&self) -> Option<u64> {
        self.live_seq
    }

    /// Render commands describing the current state, for first display.
    pub fn snapshot(&self) -> Vec<RenderCommand> {
        match &self.state {
            SessionState::Idle => vec![RenderCommand::ShowEmpty(EmptyKind::InitialSearch)],
            SessionState::Loading => vec![RenderCommand::ShowLoading],
            SessionState::Populated(items) => vec![RenderCommand::ShowResults(items.clone())],
            SessionState::Empty => vec![RenderCommand::ShowEmpty(EmptyKind::NoResults)],
        }
    }

    /// Apply one event and return the effects it produces.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::TextChanged(text) if text.is_empty() => {
                let mut effects = self.cancel_debounce();
                self.live_seq = None;
                effects.push(Effect::Render(RenderCommand::ShowCancelButton(false)));
                effects.extend(self.enter(SessionState::Idle));
                effects
            }
            SessionEvent::TextChanged(text) => {
                self.generation += 1;
                self.pending_text = Some(text);
                vec![
                    Effect::Render(RenderCommand::ShowCancelButton(true)),
                    Effect::ArmDebounce {
                        generation: self.generation,
                    },
                ]
            }
            SessionEvent::SubmitPressed(text) => self.submit(text),
            SessionEvent::CancelPressed => {
                let mut effects = self.cancel_debounce();
                self.live_seq = None;
                effects.push(Effect::Render(RenderCommand::ShowCancelButton(false)));
                effects.extend(self.enter(SessionState::Idle));
                effects
            }
            SessionEvent::DebounceFired { generation } => {
                if generation != self.generation {
                    tracing::trace!(generation, "ignoring superseded debounce");
                    return Vec::new();
                }
                match self.pending_text.take() {
                    Some(text) => self.submit(text),
                    None => Vec::new(),
                }
            }
            SessionEvent::QueryResolved { seq, result } => {
                if self.live_seq != Some(seq) {
                    tracing::debug!(seq, live = ?self.live_seq, "discarding stale query result");
                    return Vec::new();
                }
                self.live_seq = None;
                match result {
                    Ok(items) if items.is_empty() => self.enter(SessionState::Empty),
                    Ok(items) => self.enter(SessionState::Populated(items)),
                    Err(e) => {
                        tracing::warn!(seq, error = %e, "search failed");
                        let mut effects = self.enter(SessionState::Empty);
                        effects.push(Effect::Render(RenderCommand::ShowError {
                            title: NETWORK_ERROR_TITLE.to_string(),
                            message: e.message(),
                        }));
                        effects
                    }
                }
            }
            SessionEvent::FavoriteChanged { login, favorite } => {
                let SessionState::Populated(items) = &self.state else {
                    return Vec::new();
                };
                match items.iter().position(|item| item.login == login) {
                    Some(index) => vec![Effect::Render(RenderCommand::PatchRow {
                        index,
                        login,
                        favorite,
                    })],
                    None => Vec::new(),
                }
            }
        }
    }

    fn submit(&mut self, text: String) -> Vec<Effect> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut effects = self.cancel_debounce();
        self.next_seq += 1;
        let seq = self.next_seq;
        self.live_seq = Some(seq);
        effects.extend(self.enter(SessionState::Loading));
        effects.push(Effect::IssueQuery { seq, query: text });
        effects
    }

    fn cancel_debounce(&mut self) -> Vec<Effect> {
        // Bumping the generation makes any already-fired timer a no-op.
        self.generation += 1;
        self.pending_text = None;
        vec![Effect::CancelDebounce]
    }

    fn enter(&mut self, next: SessionState) -> Vec<Effect> {
        tracing::debug!(from = state_name(&self.state), to = state_name(&next), "search state");
        let effects = match &next {
            SessionState::Idle => vec![Effect::Render(RenderCommand::ShowEmpty(
                EmptyKind::InitialSearch,
            ))],
            SessionState::Loading => vec![Effect::Render(RenderCommand::ShowLoading)],
            SessionState::Populated(items) => vec![
                Effect::Render(RenderCommand::ShowResults(items.clone())),
                Effect::Render(RenderCommand::ScrollToTop),
            ],
            SessionState::Empty => vec![Effect::Render(RenderCommand::ShowEmpty(
                EmptyKind::NoResults,
            ))],
        };
        self.state = next;
        effects
    }
}

fn state_name(state: &SessionState) -> &'static str {
    match state {
        SessionState::Idle => "idle",
        SessionState::Loading => "loading",
        SessionState::Populated(_) => "populated",
        SessionState::Empty => "empty",
    }
}

/// Completions posted back from timer and query tasks.
#[derive(Debug)]
enum Completion {
    Debounce {
        generation: u64,
    },
    Query {
        seq: u64,
        result: Result<Vec<SearchResultItem>, ApiError>,
    },
}

/// Drives a [`SearchSession`] on the tokio runtime.
///
/// Timer and query tasks run anywhere; their completions are queued and only
/// applied when the UI thread calls [`pump`](Self::pump).
pub struct SearchSessionController<A: SearchApi> {
    session: SearchSession,
    api: Arc<A>,
    store: Arc<FavoriteStore>,
    bus: Arc<FavoriteSyncBus>,
    subscription: Option<Subscription>,
    debounce: Duration,
    timer: Option<JoinHandle<()>>,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
}

impl<A: SearchApi> SearchSessionController<A> {
    pub fn new(
        api: Arc<A>,
        store: Arc<FavoriteStore>,
        bus: Arc<FavoriteSyncBus>,
        debounce: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = Some(bus.subscribe());
        Self {
            session: SearchSession::new(),
            api,
            store,
            bus,
            subscription,
            debounce,
            timer: None,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    /// Items of the populated state, or an empty slice.
    pub fn items(&self) -> &[SearchResultItem] {
        match self.session.state() {
            SessionState::Populated(items) => items,
            _ => &[],
        }
    }

    /// Render commands for the current state.
    pub fn activate(&self) -> Vec<RenderCommand> {
        self.session.snapshot()
    }

    pub fn text_changed(&mut self, text: impl Into<String>) -> Vec<RenderCommand> {
        self.apply(SessionEvent::TextChanged(text.into()))
    }

    pub fn submit(&mut self, text: impl Into<String>) -> Vec<RenderCommand> {
        self.apply(SessionEvent::SubmitPressed(text.into()))
    }

    pub fn cancel(&mut self) -> Vec<RenderCommand> {
        self.apply(SessionEvent::CancelPressed)
    }

    /// Toggle the favorite status of a populated row and broadcast the change.
    ///
    /// The row patch itself arrives through the bus on the next [`pump`](Self::pump).
    pub fn toggle_favorite(&mut self, index: usize) {
        let Some(item) = self.items().get(index).cloned() else {
            return;
        };
        let is_favorite = self.store.toggle(&item).is_some();
        self.bus.publish(FavoriteChangedEvent { item, is_favorite });
    }

    /// Apply every queued completion and bus event on the calling (UI) thread.
    pub fn pump(&mut self) -> Vec<RenderCommand> {
        let mut commands = Vec::new();

        while let Ok(completion) = self.rx.try_recv() {
            let event = match completion {
                Completion::Debounce { generation } => SessionEvent::DebounceFired { generation },
                Completion::Query { seq, result } => SessionEvent::QueryResolved { seq, result },
            };
            commands.extend(self.apply(event));
        }

        let mut changed = Vec::new();
        if let Some(subscription) = self.subscription.as_mut() {
            while let Ok(event) = subscription.events.try_recv() {
                changed.push(event.item.login);
            }
        }
        for login in changed {
            let favorite = self.store.is_favorite(&login);
            commands.extend(self.apply(SessionEvent::FavoriteChanged { login, favorite }));
        }

        commands
    }

    /// Stop timers and leave the bus. Safe to call more than once.
    pub fn teardown(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if let Some(subscription) = self.subscription.take() {
            self.bus.unsubscribe(subscription.token);
        }
    }

    fn apply(&mut self, event: SessionEvent) -> Vec<RenderCommand> {
        let mut commands = Vec::new();
        for effect in self.session.handle(event) {
            match effect {
                Effect::ArmDebounce { generation } => self.arm_timer(generation),
                Effect::CancelDebounce => {
                    if let Some(timer) = self.timer.take() {
                        timer.abort();
                    }
                }
                Effect::IssueQuery { seq, query } => self.issue_query(seq, query),
                Effect::Render(command) => commands.push(command),
            }
        }
        commands
    }

    fn arm_timer(&mut self, generation: u64) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        let tx = self.tx.clone();
        let delay = self.debounce;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Completion::Debounce { generation });
        }));
    }

    fn issue_query(&self, seq: u64, query: String) {
        tracing::info!(seq, query = %query, "issuing search");
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.search(&query).await.map(|response| response.items);
            let _ = tx.send(Completion::Query { seq, result });
        });
    }
}

impl<A: SearchApi> Drop for SearchSessionController<A> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::github::{SearchResponse, UserDetail};

    /// Scripted API: per-query delay and outcome, recording every call.
    #[derive(Default)]
    pub(crate) struct MockApi {
        pub queries: Mutex<Vec<String>>,
        pub details: Mutex<Vec<String>>,
        pub scripted: Mutex<HashMap<String, (Duration, Result<Vec<SearchResultItem>, ApiError>)>>,
        pub detail: Mutex<Option<Result<UserDetail, ApiError>>>,
    }

    impl MockApi {
        pub(crate) fn script(
            &self,
            query: &str,
            delay: Duration,
            result: Result<Vec<SearchResultItem>, ApiError>,
        ) {
            self.scripted
                .lock()
                .unwrap()
                .insert(query.to_string(), (delay, result));
        }

        pub(crate) fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    impl SearchApi for MockApi {
        async fn search(&self, query: &str) -> Result<SearchResponse, ApiError> {
            self.queries.lock().unwrap().push(query.to_string());
            let scripted = self.scripted.lock().unwrap().get(query).cloned();
            let (delay, result) = scripted.unwrap_or((Duration::ZERO, Ok(Vec::new())));
            tokio::time::sleep(delay).await;
            result.map(|items| SearchResponse { items })
        }

        async fn get_detail(&self, login: &str) -> Result<UserDetail, ApiError> {
            self.details.lock().unwrap().push(login.to_string());
            let detail = self.detail.lock().unwrap().clone();
            tokio::time::sleep(Duration::from_millis(10)).await;
            detail.unwrap_or(Err(ApiError::NotFound))
        }
    }

    pub(crate) fn item(login: &str) -> SearchResultItem {
        SearchResultItem::new(login, format!("https://avatars.example/{}", login))
    }

    /// Let spawned tasks run; with a paused clock this also advances time.
    pub(crate) async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    fn controller(
        api: &Arc<MockApi>,
    ) -> (
        SearchSessionController<MockApi>,
        Arc<FavoriteStore>,
        Arc<FavoriteSyncBus>,
    ) {
        let store = Arc::new(FavoriteStore::in_memory());
        let bus = Arc::new(FavoriteSyncBus::new());
        let controller = SearchSessionController::new(
            Arc::clone(api),
            Arc::clone(&store),
            Arc::clone(&bus),
            DEFAULT_DEBOUNCE,
        );
        (controller, store, bus)
    }

    fn count(commands: &[RenderCommand], wanted: &RenderCommand) -> usize {
        commands.iter().filter(|c| *c == wanted).count()
    }

    #[test]
    fn test_machine_ignores_stale_sequence() {
        let mut session = SearchSession::new();
        let first = session.handle(SessionEvent::SubmitPressed("alice".into()));
        assert!(first.contains(&Effect::IssueQuery {
            seq: 1,
            query: "alice".into()
        }));
        session.handle(SessionEvent::SubmitPressed("bob".into()));
        assert_eq!(session.live_seq(), Some(2));

        let effects = session.handle(SessionEvent::QueryResolved {
            seq: 1,
            result: Ok(vec![item("alice")]),
        });
        assert!(effects.is_empty());
        assert_eq!(session.state(), &SessionState::Loading);
    }

    #[test]
    fn test_machine_superseded_debounce_is_ignored() {
        let mut session = SearchSession::new();
        session.handle(SessionEvent::TextChanged("a".into()));
        session.handle(SessionEvent::TextChanged("ab".into()));

        assert!(session.handle(SessionEvent::DebounceFired { generation: 1 }).is_empty());
        let effects = session.handle(SessionEvent::DebounceFired { generation: 2 });
        assert!(effects.contains(&Effect::IssueQuery {
            seq: 1,
            query: "ab".into()
        }));
    }

    #[test]
    fn test_machine_empty_submit_is_ignored() {
        let mut session = SearchSession::new();
        assert!(session.handle(SessionEvent::SubmitPressed(String::new())).is_empty());
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[test]
    fn test_machine_cancel_after_fire_drops_pending() {
        let mut session = SearchSession::new();
        session.handle(SessionEvent::TextChanged("a".into()));
        session.handle(SessionEvent::CancelPressed);

        // The timer already fired before cancellation reached it.
        assert!(session.handle(SessionEvent::DebounceFired { generation: 1 }).is_empty());
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_issues_one_query() {
        let api = Arc::new(MockApi::default());
        api.script("min", Duration::from_millis(20), Ok(vec![item("MineRala")]));
        let (mut controller, _store, _bus) = controller(&api);

        controller.text_changed("m");
        settle(100).await;
        controller.text_changed("mi");
        settle(100).await;
        controller.text_changed("min");

        // Quiet for less than the debounce window: nothing yet.
        settle(400).await;
        assert!(controller.pump().is_empty());
        assert!(api.queries().is_empty());

        settle(150).await;
        let commands = controller.pump();
        assert_eq!(commands, vec![RenderCommand::ShowLoading]);
        assert_eq!(controller.state(), &SessionState::Loading);

        settle(50).await;
        let commands = controller.pump();
        assert_eq!(api.queries(), vec!["min".to_string()]);
        assert_eq!(
            controller.state(),
            &SessionState::Populated(vec![item("MineRala")])
        );
        assert_eq!(count(&commands, &RenderCommand::ScrollToTop), 1);
        assert_eq!(
            count(&commands, &RenderCommand::ShowResults(vec![item("MineRala")])),
            1
        );

        // Nothing further fires on later pumps.
        settle(1000).await;
        assert!(controller.pump().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_does_not_override_newer_query() {
        let api = Arc::new(MockApi::default());
        api.script("alice", Duration::from_millis(300), Ok(vec![item("alice")]));
        api.script("bob", Duration::from_millis(50), Ok(vec![item("bob")]));
        let (mut controller, _store, _bus) = controller(&api);

        controller.submit("alice");
        settle(10).await;
        controller.submit("bob");

        settle(100).await;
        controller.pump();
        assert_eq!(controller.state(), &SessionState::Populated(vec![item("bob")]));

        settle(400).await;
        assert!(controller.pump().is_empty());
        assert_eq!(controller.state(), &SessionState::Populated(vec![item("bob")]));
        assert_eq!(api.queries(), vec!["alice".to_string(), "bob".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_text_goes_idle_immediately() {
        let api = Arc::new(MockApi::default());
        api.script("octo", Duration::ZERO, Ok(vec![item("octocat")]));
        let (mut controller, _store, _bus) = controller(&api);

        controller.submit("octo");
        settle(1).await;
        controller.pump();
        assert!(matches!(controller.state(), SessionState::Populated(_)));

        let commands = controller.text_changed("");
        assert_eq!(controller.state(), &SessionState::Idle);
        assert!(commands.contains(&RenderCommand::ShowEmpty(EmptyKind::InitialSearch)));
        assert!(commands.contains(&RenderCommand::ShowCancelButton(false)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_text_discards_in_flight_result() {
        let api = Arc::new(MockApi::default());
        api.script("octo", Duration::from_millis(100), Ok(vec![item("octocat")]));
        let (mut controller, _store, _bus) = controller(&api);

        controller.submit("octo");
        controller.text_changed("");
        settle(200).await;

        assert!(controller.pump().is_empty());
        assert_eq!(controller.state(), &SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_becomes_empty_with_message() {
        let api = Arc::new(MockApi::default());
        api.script("ghost", Duration::from_millis(5), Err(ApiError::NotFound));
        let (mut controller, _store, _bus) = controller(&api);

        controller.submit("ghost");
        settle(10).await;
        let commands = controller.pump();

        assert_eq!(controller.state(), &SessionState::Empty);
        assert!(commands.contains(&RenderCommand::ShowEmpty(EmptyKind::NoResults)));
        assert!(commands.contains(&RenderCommand::ShowError {
            title: NETWORK_ERROR_TITLE.to_string(),
            message: ApiError::NotFound.message(),
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_result_list() {
        let api = Arc::new(MockApi::default());
        let (mut controller, _store, _bus) = controller(&api);

        controller.submit("zzzz");
        settle(1).await;
        let commands = controller.pump();

        assert_eq!(controller.state(), &SessionState::Empty);
        assert_eq!(commands, vec![RenderCommand::ShowEmpty(EmptyKind::NoResults)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_debounce_and_query() {
        let api = Arc::new(MockApi::default());
        api.script("slow", Duration::from_millis(100), Ok(vec![item("slow")]));
        let (mut controller, _store, _bus) = controller(&api);

        controller.submit("slow");
        controller.text_changed("slower");
        let commands = controller.cancel();
        assert!(commands.contains(&RenderCommand::ShowEmpty(EmptyKind::InitialSearch)));

        settle(1000).await;
        assert!(controller.pump().is_empty());
        assert_eq!(controller.state(), &SessionState::Idle);
        assert_eq!(api.queries(), vec!["slow".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_favorite_change_patches_only_matching_row() {
        let api = Arc::new(MockApi::default());
        api.script("q", Duration::ZERO, Ok(vec![item("x"), item("y")]));
        let (mut controller, store, bus) = controller(&api);

        controller.submit("q");
        settle(1).await;
        controller.pump();

        // Toggled from another screen.
        let x = item("x");
        store.toggle(&x);
        bus.publish(FavoriteChangedEvent {
            item: x,
            is_favorite: true,
        });

        let commands = controller.pump();
        assert_eq!(
            commands,
            vec![RenderCommand::PatchRow {
                index: 0,
                login: "x".to_string(),
                favorite: true,
            }]
        );
        assert_eq!(controller.items(), &[item("x"), item("y")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_favorite_change_for_unknown_login_is_ignored() {
        let api = Arc::new(MockApi::default());
        api.script("q", Duration::ZERO, Ok(vec![item("x")]));
        let (mut controller, _store, bus) = controller(&api);

        controller.submit("q");
        settle(1).await;
        controller.pump();

        bus.publish(FavoriteChangedEvent {
            item: item("nobody"),
            is_favorite: true,
        });
        assert!(controller.pump().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_favorite_round_trips_through_bus() {
        let api = Arc::new(MockApi::default());
        api.script("q", Duration::ZERO, Ok(vec![item("x"), item("y")]));
        let (mut controller, store, _bus) = controller(&api);

        controller.submit("q");
        settle(1).await;
        controller.pump();

        controller.toggle_favorite(1);
        assert!(store.is_favorite("y"));
        assert_eq!(
            controller.pump(),
            vec![RenderCommand::PatchRow {
                index: 1,
                login: "y".to_string(),
                favorite: true,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_unsubscribes() {
        let api = Arc::new(MockApi::default());
        let (mut controller, _store, bus) = controller(&api);
        assert_eq!(bus.subscriber_count(), 1);

        controller.teardown();
        assert_eq!(bus.subscriber_count(), 0);

        drop(controller);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
