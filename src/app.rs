use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use tokio::sync::mpsc;

use crate::action::Action;
use crate::config::PaginationConfig;
use crate::controller::PaginationController;
use crate::error::AnigridError;
use crate::event::Event;
use crate::fetcher::PageFetcher;
use crate::trigger::{Anchor, ListViewport, ScrollTrigger};
use crate::types::{Anime, FetchOutcome, FilterSet, Genre};

/// Genre selection popup. Edits a copy of the filters until applied.
#[derive(Debug, Clone, Default)]
pub struct GenrePicker {
    pub index: usize,
    pub pending: FilterSet,
}

pub struct App {
    pub controller: PaginationController,
    pub trigger: ScrollTrigger<ListViewport>,
    pub selected: usize,
    pub list_state: ListState,
    /// Rows the list showed on the last render
    pub visible_rows: usize,

    pub genres: Vec<Genre>,
    pub genres_loading: bool,
    pub genre_picker: Option<GenrePicker>,

    pub error: Option<String>,
    pub notice: Option<String>,
    pub should_quit: bool,
    fetcher: Arc<dyn PageFetcher>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    /// Builds the app and starts loading page 1 for `filters`.
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        filters: FilterSet,
        pagination: &PaginationConfig,
        action_tx: mpsc::UnboundedSender<Action>,
        outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    ) -> Self {
        let mut controller = PaginationController::new(Arc::clone(&fetcher), outcome_tx)
            .with_rollback_on_failure(pagination.rollback_on_failure);
        controller.set_filters(filters);

        Self {
            controller,
            trigger: ScrollTrigger::new(ListViewport::default()),
            selected: 0,
            list_state: ListState::default(),
            visible_rows: 0,
            genres: Vec::new(),
            genres_loading: false,
            genre_picker: None,
            error: None,
            notice: None,
            should_quit: false,
            fetcher,
            action_tx,
        }
    }

    pub fn selected_anime(&self) -> Option<&Anime> {
        self.controller.items().get(self.selected)
    }

    pub fn genre_name(&self, id: u32) -> Option<&str> {
        self.genres
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.name.as_str())
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Wheel(down) => match (self.genre_picker.is_some(), down) {
                (true, true) => Action::PopupDown,
                (true, false) => Action::PopupUp,
                (false, true) => Action::ScrollDown,
                (false, false) => Action::ScrollUp,
            },
            Event::Tick | Event::Render => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        if self.genre_picker.is_some() {
            return match key.code {
                KeyCode::Char('j') | KeyCode::Down => Action::PopupDown,
                KeyCode::Char('k') | KeyCode::Up => Action::PopupUp,
                KeyCode::Char(' ') => Action::ToggleGenre,
                KeyCode::Char('c') => Action::ClearGenres,
                KeyCode::Enter => Action::ApplyGenres,
                KeyCode::Esc | KeyCode::Char('q') => Action::ClosePopup,
                _ => Action::None,
            };
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('d') if ctrl => Action::PageDown,
            KeyCode::Char('u') if ctrl => Action::PageUp,
            KeyCode::PageDown => Action::PageDown,
            KeyCode::PageUp => Action::PageUp,
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::Char('g') | KeyCode::Home => Action::GoToTop,
            KeyCode::Char('G') | KeyCode::End => Action::GoToBottom,
            KeyCode::Char('f') => Action::OpenGenrePicker,
            KeyCode::Char('r') => Action::Retry,
            KeyCode::Char('o') => Action::OpenInBrowser,
            KeyCode::Char('y') => Action::YankUrl,
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        if !matches!(action, Action::PageLoaded(_) | Action::None) {
            self.error = None;
            self.notice = None;
        }

        let len = self.controller.items().len();
        let page = self.visible_rows.max(1);

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::ScrollUp => {
                self.selected = self.selected.saturating_sub(1);
            }
            Action::ScrollDown => {
                if len > 0 && self.selected < len - 1 {
                    self.selected += 1;
                }
            }
            Action::PageUp => {
                self.selected = self.selected.saturating_sub(page);
            }
            Action::PageDown => {
                self.selected = (self.selected + page).min(len.saturating_sub(1));
            }
            Action::GoToTop => {
                self.selected = 0;
            }
            Action::GoToBottom => {
                self.selected = len.saturating_sub(1);
            }

            Action::PageLoaded(outcome) => {
                self.controller.complete(outcome);
            }
            Action::Retry => {
                if !self.controller.retry() {
                    self.notice = Some("Nothing to retry".to_string());
                }
            }

            Action::OpenGenrePicker => {
                self.genre_picker = Some(GenrePicker {
                    index: 0,
                    pending: self.controller.filters().clone(),
                });
                if self.genres.is_empty() && !self.genres_loading {
                    self.genres_loading = true;
                    self.spawn_load_genres();
                }
            }
            Action::GenresLoaded(genres) => {
                self.genres_loading = false;
                self.genres = genres;
            }
            Action::PopupUp => {
                if let Some(picker) = &mut self.genre_picker {
                    picker.index = picker.index.saturating_sub(1);
                }
            }
            Action::PopupDown => {
                if let Some(picker) = &mut self.genre_picker {
                    if picker.index + 1 < self.genres.len() {
                        picker.index += 1;
                    }
                }
            }
            Action::ToggleGenre => {
                if let Some(picker) = &mut self.genre_picker {
                    if let Some(genre) = self.genres.get(picker.index) {
                        picker.pending.toggle(genre.id);
                    }
                }
            }
            Action::ClearGenres => {
                if let Some(picker) = &mut self.genre_picker {
                    picker.pending = FilterSet::new();
                }
            }
            Action::ApplyGenres => {
                if let Some(picker) = self.genre_picker.take() {
                    self.apply_filters(picker.pending);
                }
            }
            Action::ClosePopup => {
                self.genre_picker = None;
            }

            Action::OpenInBrowser => {
                if let Some(url) = self.selected_anime().and_then(|a| a.url.clone()) {
                    if let Err(e) = open::that(&url) {
                        self.error = Some(AnigridError::from(e).to_string());
                    }
                }
            }
            Action::YankUrl => {
                if let Some(url) = self.selected_anime().and_then(|a| a.url.clone()) {
                    match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(url)) {
                        Ok(()) => self.notice = Some("Copied URL".to_string()),
                        Err(e) => self.error = Some(format!("Clipboard error: {}", e)),
                    }
                }
            }

            Action::Error(msg) => {
                self.genres_loading = false;
                self.error = Some(msg);
            }
            Action::None => {}
        }

        let len = self.controller.items().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Re-arm the scroll trigger on the last row and fire it if that row is
    /// on screen. Called after every draw, once the list offset is known.
    pub fn after_render(&mut self) {
        // After a failed page the list waits for an explicit retry.
        let anchor = if self.controller.last_error().is_some() {
            None
        } else {
            let items = self.controller.items();
            items.last().map(|a| Anchor {
                id: a.id,
                index: items.len() - 1,
            })
        };
        self.trigger.attach(anchor, &self.controller);

        let offset = self.list_state.offset();
        let visible = offset..offset + self.visible_rows;
        if let Some(anchor) = self.trigger.viewport().intersecting(visible) {
            self.trigger.on_intersection(anchor, &mut self.controller);
        }
    }

    fn apply_filters(&mut self, filters: FilterSet) {
        self.selected = 0;
        self.list_state = ListState::default();
        self.controller.set_filters(filters);
    }

    fn spawn_load_genres(&self) {
        let tx = self.action_tx.clone();
        let fetcher = Arc::clone(&self.fetcher);
        tokio::spawn(async move {
            match fetcher.list_genres().await {
                Ok(genres) => {
                    tx.send(Action::GenresLoaded(genres)).ok();
                }
                Err(e) => {
                    tx.send(AnigridError::from(e).into()).ok();
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::mock::{anime, MockFetcher};

    struct Harness {
        app: App,
        fetcher: Arc<MockFetcher>,
        outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
        _actions: mpsc::UnboundedReceiver<Action>,
    }

    impl Harness {
        fn new(fetcher: MockFetcher) -> Self {
            Self::with_config(fetcher, PaginationConfig::default())
        }

        fn with_config(fetcher: MockFetcher, pagination: PaginationConfig) -> Self {
            let fetcher = Arc::new(fetcher);
            let (action_tx, actions) = mpsc::unbounded_channel();
            let (outcome_tx, outcomes) = mpsc::unbounded_channel();
            let app = App::new(
                fetcher.clone(),
                FilterSet::new(),
                &pagination,
                action_tx,
                outcome_tx,
            );
            Self {
                app,
                fetcher,
                outcomes,
                _actions: actions,
            }
        }

        async fn land_page(&mut self) {
            let outcome = self.outcomes.recv().await.unwrap();
            self.app.update(Action::PageLoaded(outcome));
        }
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn many(start: u64, n: u64) -> Vec<crate::types::Anime> {
        (start..start + n).map(|i| anime(i, "x")).collect()
    }

    #[tokio::test]
    async fn keys_map_to_actions() {
        let h = Harness::new(MockFetcher::new());
        assert!(matches!(h.app.handle_event(key(KeyCode::Char('j'))), Action::ScrollDown));
        assert!(matches!(h.app.handle_event(key(KeyCode::Char('f'))), Action::OpenGenrePicker));
        assert!(matches!(h.app.handle_event(key(KeyCode::Char('r'))), Action::Retry));
        assert!(matches!(
            h.app.handle_event(Event::Key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL))),
            Action::PageDown
        ));
        assert!(matches!(h.app.handle_event(Event::Tick), Action::None));
    }

    #[tokio::test]
    async fn picker_keys_take_precedence() {
        let mut h = Harness::new(MockFetcher::new());
        h.app.genre_picker = Some(GenrePicker::default());
        assert!(matches!(h.app.handle_event(key(KeyCode::Char(' '))), Action::ToggleGenre));
        assert!(matches!(h.app.handle_event(key(KeyCode::Char('q'))), Action::ClosePopup));
        assert!(matches!(h.app.handle_event(key(KeyCode::Enter)), Action::ApplyGenres));
    }

    #[tokio::test]
    async fn initial_mount_loads_first_page() {
        let mut h = Harness::new(MockFetcher::new().page(1, &[], many(1, 3), true));
        assert!(h.app.controller.is_loading());
        h.land_page().await;
        assert_eq!(h.app.controller.items().len(), 3);
        assert_eq!(h.fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn selection_is_clamped() {
        let mut h = Harness::new(MockFetcher::new().page(1, &[], many(1, 3), true));
        h.land_page().await;
        h.app.visible_rows = 10;

        h.app.update(Action::PageDown);
        assert_eq!(h.app.selected, 2);
        h.app.update(Action::ScrollDown);
        assert_eq!(h.app.selected, 2);
        h.app.update(Action::GoToTop);
        h.app.update(Action::ScrollUp);
        assert_eq!(h.app.selected, 0);
        h.app.update(Action::GoToBottom);
        assert_eq!(h.app.selected_anime().map(|a| a.id), Some(3));
    }

    #[tokio::test]
    async fn visible_last_row_loads_next_page() {
        let mut h = Harness::new(
            MockFetcher::new()
                .page(1, &[], many(1, 3), true)
                .page(2, &[], many(4, 3), false),
        );
        h.app.visible_rows = 10;

        // still loading page 1: nothing to watch
        h.app.after_render();
        assert!(h.app.trigger.armed().is_none());

        h.land_page().await;
        h.app.after_render();
        assert!(h.app.controller.is_loading());
        assert_eq!(h.app.controller.page().get(), 2);

        h.land_page().await;
        h.app.after_render();
        h.app.after_render();
        assert!(!h.app.controller.is_loading());
        assert_eq!(h.app.controller.items().len(), 6);
        assert_eq!(h.fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn offscreen_last_row_does_not_load() {
        let mut h = Harness::new(MockFetcher::new().page(1, &[], many(1, 30), true));
        h.app.visible_rows = 10;
        h.land_page().await;

        h.app.after_render();
        assert_eq!(h.app.trigger.armed().map(|a| a.id), Some(30));
        assert!(!h.app.controller.is_loading());
    }

    #[tokio::test]
    async fn failed_page_waits_for_retry() {
        let mut h = Harness::new(
            MockFetcher::new()
                .page(1, &[], many(1, 2), true)
                .page(2, &[], many(3, 2), false),
        );
        h.app.visible_rows = 10;
        h.land_page().await;

        h.app.after_render();
        let outcome = h.outcomes.recv().await.unwrap();
        let failed = FetchOutcome {
            result: Err(crate::error::FetchError::Network("reset".into())),
            ..outcome
        };
        h.app.update(Action::PageLoaded(failed));
        assert_eq!(h.app.controller.page().get(), 1);

        h.app.after_render();
        assert!(!h.app.controller.is_loading());
        assert!(h.app.trigger.armed().is_none());

        h.app.update(Action::Retry);
        h.land_page().await;
        assert_eq!(h.app.controller.items().len(), 4);
    }

    #[tokio::test]
    async fn retry_skips_failed_page_when_rollback_is_off() {
        let mut h = Harness::with_config(
            MockFetcher::new()
                .page(1, &[], many(1, 2), true)
                .reply(2, &[], Err(crate::error::FetchError::Network("reset".into())))
                .page(3, &[], many(5, 2), false),
            PaginationConfig {
                rollback_on_failure: false,
            },
        );
        h.app.visible_rows = 10;
        h.land_page().await;

        h.app.after_render();
        h.land_page().await;
        assert_eq!(h.app.controller.failed_page().map(|p| p.get()), Some(2));

        for _ in 0..5 {
            h.app.after_render();
        }
        assert!(!h.app.controller.is_loading());

        h.app.update(Action::Retry);
        h.land_page().await;
        let ids: Vec<u64> = h.app.controller.items().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 5, 6]);

        let pages: Vec<u32> = h.fetcher.calls().iter().map(|(p, _)| *p).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn applying_genres_resets_list() {
        let mut h = Harness::new(
            MockFetcher::new()
                .page(1, &[], many(1, 5), true)
                .page(1, &[1], many(100, 2), true),
        );
        h.land_page().await;
        h.app.update(Action::GoToBottom);

        h.app.update(Action::GenresLoaded(vec![
            Genre { id: 1, name: "Action".into(), count: None },
            Genre { id: 4, name: "Comedy".into(), count: None },
        ]));
        h.app.update(Action::OpenGenrePicker);
        h.app.update(Action::ToggleGenre);
        h.app.update(Action::PopupDown);
        h.app.update(Action::ToggleGenre);
        h.app.update(Action::ToggleGenre);
        h.app.update(Action::ApplyGenres);

        assert!(h.app.genre_picker.is_none());
        assert_eq!(h.app.controller.filters().to_query().as_deref(), Some("1"));
        assert!(h.app.controller.items().is_empty());
        assert_eq!(h.app.selected, 0);

        h.land_page().await;
        assert_eq!(h.app.controller.items()[0].id, 100);
        assert_eq!(h.app.genre_name(4), Some("Comedy"));
    }

    #[tokio::test]
    async fn closing_picker_keeps_filters() {
        let mut h = Harness::new(MockFetcher::new().page(1, &[], many(1, 1), true));
        h.land_page().await;
        h.app.update(Action::GenresLoaded(vec![Genre {
            id: 1,
            name: "Action".into(),
            count: None,
        }]));
        h.app.update(Action::OpenGenrePicker);
        h.app.update(Action::ToggleGenre);
        h.app.update(Action::ClosePopup);

        assert!(h.app.controller.filters().is_empty());
        assert_eq!(h.app.controller.items().len(), 1);
        assert_eq!(h.fetcher.calls().len(), 1);
    }
}
