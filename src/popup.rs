//! Controller for one popup session.
//!
//! Owns the session state and routes every mutation through
//! [`ActivityStore`]. All entry points are meant to run on a single-threaded
//! runtime; the only cross-call guard needed is the load-more in-flight flag,
//! which is taken before the first await so overlapping calls never reach the
//! network.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::activity::DEFAULT_WEB_BASE;
use crate::config::AppConfig;
use crate::error::ActivityError;
use crate::github::{extract_username, GitHubClient, DEFAULT_PAGE_SIZE};
use crate::render::{rows_for_events, rows_for_hits, ActivityRow, Header, ListView, LoadMoreState, PopupView};
use crate::search::{search, term_matcher, SearchDebouncer, DEFAULT_SEARCH_DEBOUNCE};
use crate::state::ActivityStore;

#[derive(Debug, Clone)]
pub struct PopupSettings {
    pub page_size: u32,
    pub web_base: String,
    pub search_debounce: Duration,
    pub load_more_retry: Duration,
}

impl Default for PopupSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            web_base: DEFAULT_WEB_BASE.to_string(),
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            load_more_retry: Duration::from_secs(2),
        }
    }
}

impl From<&AppConfig> for PopupSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            web_base: config.web_base_url.clone(),
            search_debounce: Duration::from_millis(config.search_debounce_ms),
            load_more_retry: Duration::from_millis(config.load_more_retry_ms),
        }
    }
}

#[derive(Debug)]
pub enum LoadMoreOutcome {
    Loaded { added: usize },
    /// Another page request is still in flight.
    AlreadyLoading,
    /// Hidden right now: no session, no more pages, search active, or cooling down after an error.
    Unavailable,
    Failed(ActivityError),
}

#[derive(Debug)]
enum Phase {
    Starting,
    Ready,
    /// Startup failed; the message replaces the list for the rest of the session.
    Failed(String),
}

#[derive(Debug)]
struct Session {
    phase: Phase,
    username: Option<String>,
    store: ActivityStore,
    loading_more: bool,
    load_more_failed_at: Option<Instant>,
}

pub struct Popup {
    client: GitHubClient,
    settings: PopupSettings,
    session: Arc<Mutex<Session>>,
    debouncer: Mutex<SearchDebouncer>,
    changed: Arc<Notify>,
}

impl Popup {
    pub fn new(client: GitHubClient, settings: PopupSettings) -> Self {
        let session = Session {
            phase: Phase::Starting,
            username: None,
            store: ActivityStore::new(settings.page_size),
            loading_more: false,
            load_more_failed_at: None,
        };
        Self {
            client,
            debouncer: Mutex::new(SearchDebouncer::new(settings.search_debounce)),
            settings,
            session: Arc::new(Mutex::new(session)),
            changed: Arc::new(Notify::new()),
        }
    }

    /// Resolve the user from the active tab's URL and load the first page.
    ///
    /// Failures are also recorded in the session so the view shows them inline.
    pub async fn open(&self, tab_url: Option<&str>) -> Result<(), ActivityError> {
        let result = self.load_first_page(tab_url).await;
        if let Err(e) = &result {
            warn!("Popup startup failed: {e}");
            self.session.lock().phase = Phase::Failed(e.user_message());
        }
        self.changed.notify_one();
        result
    }

    async fn load_first_page(&self, tab_url: Option<&str>) -> Result<(), ActivityError> {
        let url = tab_url.ok_or(ActivityError::NoActiveTab)?;
        let username = extract_username(url).ok_or_else(|| ActivityError::Resolution { url: url.to_string() })?;
        self.session.lock().phase = Phase::Starting;

        let page = self.client.fetch_page(&username, 1, self.settings.page_size).await?;

        let mut session = self.session.lock();
        session.store.reset(page.profile, page.events, page.fetched);
        session.username = Some(username);
        session.phase = Phase::Ready;
        session.loading_more = false;
        session.load_more_failed_at = None;
        Ok(())
    }

    /// Fetch the next page and append it. Overlapping calls are rejected
    /// without issuing a request.
    pub async fn load_more(&self) -> LoadMoreOutcome {
        let (username, page) = {
            let mut session = self.session.lock();
            if session.loading_more {
                return LoadMoreOutcome::AlreadyLoading;
            }
            if self.load_more_state(&session, Instant::now()) != LoadMoreState::Ready {
                return LoadMoreOutcome::Unavailable;
            }
            let Some(username) = session.username.clone() else {
                return LoadMoreOutcome::Unavailable;
            };
            session.loading_more = true;
            session.load_more_failed_at = None;
            (username, session.store.next_page())
        };
        self.changed.notify_one();

        let result = self.client.fetch_page(&username, page, self.settings.page_size).await;

        let outcome = {
            let mut session = self.session.lock();
            session.loading_more = false;
            match result {
                Ok(fetched) => {
                    let added = fetched.events.len();
                    session.store.update_profile(fetched.profile);
                    session.store.append(fetched.events, fetched.fetched);
                    info!(page, added, "Appended activity page");
                    LoadMoreOutcome::Loaded { added }
                }
                Err(e) => {
                    warn!(page, "Load more failed: {e}");
                    session.load_more_failed_at = Some(Instant::now());
                    LoadMoreOutcome::Failed(e)
                }
            }
        };
        self.changed.notify_one();
        outcome
    }

    /// Debounced search: only the last term of a burst is evaluated.
    pub fn schedule_search(&self, term: &str) {
        let session = self.session.clone();
        let changed = self.changed.clone();
        let term = term.to_string();
        self.debouncer.lock().schedule(async move {
            session.lock().store.set_search_term(&term);
            changed.notify_one();
        });
    }

    /// Apply a search immediately, dropping any pending debounced one.
    pub fn search_now(&self, term: &str) {
        self.debouncer.lock().cancel();
        self.session.lock().store.set_search_term(term);
        self.changed.notify_one();
    }

    /// Resolves after the session changes (page merged, search applied, ...).
    pub async fn changed(&self) {
        self.changed.notified().await;
    }

    /// Wake whoever waits on [`Popup::changed`], e.g. once a load-more error expires.
    pub fn notify_changed(&self) {
        self.changed.notify_one();
    }

    pub fn settings(&self) -> &PopupSettings {
        &self.settings
    }

    pub fn view(&self) -> PopupView {
        self.view_at(Instant::now())
    }

    pub fn view_at(&self, now: Instant) -> PopupView {
        let session = self.session.lock();
        let store = &session.store;
        let web_base = self.settings.web_base.as_str();

        let list = match &session.phase {
            Phase::Starting => ListView::Loading,
            Phase::Failed(message) => ListView::Message(message.clone()),
            Phase::Ready => match store.search_term().and_then(|t| term_matcher(t).map(|m| (t, m))) {
                Some((term, matcher)) => {
                    let hits = search(store.search_slice(), &matcher, web_base);
                    if hits.is_empty() {
                        ListView::NoMatches { term: term.to_string() }
                    } else {
                        ListView::Rows(rows_for_hits(hits))
                    }
                }
                None => {
                    let rows = rows_for_events(store.visible_slice(), web_base);
                    if rows.is_empty() { ListView::Empty } else { ListView::Rows(rows) }
                }
            },
        };

        PopupView {
            header: store.profile().map(Header::from),
            list,
            load_more: self.load_more_state(&session, now),
            search_term: store.search_term().map(str::to_string),
        }
    }

    fn load_more_state(&self, session: &Session, now: Instant) -> LoadMoreState {
        if !matches!(session.phase, Phase::Ready) || session.store.search_term().is_some() {
            return LoadMoreState::Hidden;
        }
        if session.loading_more {
            return LoadMoreState::Loading;
        }
        if let Some(failed_at) = session.load_more_failed_at
            && now.saturating_duration_since(failed_at) < self.settings.load_more_retry
        {
            return LoadMoreState::Failed;
        }
        if session.store.has_more() { LoadMoreState::Ready } else { LoadMoreState::Hidden }
    }

    /// Row `index` (0-based) of the list as currently shown.
    pub fn row(&self, index: usize) -> Option<ActivityRow> {
        self.view().list.rows().get(index).cloned()
    }

    pub fn current_page(&self) -> u32 {
        self.session.lock().store.current_page()
    }

    pub fn event_count(&self) -> usize {
        self.session.lock().store.events().len()
    }
}
