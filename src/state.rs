use crate::activity::{ActivityEvent, UserProfile};

/// Popup-lifetime session: profile, accumulated events and paging.
///
/// All mutations go through `reset` / `append` / `set_search_term` so the
/// append-only and page-counter invariants live in one place.
#[derive(Debug, Clone)]
pub struct ActivityStore {
    page_size: u32,
    profile: Option<UserProfile>,
    events: Vec<ActivityEvent>,
    current_page: u32,
    /// Set once a page comes back short; never cleared within a session.
    exhausted: bool,
    search_term: Option<String>,
    /// Events searchable under the current term: what was visible when it was set.
    search_snapshot: Option<usize>,
}

impl ActivityStore {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            profile: None,
            events: Vec::new(),
            current_page: 1,
            exhausted: false,
            search_term: None,
            search_snapshot: None,
        }
    }

    /// Replace the whole session with the first page. `fetched` is the length
    /// of the list the API returned, before unreadable entries were dropped.
    pub fn reset(&mut self, profile: UserProfile, events: Vec<ActivityEvent>, fetched: usize) {
        self.exhausted = self.is_short(fetched);
        self.profile = Some(profile);
        self.events = events;
        self.current_page = 1;
        self.search_term = None;
        self.search_snapshot = None;
    }

    /// Append the next page in arrival order and advance the page counter.
    pub fn append(&mut self, events: Vec<ActivityEvent>, fetched: usize) {
        if self.is_short(fetched) {
            self.exhausted = true;
        }
        self.events.extend(events);
        self.current_page += 1;
    }

    fn is_short(&self, fetched: usize) -> bool {
        (fetched as u64) < u64::from(self.page_size)
    }

    /// Profiles are refetched with every page; the latest one wins.
    pub fn update_profile(&mut self, profile: UserProfile) {
        self.profile = Some(profile);
    }

    /// Events covered by the pages loaded so far.
    pub fn visible_slice(&self) -> &[ActivityEvent] {
        let limit = (self.current_page as usize).saturating_mul(self.page_size as usize);
        &self.events[..self.events.len().min(limit)]
    }

    /// The last fetched page was full, so another page may exist.
    pub fn has_more(&self) -> bool {
        self.profile.is_some() && !self.exhausted
    }

    /// Store a search term and freeze what it searches. Blank input clears
    /// the filter.
    pub fn set_search_term(&mut self, term: &str) {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            self.search_term = None;
            self.search_snapshot = None;
        } else {
            self.search_term = Some(trimmed.to_string());
            self.search_snapshot = Some(self.visible_slice().len());
        }
    }

    /// Events the active search runs over. Pages merged after the term was
    /// set stay out until the search is cleared or changed.
    pub fn search_slice(&self) -> &[ActivityEvent] {
        match self.search_snapshot {
            Some(len) => &self.events[..self.events.len().min(len)],
            None => self.visible_slice(),
        }
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search_term.as_deref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn events(&self) -> &[ActivityEvent] {
        &self.events
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn next_page(&self) -> u32 {
        self.current_page + 1
    }
}
