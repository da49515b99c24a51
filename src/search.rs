//! Case-insensitive search over the fetched activity and the debounce that
//! sits in front of it.

use std::future::Future;
use std::ops::Range;
use std::time::Duration;

use regex::{Regex, RegexBuilder};
use tokio::task::JoinHandle;

use crate::activity::{describe_with_base, ActivityDescription, ActivityEvent};

/// Pause of input inactivity before a search runs.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// An event whose description matched, with the byte ranges to highlight.
#[derive(Debug, Clone)]
pub struct SearchHit<'a> {
    pub event: &'a ActivityEvent,
    pub description: ActivityDescription,
    pub highlights: Vec<Range<usize>>,
}

/// Build a literal, case-insensitive matcher. Blank terms mean "no filter".
pub fn term_matcher(term: &str) -> Option<Regex> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    // Escaped input always compiles
    RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Byte ranges of every non-overlapping match in `text`.
pub fn match_ranges(matcher: &Regex, text: &str) -> Vec<Range<usize>> {
    matcher.find_iter(text).map(|m| m.range()).collect()
}

/// Filter `events` by their description. Descriptions are recomputed on every
/// call; events that cannot be described never match.
pub fn search<'a>(events: &'a [ActivityEvent], matcher: &Regex, web_base: &str) -> Vec<SearchHit<'a>> {
    events
        .iter()
        .filter_map(|event| {
            let description = describe_with_base(event, web_base)?;
            let highlights = match_ranges(matcher, &description.text);
            if highlights.is_empty() {
                None
            } else {
                Some(SearchHit { event, description, highlights })
            }
        })
        .collect()
}

/// Coalesces bursts of input into one evaluation.
///
/// At most one evaluation is pending. Scheduling a new one aborts the
/// previous task before its delay elapses.
pub struct SearchDebouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// Run `task` once `delay` passes without another call to `schedule`.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Drop the pending evaluation, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
