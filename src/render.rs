//! Presentation model for the activity list and its terminal rendering.
//!
//! Rows are built from events without touching the network or the session;
//! the terminal printer only consumes a finished [`PopupView`].

use std::ops::Range;

use chrono::{DateTime, Local, TimeZone};
use colored::{ColoredString, Colorize};
use tracing::debug;

use crate::activity::{describe_with_base, ActivityDescription, ActivityEvent, EventKind, UserProfile};
use crate::config::Theme;
use crate::search::SearchHit;

pub const EMPTY_MESSAGE: &str = "No recent activities found";
pub const LOAD_MORE_ERROR_MESSAGE: &str = "Error loading more, try again";

/// One entry in the activity list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRow {
    pub text: String,
    pub icon: EventKind,
    pub time_label: String,
    pub target_url: String,
    /// Byte ranges of `text` to highlight.
    pub highlights: Vec<Range<usize>>,
}

impl ActivityRow {
    fn new(description: ActivityDescription, event: &ActivityEvent, highlights: Vec<Range<usize>>) -> Self {
        Self {
            text: description.text,
            icon: description.icon,
            time_label: time_label(event.created_at.as_deref()),
            target_url: description.target_url,
            highlights,
        }
    }

    /// Split `text` into (segment, highlighted) runs.
    pub fn segments(&self) -> Vec<(&str, bool)> {
        let mut out = Vec::new();
        let mut cursor = 0;
        for range in &self.highlights {
            let (start, end) = (range.start.min(self.text.len()), range.end.min(self.text.len()));
            if start < cursor || !self.text.is_char_boundary(start) || !self.text.is_char_boundary(end) {
                continue;
            }
            if start > cursor {
                out.push((&self.text[cursor..start], false));
            }
            if end > start {
                out.push((&self.text[start..end], true));
            }
            cursor = end;
        }
        if cursor < self.text.len() {
            out.push((&self.text[cursor..], false));
        }
        out
    }
}

/// Rows for the unfiltered list. Events that cannot be described are skipped.
pub fn rows_for_events(events: &[ActivityEvent], web_base: &str) -> Vec<ActivityRow> {
    events
        .iter()
        .filter_map(|event| match describe_with_base(event, web_base) {
            Some(description) => Some(ActivityRow::new(description, event, Vec::new())),
            None => {
                debug!(event_type = ?event.event_type, "Skipping event without type or repo");
                None
            }
        })
        .collect()
}

/// Rows for search results, carrying their highlight ranges.
pub fn rows_for_hits(hits: Vec<SearchHit<'_>>) -> Vec<ActivityRow> {
    hits.into_iter()
        .map(|hit| ActivityRow::new(hit.description, hit.event, hit.highlights))
        .collect()
}

/// `"2026-10-16T09:00:00Z"` → `"Oct 16, 2026"` in local time.
pub fn time_label(created_at: Option<&str>) -> String {
    time_label_in(created_at, &Local)
}

pub fn time_label_in<Tz: TimeZone>(created_at: Option<&str>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let Some(raw) = created_at else {
        return String::new();
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.with_timezone(tz).format("%b %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub login: String,
    pub avatar_url: String,
}

impl From<&UserProfile> for Header {
    fn from(profile: &UserProfile) -> Self {
        Self {
            name: profile.header_name().to_string(),
            login: profile.login.clone(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

/// What the list region shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    /// First page still in flight.
    Loading,
    Rows(Vec<ActivityRow>),
    /// Nothing fetched, or nothing describable.
    Empty,
    /// A search term matched nothing.
    NoMatches { term: String },
    /// Inline error or guidance text.
    Message(String),
}

impl ListView {
    pub fn rows(&self) -> &[ActivityRow] {
        match self {
            ListView::Rows(rows) => rows,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMoreState {
    Hidden,
    Ready,
    /// Disabled while a page request is in flight.
    Loading,
    /// Transient error; reverts to `Ready` after the retry delay.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub header: Option<Header>,
    pub list: ListView,
    pub load_more: LoadMoreState,
    pub search_term: Option<String>,
}

// ---------------------------------------------------------------------------
// Terminal output
// ---------------------------------------------------------------------------

/// Prints a [`PopupView`] as numbered lines. With `color` off, highlights are
/// wrapped in brackets instead of styled.
pub struct TerminalRenderer {
    theme: Theme,
    color: bool,
}

impl TerminalRenderer {
    pub fn new(theme: Theme, color: bool) -> Self {
        Self { theme, color }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    fn accent(&self, s: &str) -> ColoredString {
        match self.theme {
            Theme::Light => s.blue().bold(),
            Theme::Dark => s.bright_cyan().bold(),
        }
    }

    fn muted(&self, s: &str) -> ColoredString {
        match self.theme {
            Theme::Light => s.bright_black(),
            Theme::Dark => s.white().dimmed(),
        }
    }

    fn mark(&self, s: &str) -> ColoredString {
        match self.theme {
            Theme::Light => s.black().on_yellow(),
            Theme::Dark => s.black().on_bright_yellow(),
        }
    }

    fn error(&self, s: &str) -> ColoredString {
        match self.theme {
            Theme::Light => s.red(),
            Theme::Dark => s.bright_red(),
        }
    }

    fn paint(&self, s: &str, style: impl Fn(&Self, &str) -> ColoredString) -> String {
        if self.color { style(self, s).to_string() } else { s.to_string() }
    }

    /// Glyph when styled; the stable icon id, padded to one column, when plain.
    fn icon(&self, kind: EventKind) -> String {
        if self.color { kind.glyph().to_string() } else { format!("{:<12}", kind.icon_id()) }
    }

    fn row_text(&self, row: &ActivityRow) -> String {
        row.segments()
            .into_iter()
            .map(|(segment, highlighted)| match (highlighted, self.color) {
                (false, _) => segment.to_string(),
                (true, true) => self.mark(segment).to_string(),
                (true, false) => format!("[{segment}]"),
            })
            .collect()
    }

    pub fn render(&self, view: &PopupView) -> String {
        let mut lines = Vec::new();

        if let Some(header) = &view.header {
            lines.push(format!(
                "{}  {}",
                self.paint(&header.name, Self::accent),
                self.paint(&format!("@{}", header.login), Self::muted)
            ));
            if !header.avatar_url.is_empty() {
                lines.push(self.paint(&header.avatar_url, Self::muted));
            }
        }
        if let Some(term) = &view.search_term {
            lines.push(self.paint(&format!("search: {term}"), Self::muted));
        }
        lines.push(self.paint(&"─".repeat(40), Self::muted));

        match &view.list {
            ListView::Rows(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    let mut line = format!("{:>3}. {} {}", i + 1, self.icon(row.icon), self.row_text(row));
                    if !row.time_label.is_empty() {
                        line.push_str("  ");
                        line.push_str(&self.paint(&row.time_label, Self::muted));
                    }
                    lines.push(line);
                }
            }
            ListView::Loading => lines.push(self.paint("Loading…", Self::muted)),
            ListView::Empty => lines.push(self.paint(EMPTY_MESSAGE, Self::muted)),
            ListView::NoMatches { term } => {
                lines.push(self.paint(&format!("No results for \"{term}\""), Self::muted))
            }
            ListView::Message(msg) => lines.push(self.paint(msg, Self::error)),
        }

        match view.load_more {
            LoadMoreState::Hidden => {}
            LoadMoreState::Ready => lines.push(self.paint("[more] Load more", Self::accent)),
            LoadMoreState::Loading => lines.push(self.paint("Loading…", Self::muted)),
            LoadMoreState::Failed => lines.push(self.paint(LOAD_MORE_ERROR_MESSAGE, Self::error)),
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::DEFAULT_WEB_BASE;
    use chrono::{FixedOffset, Utc};
    use serde_json::json;

    fn ev(kind: &str, repo: &str, created_at: &str) -> ActivityEvent {
        serde_json::from_value(json!({
            "type": kind,
            "repo": { "name": repo },
            "created_at": created_at,
            "payload": {}
        }))
        .unwrap()
    }

    fn row(text: &str, highlights: Vec<Range<usize>>) -> ActivityRow {
        ActivityRow {
            text: text.to_string(),
            icon: EventKind::Issues,
            time_label: String::new(),
            target_url: "https://github.com/a/b".to_string(),
            highlights,
        }
    }

    #[test]
    fn time_label_formats_month_day_year() {
        assert_eq!(time_label_in(Some("2024-03-05T10:00:00Z"), &Utc), "Mar 5, 2024");
    }

    #[test]
    fn time_label_converts_to_local_zone() {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(time_label_in(Some("2024-12-31T22:30:00Z"), &tz), "Jan 1, 2025");
    }

    #[test]
    fn time_label_falls_back_to_raw() {
        assert_eq!(time_label_in(Some("yesterday"), &Utc), "yesterday");
        assert_eq!(time_label_in(None, &Utc), "");
    }

    #[test]
    fn rows_skip_undescribable_events() {
        let mut events = vec![ev("PushEvent", "a/b", "2024-03-05T10:00:00Z")];
        events.push(serde_json::from_value(json!({ "type": "PushEvent" })).unwrap());
        events.push(ev("WatchEvent", "c/d", "2024-03-05T10:00:00Z"));
        let rows = rows_for_events(&events, DEFAULT_WEB_BASE);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text, "Pushed to a/b");
        assert_eq!(rows[1].icon, EventKind::Watch);
        assert!(rows[0].highlights.is_empty());
    }

    #[test]
    fn segments_split_around_highlights() {
        let r = row("Opened issue in a/issues", vec![7..12, 18..23]);
        assert_eq!(
            r.segments(),
            vec![
                ("Opened ", false),
                ("issue", true),
                (" in a/", false),
                ("issue", true),
                ("s", false),
            ]
        );
    }

    #[test]
    fn segments_without_highlights_is_whole_text() {
        assert_eq!(row("Starred a/b", vec![]).segments(), vec![("Starred a/b", false)]);
    }

    #[test]
    fn segments_ignore_ranges_off_char_boundaries() {
        let r = row("é", vec![1..2]);
        assert_eq!(r.segments(), vec![("é", false)]);
    }

    #[test]
    fn plain_render_wraps_highlights() {
        let view = PopupView {
            header: Some(Header {
                name: "The Octocat".to_string(),
                login: "octocat".to_string(),
                avatar_url: "https://avatars.example/u/1".to_string(),
            }),
            list: ListView::Rows(vec![row("Opened issue in a/b", vec![7..12])]),
            load_more: LoadMoreState::Hidden,
            search_term: Some("issue".to_string()),
        };
        let out = TerminalRenderer::new(Theme::Light, false).render(&view);
        assert!(out.contains("The Octocat  @octocat"));
        assert!(out.contains("search: issue"));
        assert!(out.contains(&format!("  1. {:<12} Opened [issue] in a/b", "issues")), "{out}");
        assert!(!out.contains("Load more"));
    }

    #[test]
    fn plain_render_states() {
        let r = TerminalRenderer::new(Theme::Dark, false);
        let mut view = PopupView {
            header: None,
            list: ListView::Empty,
            load_more: LoadMoreState::Hidden,
            search_term: None,
        };
        assert!(r.render(&view).contains(EMPTY_MESSAGE));

        view.list = ListView::NoMatches { term: "zzz".to_string() };
        assert!(r.render(&view).contains("No results for \"zzz\""));

        view.list = ListView::Message("Error: Failed to fetch data (404)".to_string());
        view.load_more = LoadMoreState::Failed;
        let out = r.render(&view);
        assert!(out.contains("Error: Failed to fetch data (404)"));
        assert!(out.contains(LOAD_MORE_ERROR_MESSAGE));

        view.load_more = LoadMoreState::Loading;
        assert!(r.render(&view).contains("Loading…"));
    }
}
