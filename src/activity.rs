//! Activity model and the event → description mapping.
//!
//! Events arrive from the public events API as loosely-typed JSON. They are
//! kept close to the wire shape (`type` and `repo` may be missing, `payload`
//! stays opaque) and only interpreted here, in [`describe`], which is total
//! over every event kind and never fails on a partial payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Web root used to build target URLs.
pub const DEFAULT_WEB_BASE: &str = "https://github.com";

/// Profile of the user whose activity is shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub login: String,
    #[serde(rename = "name", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: String,
}

impl UserProfile {
    /// Name shown in the header: display name when set, login otherwise.
    pub fn header_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.login)
    }
}

/// Closed classification of an event's `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Push,
    Create,
    Issues,
    PullRequest,
    Watch,
    Fork,
    Other,
}

impl EventKind {
    /// Map an API type name (`"PushEvent"`, ...) to a kind. Unknown names fold to `Other`.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "PushEvent" => EventKind::Push,
            "CreateEvent" => EventKind::Create,
            "IssuesEvent" => EventKind::Issues,
            "PullRequestEvent" => EventKind::PullRequest,
            "WatchEvent" => EventKind::Watch,
            "ForkEvent" => EventKind::Fork,
            _ => EventKind::Other,
        }
    }

    /// Stable icon identifier.
    pub fn icon_id(self) -> &'static str {
        match self {
            EventKind::Push => "push",
            EventKind::Create => "create",
            EventKind::Issues => "issues",
            EventKind::PullRequest => "pull-request",
            EventKind::Watch => "watch",
            EventKind::Fork => "fork",
            EventKind::Other => "other",
        }
    }

    /// Single-cell terminal glyph for the icon column.
    pub fn glyph(self) -> &'static str {
        match self {
            EventKind::Push => "↑",
            EventKind::Create => "+",
            EventKind::Issues => "!",
            EventKind::PullRequest => "⇄",
            EventKind::Watch => "★",
            EventKind::Fork => "⑂",
            EventKind::Other => "•",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RepoRef {
    #[serde(default)]
    pub name: Option<String>,
}

/// One public event, as returned by the API.
///
/// `created_at` is kept as the raw string; it is only parsed for display.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityEvent {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub repo: Option<RepoRef>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl ActivityEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from_type_name(self.event_type.as_deref().unwrap_or_default())
    }

    pub fn repo_name(&self) -> Option<&str> {
        self.repo
            .as_ref()
            .and_then(|r| r.name.as_deref())
            .filter(|n| !n.is_empty())
    }
}

/// Human-readable form of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityDescription {
    pub text: String,
    pub icon: EventKind,
    pub target_url: String,
}

/// Describe an event against the default web root.
pub fn describe(event: &ActivityEvent) -> Option<ActivityDescription> {
    describe_with_base(event, DEFAULT_WEB_BASE)
}

/// Describe an event. Returns `None` when the event has no type or no repo,
/// in which case the caller skips it.
pub fn describe_with_base(event: &ActivityEvent, web_base: &str) -> Option<ActivityDescription> {
    event.event_type.as_deref().filter(|t| !t.is_empty())?;
    let repo = event.repo_name()?;
    let base = web_base.trim_end_matches('/');
    let repo_url = format!("{base}/{repo}");
    let payload = &event.payload;
    let kind = event.kind();

    let (text, target_url) = match kind {
        EventKind::Push => {
            let sha = payload
                .pointer("/commits/0/sha")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty());
            let target = match sha {
                Some(sha) => format!("{repo_url}/commit/{sha}"),
                None => format!("{repo_url}/commits"),
            };
            (format!("Pushed to {repo}"), target)
        }
        EventKind::Create => {
            let ref_type = str_field(payload, "/ref_type");
            let target = match (ref_type, str_field(payload, "/ref")) {
                (Some("repository"), _) | (_, None) => repo_url.clone(),
                (_, Some(git_ref)) => format!("{repo_url}/tree/{git_ref}"),
            };
            (format!("Created {} in {repo}", ref_type.unwrap_or("resource")), target)
        }
        EventKind::Issues => {
            let target = str_field(payload, "/issue/html_url")
                .map(str::to_string)
                .unwrap_or_else(|| format!("{repo_url}/issues"));
            (format!("{} issue in {repo}", action_label(payload)), target)
        }
        EventKind::PullRequest => {
            let target = str_field(payload, "/pull_request/html_url")
                .map(str::to_string)
                .unwrap_or_else(|| format!("{repo_url}/pulls"));
            (format!("{} pull request in {repo}", action_label(payload)), target)
        }
        EventKind::Watch => (format!("Starred {repo}"), repo_url.clone()),
        EventKind::Fork => {
            let target = str_field(payload, "/forkee/html_url")
                .map(str::to_string)
                .unwrap_or_else(|| repo_url.clone());
            (format!("Forked {repo}"), target)
        }
        EventKind::Other => (format!("Activity in {repo}"), repo_url.clone()),
    };

    Some(ActivityDescription { text, icon: kind, target_url })
}

fn str_field<'a>(payload: &'a Value, pointer: &str) -> Option<&'a str> {
    payload.pointer(pointer).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// `"opened"` → `"Opened"`, missing → `"Updated"`.
fn action_label(payload: &Value) -> String {
    let Some(action) = str_field(payload, "/action") else {
        return "Updated".to_string();
    };
    let mut chars = action.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Updated".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(kind: &str, repo: &str, payload: Value) -> ActivityEvent {
        serde_json::from_value(json!({
            "type": kind,
            "repo": { "name": repo },
            "created_at": "2024-03-05T10:00:00Z",
            "payload": payload,
        }))
        .unwrap()
    }

    #[test]
    fn kind_from_type_name_folds_unknown_to_other() {
        assert_eq!(EventKind::from_type_name("PushEvent"), EventKind::Push);
        assert_eq!(EventKind::from_type_name("PullRequestEvent"), EventKind::PullRequest);
        assert_eq!(EventKind::from_type_name("GollumEvent"), EventKind::Other);
        assert_eq!(EventKind::from_type_name(""), EventKind::Other);
    }

    #[test]
    fn push_targets_first_commit() {
        let ev = event("PushEvent", "octocat/Hello-World", json!({
            "commits": [{ "sha": "abc123" }, { "sha": "def456" }]
        }));
        let d = describe(&ev).unwrap();
        assert_eq!(d.text, "Pushed to octocat/Hello-World");
        assert_eq!(d.icon, EventKind::Push);
        assert_eq!(d.target_url, "https://github.com/octocat/Hello-World/commit/abc123");
    }

    #[test]
    fn push_without_commits_targets_commit_list() {
        let ev = event("PushEvent", "octocat/Hello-World", json!({ "commits": [] }));
        assert_eq!(
            describe(&ev).unwrap().target_url,
            "https://github.com/octocat/Hello-World/commits"
        );
    }

    #[test]
    fn create_repository_targets_repo_root() {
        let ev = event("CreateEvent", "octocat/new", json!({ "ref_type": "repository", "ref": null }));
        let d = describe(&ev).unwrap();
        assert_eq!(d.text, "Created repository in octocat/new");
        assert_eq!(d.target_url, "https://github.com/octocat/new");
    }

    #[test]
    fn create_branch_targets_tree() {
        let ev = event("CreateEvent", "octocat/app", json!({ "ref_type": "branch", "ref": "feat/x" }));
        let d = describe(&ev).unwrap();
        assert_eq!(d.text, "Created branch in octocat/app");
        assert_eq!(d.target_url, "https://github.com/octocat/app/tree/feat/x");
    }

    #[test]
    fn create_without_ref_type_says_resource() {
        let ev = event("CreateEvent", "octocat/app", Value::Null);
        let d = describe(&ev).unwrap();
        assert_eq!(d.text, "Created resource in octocat/app");
        assert_eq!(d.target_url, "https://github.com/octocat/app");
    }

    #[test]
    fn issues_uses_issue_url_and_action() {
        let ev = event("IssuesEvent", "octocat/app", json!({
            "action": "opened",
            "issue": { "html_url": "https://github.com/octocat/app/issues/7" }
        }));
        let d = describe(&ev).unwrap();
        assert_eq!(d.text, "Opened issue in octocat/app");
        assert_eq!(d.target_url, "https://github.com/octocat/app/issues/7");
    }

    #[test]
    fn issues_without_payload_falls_back() {
        let ev = event("IssuesEvent", "octocat/app", json!({}));
        let d = describe(&ev).unwrap();
        assert_eq!(d.text, "Updated issue in octocat/app");
        assert_eq!(d.target_url, "https://github.com/octocat/app/issues");
    }

    #[test]
    fn pull_request_falls_back_to_pulls() {
        let ev = event("PullRequestEvent", "octocat/app", json!({ "action": "closed" }));
        let d = describe(&ev).unwrap();
        assert_eq!(d.text, "Closed pull request in octocat/app");
        assert_eq!(d.target_url, "https://github.com/octocat/app/pulls");
    }

    #[test]
    fn watch_and_fork() {
        let star = describe(&event("WatchEvent", "rust-lang/rust", json!({ "action": "started" }))).unwrap();
        assert_eq!(star.text, "Starred rust-lang/rust");
        assert_eq!(star.target_url, "https://github.com/rust-lang/rust");

        let fork = describe(&event("ForkEvent", "rust-lang/rust", json!({
            "forkee": { "html_url": "https://github.com/octocat/rust" }
        })))
        .unwrap();
        assert_eq!(fork.text, "Forked rust-lang/rust");
        assert_eq!(fork.target_url, "https://github.com/octocat/rust");

        let bare_fork = describe(&event("ForkEvent", "rust-lang/rust", Value::Null)).unwrap();
        assert_eq!(bare_fork.target_url, "https://github.com/rust-lang/rust");
    }

    #[test]
    fn unknown_type_is_generic_activity() {
        let d = describe(&event("GollumEvent", "octocat/wiki", json!({}))).unwrap();
        assert_eq!(d.text, "Activity in octocat/wiki");
        assert_eq!(d.icon, EventKind::Other);
        assert_eq!(d.target_url, "https://github.com/octocat/wiki");
    }

    #[test]
    fn every_kind_yields_text_and_absolute_url() {
        for kind in [
            "PushEvent", "CreateEvent", "IssuesEvent", "PullRequestEvent",
            "WatchEvent", "ForkEvent", "DeleteEvent", "ReleaseEvent",
        ] {
            for payload in [Value::Null, json!({}), json!({ "commits": "not-a-list", "issue": 3 })] {
                let d = describe(&event(kind, "a/b", payload)).unwrap();
                assert!(!d.text.is_empty(), "{kind}");
                assert!(d.target_url.starts_with("https://github.com/a/b"), "{kind}: {}", d.target_url);
            }
        }
    }

    #[test]
    fn missing_type_or_repo_is_skipped() {
        let no_type: ActivityEvent = serde_json::from_value(json!({ "repo": { "name": "a/b" } })).unwrap();
        assert!(describe(&no_type).is_none());

        let no_repo: ActivityEvent = serde_json::from_value(json!({ "type": "PushEvent" })).unwrap();
        assert!(describe(&no_repo).is_none());

        let empty_repo: ActivityEvent =
            serde_json::from_value(json!({ "type": "PushEvent", "repo": {} })).unwrap();
        assert!(describe(&empty_repo).is_none());
    }

    #[test]
    fn custom_web_base_is_used_for_targets() {
        let ev = event("WatchEvent", "a/b", Value::Null);
        let d = describe_with_base(&ev, "https://ghe.example.com/").unwrap();
        assert_eq!(d.target_url, "https://ghe.example.com/a/b");
    }

    #[test]
    fn header_name_prefers_display_name() {
        let mut p = UserProfile {
            login: "octocat".to_string(),
            display_name: Some("The Octocat".to_string()),
            avatar_url: String::new(),
        };
        assert_eq!(p.header_name(), "The Octocat");
        p.display_name = Some("  ".to_string());
        assert_eq!(p.header_name(), "octocat");
        p.display_name = None;
        assert_eq!(p.header_name(), "octocat");
    }
}
