use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::activity::{ActivityEvent, UserProfile};
use crate::error::ActivityError;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "gh-activity";
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// REST media type sent in the `Accept` header.
const GITHUB_JSON: &str = "application/vnd.github+json";

lazy_static::lazy_static! {
    /// First path segment after a `github.com` host. Query and fragment
    /// delimiters end the segment.
    static ref GITHUB_USER_RE: regex::Regex =
        regex::Regex::new(r"github\.com/([^/?#]+)(?:[/?#]|$)").unwrap();
}

/// Extract the username from any URL pointing at github.com.
/// Returns None when there is no `github.com/<segment>` in the string.
pub fn extract_username(url: &str) -> Option<String> {
    GITHUB_USER_RE
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// One fetched page: the profile plus that page of events.
#[derive(Debug, Clone)]
pub struct ActivityPage {
    pub profile: UserProfile,
    pub events: Vec<ActivityEvent>,
    /// Entries in the list the API returned, including ones dropped as unreadable.
    pub fetched: usize,
}

/// Client for the two read-only endpoints the feed needs.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: url::Url,
    user_agent: String,
}

impl GitHubClient {
    pub fn new(api_base: &str, user_agent: &str) -> Result<Self, ActivityError> {
        // Url::join drops the last segment unless the base ends with '/'
        let normalized = format!("{}/", api_base.trim_end_matches('/'));
        let api_base = url::Url::parse(&normalized)
            .map_err(|e| ActivityError::Config(format!("Invalid API base URL {api_base}: {e}")))?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ActivityError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_base,
            user_agent: user_agent.to_string(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<url::Url, ActivityError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| ActivityError::Config(format!("API base {} cannot hold a path", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn profile_url(&self, username: &str) -> Result<url::Url, ActivityError> {
        self.endpoint(&["users", username])
    }

    fn events_url(&self, username: &str, page: u32, page_size: u32) -> Result<url::Url, ActivityError> {
        let mut url = self.endpoint(&["users", username, "events", "public"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &page_size.to_string());
        Ok(url)
    }

    /// GET a JSON document. Non-2xx becomes `ActivityError::Fetch`.
    async fn get_json(&self, url: url::Url, what: &'static str) -> Result<Value, ActivityError> {
        let response = self
            .http
            .get(url.clone())
            .header(reqwest::header::ACCEPT, GITHUB_JSON)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| ActivityError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let rate_limited = status == StatusCode::FORBIDDEN
                && header_as_u64(&response, "x-ratelimit-remaining") == Some(0);
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let mut message = body["message"].as_str().map(str::to_string);
            if rate_limited {
                message = Some(match message {
                    Some(msg) => format!("{msg} (rate limit exhausted)"),
                    None => "rate limit exhausted".to_string(),
                });
            }
            warn!(%url, status = status.as_u16(), "GitHub request failed");
            return Err(ActivityError::Fetch { status: status.as_u16(), message });
        }

        response.json().await.map_err(|e| ActivityError::Decode {
            what,
            reason: e.to_string(),
        })
    }

    /// Fetch the profile and one page of public events concurrently.
    ///
    /// Both legs must succeed. A non-list events body degrades to an empty page.
    pub async fn fetch_page(
        &self,
        username: &str,
        page: u32,
        page_size: u32,
    ) -> Result<ActivityPage, ActivityError> {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let profile_url = self.profile_url(username)?;
        let events_url = self.events_url(username, page, page_size)?;

        let events_leg = async {
            match self.get_json(events_url, "events").await {
                Err(ActivityError::Decode { reason, .. }) => {
                    warn!("Events body is not JSON ({reason}); treating page as empty");
                    Ok(Value::Null)
                }
                other => other,
            }
        };
        let (profile_json, events_json) =
            tokio::try_join!(self.get_json(profile_url, "profile"), events_leg)?;

        let profile = parse_profile(&profile_json)?;
        let fetched = events_json.as_array().map_or(0, Vec::len);
        let events = parse_events(events_json);
        info!(username, page, fetched, count = events.len(), "Fetched activity page");
        Ok(ActivityPage { profile, events, fetched })
    }
}

/// Parse a header value as a u64, returning None if missing or unparseable.
fn header_as_u64(response: &reqwest::Response, name: &str) -> Option<u64> {
    response.headers().get(name)?.to_str().ok()?.parse().ok()
}

/// Profile payloads without a non-empty `login` are rejected.
pub(crate) fn parse_profile(json: &Value) -> Result<UserProfile, ActivityError> {
    match json["login"].as_str() {
        Some(login) if !login.is_empty() => {}
        _ => return Err(ActivityError::InvalidProfile),
    }
    serde_json::from_value(json.clone()).map_err(|e| {
        debug!("Profile did not deserialize: {e}");
        ActivityError::InvalidProfile
    })
}

/// Anything other than a JSON array yields no events. Individual entries that
/// are not event objects are dropped.
pub(crate) fn parse_events(json: Value) -> Vec<ActivityEvent> {
    let Value::Array(items) = json else {
        warn!("Events response is not a list; treating page as empty");
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ActivityEvent>(item) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!("Skipping unreadable event: {e}");
                None
            }
        })
        .collect()
}
