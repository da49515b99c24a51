use thiserror::Error;

/// Failures that end up in front of the user.
///
/// Malformed event lists and events that cannot be described are not part of
/// this enum: they degrade in place (empty page, skipped row) and only show up
/// in the logs.
#[derive(Debug, Error)]
pub enum ActivityError {
    /// The host could not tell us which page is open.
    #[error("No active tab")]
    NoActiveTab,
    /// The tab URL does not point at a GitHub user.
    #[error("Please navigate to a GitHub user profile")]
    Resolution { url: String },
    /// Non-2xx response from either leg of a page fetch.
    #[error("{}", fetch_message(.status, .message))]
    Fetch { status: u16, message: Option<String> },
    /// Request never produced a status (DNS, TLS, connection reset).
    #[error("Network error: {0}")]
    Network(String),
    /// Profile came back without a `login`.
    #[error("Failed to fetch data: profile has no login")]
    InvalidProfile,
    /// Response body was not valid JSON.
    #[error("Failed to parse {what}: {reason}")]
    Decode { what: &'static str, reason: String },
    /// The URL opener could not be launched.
    #[error("Failed to open {url}: {reason}")]
    Open { url: String, reason: String },
    #[error("Config error: {0}")]
    Config(String),
}

impl ActivityError {
    /// HTTP status for fetch failures, `None` for everything else.
    pub fn status(&self) -> Option<u16> {
        match self {
            ActivityError::Fetch { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text shown inline in the activity list region.
    pub fn user_message(&self) -> String {
        match self {
            ActivityError::Resolution { .. } => self.to_string(),
            _ => format!("Error: {self}"),
        }
    }
}

fn fetch_message(status: &u16, message: &Option<String>) -> String {
    match message.as_deref() {
        Some(msg) if !msg.is_empty() => format!("Failed to fetch data ({status}): {msg}"),
        _ => format!("Failed to fetch data ({status})"),
    }
}
