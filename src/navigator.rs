//! Activation handling for activity rows.
//!
//! A row opens its target in a new browsing context when activated with the
//! pointer or with Enter/Space. Activations that land on a control nested
//! inside a row are contained there and never reach the row.

use std::process::Command;

use tracing::{debug, info};

use crate::error::ActivityError;
use crate::render::ActivityRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Pointer,
    Key(ActivationKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationKey {
    Enter,
    Space,
    Other,
}

/// Element the activation was dispatched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationTarget {
    Row,
    /// A control inside the row (e.g. a link or button) handling its own activation.
    NestedControl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Opened(String),
    /// Not an activating input.
    Ignored,
    /// Handled by a nested control; the row does not navigate.
    Contained,
}

/// Opens a URL in a new browsing context.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), ActivityError>;
}

/// Hands the URL to the platform's default browser.
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<(), ActivityError> {
        let cmd = if cfg!(target_os = "macos") {
            let mut c = Command::new("open");
            c.arg(url);
            c
        } else if cfg!(target_os = "windows") {
            // Empty title argument so `start` doesn't treat the URL as one
            let mut c = Command::new("cmd");
            c.args(["/c", "start", "", url]);
            c
        } else {
            let mut c = Command::new("xdg-open");
            c.arg(url);
            c
        };
        spawn_detached(cmd).map_err(|e| ActivityError::Open {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Start `cmd` and reap it on a background thread so no zombie is left behind.
fn spawn_detached(mut cmd: Command) -> std::io::Result<()> {
    let mut child = cmd.spawn()?;
    std::thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => debug!(%status, "URL opener exited with failure"),
        Ok(_) => {}
        Err(e) => debug!("Failed to wait for URL opener: {e}"),
    });
    Ok(())
}

/// Only absolute http(s) URLs are handed to the opener.
fn validate_target(url: &str) -> Result<(), ActivityError> {
    let parsed = url::Url::parse(url).map_err(|e| ActivityError::Open {
        url: url.to_string(),
        reason: format!("Invalid URL: {e}"),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ActivityError::Open {
            url: url.to_string(),
            reason: format!("Scheme \"{scheme}\" is not allowed"),
        }),
    }
}

pub struct Navigator<O: UrlOpener> {
    opener: O,
}

impl<O: UrlOpener> Navigator<O> {
    pub fn new(opener: O) -> Self {
        Self { opener }
    }

    pub fn activate(
        &self,
        row: &ActivityRow,
        activation: Activation,
        target: ActivationTarget,
    ) -> Result<NavigationOutcome, ActivityError> {
        if target == ActivationTarget::NestedControl {
            return Ok(NavigationOutcome::Contained);
        }
        match activation {
            Activation::Pointer | Activation::Key(ActivationKey::Enter | ActivationKey::Space) => {}
            Activation::Key(ActivationKey::Other) => return Ok(NavigationOutcome::Ignored),
        }
        validate_target(&row.target_url)?;
        self.opener.open(&row.target_url)?;
        info!(url = %row.target_url, "Opened activity target");
        Ok(NavigationOutcome::Opened(row.target_url.clone()))
    }
}
