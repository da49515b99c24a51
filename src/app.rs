//! Interactive terminal session around a [`Popup`].

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cli::{parse_command, Command, HELP};
use crate::clock::{spawn_clock, ClockLabel};
use crate::config::{AppConfig, ConfigStore, Theme};
use crate::github::GitHubClient;
use crate::navigator::{Activation, ActivationKey, ActivationTarget, NavigationOutcome, Navigator, SystemOpener};
use crate::popup::{LoadMoreOutcome, Popup, PopupSettings};
use crate::render::{LoadMoreState, TerminalRenderer};

pub struct SessionOptions {
    pub tab_url: Option<String>,
    pub config: AppConfig,
    pub store: ConfigStore,
    pub theme: Theme,
    pub color: bool,
    pub once: bool,
}

struct Session {
    popup: Arc<Popup>,
    renderer: TerminalRenderer,
    navigator: Navigator<SystemOpener>,
    store: ConfigStore,
    clock: ClockLabel,
    tty: bool,
}

impl Session {
    fn new(popup: Arc<Popup>, store: ConfigStore, theme: Theme, color: bool) -> Self {
        Self {
            popup,
            renderer: TerminalRenderer::new(theme, color),
            navigator: Navigator::new(SystemOpener),
            store,
            clock: ClockLabel::now(),
            tty: std::io::stdout().is_terminal(),
        }
    }

    fn frame(&self) -> String {
        let mut out = String::new();
        if self.tty {
            out.push_str("\x1b[2J\x1b[H");
        }
        out.push_str(&self.clock.to_string());
        out.push('\n');
        out.push_str(&self.renderer.render(&self.popup.view()));
        out
    }

    fn redraw(&self) {
        println!("{}", self.frame());
    }

    fn set_title(&self) {
        if self.tty {
            print!("\x1b]0;gh-activity · {}\x07", self.clock);
            let _ = std::io::stdout().flush();
        }
    }

    /// Returns false when the session should end.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Search(term) => self.popup.schedule_search(&term),
            Command::ClearSearch => self.popup.search_now(""),
            Command::More => self.load_more(),
            Command::Open(n) => self.open_row(n),
            Command::ToggleTheme => {
                let theme = self.renderer.theme().toggled();
                self.renderer.set_theme(theme);
                if let Err(e) = self.store.save_theme(theme) {
                    warn!("Failed to persist theme: {e}");
                }
                self.redraw();
                println!("Theme: {}", theme.as_str());
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return false,
            Command::Unknown(line) => println!("Unknown command: {line} (type `help`)"),
        }
        true
    }

    fn load_more(&self) {
        if self.popup.view().load_more != LoadMoreState::Ready {
            debug!("Load more not available right now");
            return;
        }
        let popup = self.popup.clone();
        tokio::spawn(async move {
            match popup.load_more().await {
                LoadMoreOutcome::Failed(_) => {
                    // Redraw once the error line has expired
                    tokio::time::sleep(popup.settings().load_more_retry).await;
                    popup.notify_changed();
                }
                LoadMoreOutcome::Loaded { added } => debug!(added, "Load more finished"),
                LoadMoreOutcome::AlreadyLoading | LoadMoreOutcome::Unavailable => {}
            }
        });
    }

    fn open_row(&self, n: usize) {
        let Some(row) = self.popup.row(n - 1) else {
            println!("No row {n}");
            return;
        };
        match self.navigator.activate(&row, Activation::Key(ActivationKey::Enter), ActivationTarget::Row) {
            Ok(NavigationOutcome::Opened(url)) => println!("Opened {url}"),
            Ok(_) => {}
            Err(e) => println!("{}", e.user_message()),
        }
    }
}

pub async fn run_session(options: SessionOptions) -> anyhow::Result<()> {
    let client = GitHubClient::new(&options.config.api_base_url, &options.config.user_agent)
        .context("Invalid API base URL")?;
    let popup = Arc::new(Popup::new(client, PopupSettings::from(&options.config)));
    let mut session = Session::new(popup.clone(), options.store, options.theme, options.color);

    let opened = popup.open(options.tab_url.as_deref()).await;
    session.redraw();
    if opened.is_err() || options.once {
        return Ok(());
    }

    let (clock_tx, mut clock_rx) = watch::channel(ClockLabel::now());
    let clock_task = spawn_clock(clock_tx);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else { break };
                if !session.handle(parse_command(&line)) {
                    break;
                }
            }
            _ = popup.changed() => session.redraw(),
            Ok(()) = clock_rx.changed() => {
                session.clock = clock_rx.borrow_and_update().clone();
                session.set_title();
            }
        }
    }

    clock_task.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mockito::{Matcher, Server};
    use serde_json::json;
    use tempfile::TempDir;

    async fn mock_user(server: &mut Server) -> (mockito::Mock, mockito::Mock) {
        let profile = server
            .mock("GET", "/users/octocat")
            .with_status(200)
            .with_body(json!({ "login": "octocat", "name": "The Octocat", "avatar_url": "" }).to_string())
            .create_async()
            .await;
        let events = server
            .mock("GET", "/users/octocat/events/public")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!([
                    { "type": "PushEvent", "repo": { "name": "octocat/a" }, "payload": {} },
                    { "type": "IssuesEvent", "repo": { "name": "octocat/b" }, "payload": { "action": "opened" } }
                ])
                .to_string(),
            )
            .create_async()
            .await;
        (profile, events)
    }

    fn config(server: &Server) -> AppConfig {
        AppConfig {
            api_base_url: server.url(),
            search_debounce_ms: 10,
            ..AppConfig::default()
        }
    }

    async fn opened_session(server: &Server, dir: &TempDir) -> Session {
        let client = GitHubClient::new(&server.url(), "gh-activity-test").unwrap();
        let popup = Arc::new(Popup::new(client, PopupSettings::from(&config(server))));
        popup.open(Some("https://github.com/octocat")).await.unwrap();
        let mut session = Session::new(popup, ConfigStore::new(dir.path()), Theme::Light, false);
        session.tty = false;
        session
    }

    #[tokio::test]
    async fn once_fetches_first_page_and_returns() {
        let mut server = Server::new_async().await;
        let (profile, events) = mock_user(&mut server).await;
        let dir = TempDir::new().unwrap();

        let options = SessionOptions {
            tab_url: Some("https://github.com/octocat".to_string()),
            config: config(&server),
            store: ConfigStore::new(dir.path()),
            theme: Theme::Dark,
            color: false,
            once: true,
        };
        run_session(options).await.unwrap();
        profile.assert_async().await;
        events.assert_async().await;
    }

    #[tokio::test]
    async fn startup_failure_ends_session_without_requests() {
        let mut server = Server::new_async().await;
        let (profile, _) = mock_user(&mut server).await;
        let dir = TempDir::new().unwrap();

        let options = SessionOptions {
            tab_url: None,
            config: config(&server),
            store: ConfigStore::new(dir.path()),
            theme: Theme::Light,
            color: false,
            once: false,
        };
        run_session(options).await.unwrap();
        assert!(!profile.matched_async().await);
    }

    #[tokio::test]
    async fn frame_shows_clock_header_and_rows() {
        let mut server = Server::new_async().await;
        mock_user(&mut server).await;
        let dir = TempDir::new().unwrap();
        let session = opened_session(&server, &dir).await;

        let frame = session.frame();
        let first_line = frame.lines().next().unwrap();
        assert_eq!(first_line, session.clock.to_string());
        assert!(frame.contains("The Octocat  @octocat"));
        assert!(frame.contains("Pushed to octocat/a"));
        assert!(frame.contains("Opened issue in octocat/b"));
    }

    #[tokio::test]
    async fn theme_toggle_is_persisted() {
        let mut server = Server::new_async().await;
        mock_user(&mut server).await;
        let dir = TempDir::new().unwrap();
        let mut session = opened_session(&server, &dir).await;

        assert!(session.handle(Command::ToggleTheme));
        assert_eq!(session.renderer.theme(), Theme::Dark);
        assert_eq!(ConfigStore::new(dir.path()).load_theme(), Theme::Dark);

        assert!(session.handle(Command::ToggleTheme));
        assert_eq!(ConfigStore::new(dir.path()).load_theme(), Theme::Light);
    }

    #[tokio::test]
    async fn search_command_filters_after_debounce() {
        let mut server = Server::new_async().await;
        mock_user(&mut server).await;
        let dir = TempDir::new().unwrap();
        let mut session = opened_session(&server, &dir).await;

        assert!(session.handle(parse_command("/issue")));
        tokio::time::timeout(Duration::from_secs(2), async {
            while session.popup.view().search_term.is_none() {
                session.popup.changed().await;
            }
        })
        .await
        .unwrap();

        let frame = session.frame();
        assert!(frame.contains("search: issue"));
        assert!(frame.contains("Opened [issue] in octocat/b"));
        assert!(!frame.contains("Pushed to octocat/a"));

        assert!(session.handle(parse_command("clear")));
        assert!(session.frame().contains("Pushed to octocat/a"));
    }

    #[tokio::test]
    async fn quit_and_unknown_commands() {
        let mut server = Server::new_async().await;
        mock_user(&mut server).await;
        let dir = TempDir::new().unwrap();
        let mut session = opened_session(&server, &dir).await;

        assert!(session.handle(Command::Unknown("frobnicate".to_string())));
        assert!(session.handle(Command::Open(9)));
        assert!(session.handle(Command::Help));
        assert!(!session.handle(Command::Quit));
    }
}
