pub mod activity;
pub mod app;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod github;
pub mod navigator;
pub mod popup;
pub mod render;
pub mod search;
pub mod state;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::{run_session, SessionOptions};
use crate::cli::Args;
use crate::config::ConfigStore;

/// Env var read for the log filter (`tracing_subscriber::EnvFilter` syntax).
pub const LOG_ENV: &str = "GH_ACTIVITY_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // try_init: a subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging();

    let store = ConfigStore::new(args.config_dir.clone().unwrap_or_else(config::config_dir));
    let mut app_config = store.load_app_config();
    if let Some(page_size) = args.page_size {
        app_config.page_size = page_size.max(1);
    }
    if let Some(api_base) = &args.api_base {
        app_config.api_base_url = api_base.clone();
    }
    let theme = args.theme.unwrap_or_else(|| store.load_theme());
    tracing::debug!(dir = %store.dir().display(), ?theme, "Loaded configuration");

    let options = SessionOptions {
        tab_url: args.url,
        config: app_config,
        store,
        theme,
        color: !args.no_color,
        once: args.once,
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(run_session(options))
}
