//! Command-line arguments and the interactive command grammar.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Theme;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "gh-activity",
    version,
    about = "Public GitHub activity for the profile you are looking at"
)]
pub struct Args {
    /// URL of the page you are on, e.g. https://github.com/octocat
    #[arg(env = "GH_ACTIVITY_URL")]
    pub url: Option<String>,

    /// Events per page (overrides config.json)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// REST API root (overrides config.json)
    #[arg(long)]
    pub api_base: Option<String>,

    /// Theme for this run only; `theme` inside the session persists a toggle
    #[arg(long)]
    pub theme: Option<Theme>,

    /// Directory holding config.json and prefs.json
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Disable ANSI colors; highlights are shown as [brackets]
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,

    /// Print the first page and exit
    #[arg(long)]
    pub once: bool,
}

/// One line typed into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    ClearSearch,
    More,
    /// 1-based row number as printed.
    Open(usize),
    ToggleTheme,
    Help,
    Quit,
    Unknown(String),
}

pub const HELP: &str = "\
Commands:
  /<term>, search <term>   filter the loaded activity
  clear                    drop the search filter
  more                     load the next page
  open <n>                 open row n in the browser
  theme                    toggle light/dark
  help                     show this help
  quit                     leave";

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if let Some(term) = line.strip_prefix('/') {
        return if term.trim().is_empty() { Command::ClearSearch } else { Command::Search(term.trim().to_string()) };
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    match word.to_ascii_lowercase().as_str() {
        "search" | "s" if rest.is_empty() => Command::ClearSearch,
        "search" | "s" => Command::Search(rest.to_string()),
        "clear" | "c" => Command::ClearSearch,
        "more" | "m" | "" => Command::More,
        "open" | "o" => match rest.parse::<usize>() {
            Ok(n) if n > 0 => Command::Open(n),
            _ => Command::Unknown(line.to_string()),
        },
        "theme" | "t" => Command::ToggleTheme,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => match word.parse::<usize>() {
            Ok(n) if n > 0 && rest.is_empty() => Command::Open(n),
            _ => Command::Unknown(line.to_string()),
        },
    }
}
