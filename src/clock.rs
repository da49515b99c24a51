use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};

/// How often the header clock refreshes.
pub const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Current time, date and zone as shown in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockLabel {
    pub time: String,
    pub date: String,
    pub zone: String,
}

impl ClockLabel {
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            time: now.format("%H:%M:%S").to_string(),
            date: now.format("%a, %b %-d, %Y").to_string(),
            zone: now.format("UTC%:z").to_string(),
        }
    }

    pub fn now() -> Self {
        Self::at(&Local::now())
    }
}

impl std::fmt::Display for ClockLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} · {} ({})", self.time, self.date, self.zone)
    }
}

/// Emit a fresh label every tick until the receiver goes away.
pub fn spawn_clock(tx: tokio::sync::watch::Sender<ClockLabel>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(CLOCK_TICK);
        loop {
            ticker.tick().await;
            if tx.send(ClockLabel::now()).is_err() {
                break;
            }
        }
    })
}
