use crate::connection::{Backoff, ReconnectTracker};
use crate::fetcher::Section;
use std::{env, str::FromStr, time::Duration};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(30);
pub const DEFAULT_RECONNECT_STEP: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_RECONNECTS: u32 = 5;
pub const DEFAULT_ACTIVITY_CAPACITY: usize = 10;
const MAX_ACTIVITY_CAPACITY: usize = 50;

/// Which flavour of bot dashboard to behave like. Both talk to the same API;
/// they differ in reconnect pacing and in what the periodic refresh reloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Hosted,
    Remote,
}

impl Profile {
    pub fn backoff(self, step: Duration) -> Backoff {
        match self {
            Profile::Hosted => Backoff::Flat(step),
            Profile::Remote => Backoff::Linear(step),
        }
    }

    pub fn tick_sections(self) -> &'static [Section] {
        match self {
            Profile::Hosted => &[Section::Stats, Section::Database],
            Profile::Remote => Section::all(),
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hosted" => Ok(Profile::Hosted),
            "remote" | "static" => Ok(Profile::Remote),
            other => Err(format!("unknown profile '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub stats: String,
    pub guilds: String,
    pub commands: String,
    pub database_status: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            stats: "/api/stats".into(),
            guilds: "/api/guilds".into(),
            commands: "/api/commands".into(),
            database_status: "/api/database-status".into(),
        }
    }
}

impl Endpoints {
    pub fn path(&self, section: Section) -> &str {
        match section {
            Section::Stats => &self.stats,
            Section::Guilds => &self.guilds,
            Section::Commands => &self.commands,
            Section::Database => &self.database_status,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub port: u16,
    pub profile: Profile,
    pub api_url: Option<String>,
    pub refresh_interval: Duration,
    pub reconnect_step: Duration,
    pub max_reconnect_attempts: u32,
    pub activity_capacity: usize,
    pub endpoints: Endpoints,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            profile: Profile::default(),
            api_url: None,
            refresh_interval: DEFAULT_REFRESH,
            reconnect_step: DEFAULT_RECONNECT_STEP,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECTS,
            activity_capacity: DEFAULT_ACTIVITY_CAPACITY,
            endpoints: Endpoints::default(),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parse_env("PORT").unwrap_or(defaults.port),
            profile: parse_env("DASHBOARD_PROFILE").unwrap_or(defaults.profile),
            api_url: env::var("DASHBOARD_API_URL")
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            refresh_interval: parse_env::<u64>("DASHBOARD_REFRESH_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.refresh_interval),
            reconnect_step: parse_env::<u64>("DASHBOARD_RECONNECT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.reconnect_step),
            max_reconnect_attempts: parse_env("DASHBOARD_MAX_RECONNECTS")
                .unwrap_or(defaults.max_reconnect_attempts),
            activity_capacity: parse_env::<usize>("DASHBOARD_ACTIVITY_CAPACITY")
                .unwrap_or(defaults.activity_capacity)
                .clamp(1, MAX_ACTIVITY_CAPACITY),
            endpoints: defaults.endpoints,
        }
    }

    pub fn reconnect_tracker(&self) -> ReconnectTracker {
        ReconnectTracker::new(
            self.profile.backoff(self.reconnect_step),
            self.max_reconnect_attempts,
        )
    }
}

fn parse_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).ok()?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("ignoring {key}={raw:?}: {err}");
            None
        }
    }
}
