//! Startup configuration: `healthboard.ron` plus command-line overrides.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use healthboard_core::{GroupId, RefreshTimings, SessionSettings};
use healthboard_engine::ApiSettings;
use serde::Deserialize;

use super::logging::{LogDestination, LogSettings};

pub const DEFAULT_CONFIG_FILE: &str = "healthboard.ron";

#[derive(Debug, Parser)]
#[command(
    name = "healthboard",
    version,
    about = "Terminal dashboard for server health and infrastructure status"
)]
pub struct Cli {
    /// Configuration file; a missing file means built-in defaults
    #[arg(long, short, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Dashboard endpoint, e.g. http://ops/api.aspx
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Tab opened at startup
    #[arg(long, value_name = "GROUP")]
    pub group: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Where log output goes
    #[arg(long, value_enum, value_name = "DEST")]
    pub log_to: Option<LogDestination>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: Option<String>,
    /// Tab ids in display order; empty means the built-in set.
    pub tabs: Vec<String>,
    pub initial_group: Option<String>,
    pub refresh: RefreshConfig,
    pub http: HttpConfig,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub background_interval_secs: u64,
    pub poll_grace_ms: u64,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub message_dismiss_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        let timings = RefreshTimings::default();
        Self {
            background_interval_secs: timings.background_interval.as_secs(),
            poll_grace_ms: millis(timings.poll_grace),
            poll_interval_ms: millis(timings.poll_interval),
            max_poll_attempts: timings.max_poll_attempts,
            message_dismiss_ms: millis(timings.message_dismiss),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_body_bytes: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let settings = ApiSettings::default();
        Self {
            connect_timeout_secs: settings.connect_timeout.as_secs(),
            request_timeout_secs: settings.request_timeout.as_secs(),
            max_body_bytes: settings.max_bytes,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl AppConfig {
    /// Reads `path`. A missing file yields the defaults; a broken one is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("could not read {}", path.display()))
            }
        };
        ron::from_str(&text).with_context(|| format!("could not parse {}", path.display()))
    }

    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(endpoint) = &cli.endpoint {
            self.endpoint = Some(endpoint.clone());
        }
        if let Some(group) = &cli.group {
            self.initial_group = Some(group.clone());
        }
        if let Some(level) = &cli.log_level {
            self.log.level = level.clone();
        }
        if let Some(destination) = cli.log_to {
            self.log.destination = destination;
        }
        self
    }

    pub fn session_settings(&self) -> SessionSettings {
        let defaults = SessionSettings::default();
        let tabs: Vec<GroupId> = if self.tabs.is_empty() {
            defaults.tabs
        } else {
            self.tabs.iter().map(GroupId::new).collect()
        };
        // An initial group outside the tab list falls back to the first tab.
        let initial_group = self
            .initial_group
            .as_deref()
            .map(GroupId::new)
            .filter(|group| tabs.contains(group))
            .or_else(|| tabs.first().cloned())
            .unwrap_or(defaults.initial_group);

        SessionSettings {
            tabs,
            initial_group,
            timings: RefreshTimings {
                background_interval: Duration::from_secs(self.refresh.background_interval_secs),
                poll_grace: Duration::from_millis(self.refresh.poll_grace_ms),
                poll_interval: Duration::from_millis(self.refresh.poll_interval_ms),
                max_poll_attempts: self.refresh.max_poll_attempts,
                message_dismiss: Duration::from_millis(self.refresh.message_dismiss_ms),
                ..RefreshTimings::default()
            },
        }
    }

    pub fn api_settings(&self) -> ApiSettings {
        let defaults = ApiSettings::default();
        ApiSettings {
            endpoint: self.endpoint.clone().unwrap_or(defaults.endpoint),
            connect_timeout: Duration::from_secs(self.http.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.http.request_timeout_secs),
            max_bytes: self.http.max_body_bytes,
        }
    }
}
