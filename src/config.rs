//! Application-level configuration: feed tuning from a JSON file, store selection from the environment.

use std::{env, fs, io::ErrorKind, path::PathBuf, str::FromStr, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::paging::FeedSettings;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/rayvue.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "RAYVUE_CONFIG_PATH";
/// Environment variable selecting the page store backend.
const STORE_ENV: &str = "RAYVUE_STORE";

const MAX_PAGE_SIZE: usize = 100;
const SSE_KEEP_ALIVE_SECS: u64 = 15;
const MAX_OPEN_FEEDS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Page size used when a feed is opened without one.
    pub default_page_size: usize,
    /// Upper bound accepted for a requested page size.
    pub max_page_size: usize,
    /// Minimum interval between accepted next-page triggers of a feed.
    pub next_page_cooldown: Duration,
    /// Keep-alive period of the SSE status streams.
    pub sse_keep_alive: Duration,
    /// Number of feeds the registry holds before refusing new ones.
    pub max_open_feeds: usize,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        default_page_size = app_config.default_page_size,
                        cooldown_ms = app_config.next_page_cooldown.as_millis() as u64,
                        "loaded feed settings from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Controller settings for a feed requesting `page_size` records per page.
    pub fn feed_settings(&self, page_size: Option<usize>) -> FeedSettings {
        FeedSettings {
            page_size: page_size.unwrap_or(self.default_page_size),
            cooldown: self.next_page_cooldown,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let feed = FeedSettings::default();
        Self {
            default_page_size: feed.page_size,
            max_page_size: MAX_PAGE_SIZE,
            next_page_cooldown: feed.cooldown,
            sse_keep_alive: Duration::from_secs(SSE_KEEP_ALIVE_SECS),
            max_open_feeds: MAX_OPEN_FEEDS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    default_page_size: Option<usize>,
    max_page_size: Option<usize>,
    next_page_cooldown_ms: Option<u64>,
    sse_keep_alive_secs: Option<u64>,
    max_open_feeds: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        let max_page_size = value.max_page_size.unwrap_or(defaults.max_page_size).max(1);
        Self {
            // The default page size always stays within the accepted range.
            default_page_size: value
                .default_page_size
                .unwrap_or(defaults.default_page_size)
                .clamp(1, max_page_size),
            max_page_size,
            next_page_cooldown: value
                .next_page_cooldown_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.next_page_cooldown),
            sse_keep_alive: value
                .sse_keep_alive_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.sse_keep_alive),
            max_open_feeds: value.max_open_feeds.unwrap_or(defaults.max_open_feeds),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Page store backend selected at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Couch,
    #[default]
    Memory,
}

impl StoreBackend {
    /// Read `RAYVUE_STORE`, defaulting to the in-memory store.
    pub fn from_env() -> Result<Self, String> {
        match env::var(STORE_ENV) {
            Ok(value) if !value.trim().is_empty() => value.parse(),
            _ => Ok(Self::default()),
        }
    }

    /// Short name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            StoreBackend::Mongo => "mongo",
            StoreBackend::Couch => "couch",
            StoreBackend::Memory => "memory",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "couch" | "couchdb" => Ok(StoreBackend::Couch),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!(
                "unknown store backend `{other}` (expected mongo, couch or memory)"
            )),
        }
    }
}
