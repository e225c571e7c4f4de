use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Json,
    Sqlite,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Json => write!(f, "json"),
            StoreBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(StoreBackend::Json),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(ConfigError::Invalid {
                key: "STORE_BACKEND",
                reason: format!("unknown backend '{}', expected json or sqlite", other),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub watch: WatchConfig,
    pub store: StoreConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub api_id: i32,
    pub api_hash: String,
    /// Only needed by the login tool.
    pub phone_number: Option<String>,
    pub session_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub source_chat: String,
    pub forward_to: String,
    /// Split on commas exactly as given. Empty entries are kept and match everything.
    pub keywords: Vec<String>,
    pub hours_back: u32,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub poll_interval: Duration,
    pub retry_delay: Duration,
}

fn default_source_chat() -> String {
    "NSbaraholka".to_string()
}

fn default_hours_back() -> u32 {
    1
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(3600)
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(600)
}

fn default_session_file() -> PathBuf {
    PathBuf::from("test_session.session")
}

fn default_store_path(backend: StoreBackend) -> PathBuf {
    match backend {
        StoreBackend::Json => PathBuf::from("forwarded_messages.json"),
        StoreBackend::Sqlite => PathBuf::from("forwarded_messages.db"),
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            retry_delay: default_retry_delay(),
        }
    }
}

impl WatchConfig {
    /// True when a trailing or doubled comma left an empty keyword in the list.
    pub fn has_empty_keyword(&self) -> bool {
        self.keywords.iter().any(|k| k.is_empty())
    }
}

/// Load `.env` from the working directory into the process environment.
/// Variables that are already set are left alone.
pub fn load_env_file() {
    dotenvy::dotenv().ok();
}

impl Config {
    /// Read the process environment. Binaries load `.env` into it first.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let telegram = TelegramConfig::from_lookup(&lookup)?;

        let forward_to = non_empty(lookup("FORWARD_TO_USERNAME"))
            .ok_or(ConfigError::Missing("FORWARD_TO_USERNAME"))?;
        let keywords = split_keywords(&lookup("KEYWORDS").unwrap_or_default());
        let source_chat = non_empty(lookup("SOURCE_CHAT")).unwrap_or_else(default_source_chat);
        let hours_back = parse_or(&lookup, "HOURS_BACK", default_hours_back())?;

        let poll_interval = Duration::from_secs(parse_or(
            &lookup,
            "POLL_INTERVAL_SECS",
            default_poll_interval().as_secs(),
        )?);
        let retry_delay = Duration::from_secs(parse_or(
            &lookup,
            "RETRY_DELAY_SECS",
            default_retry_delay().as_secs(),
        )?);

        let backend = match non_empty(lookup("STORE_BACKEND")) {
            Some(raw) => raw.parse::<StoreBackend>()?,
            None => StoreBackend::default(),
        };
        let store_path = non_empty(lookup("FORWARDED_MESSAGES_FILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| default_store_path(backend));

        Ok(Config {
            telegram,
            watch: WatchConfig {
                source_chat,
                forward_to,
                keywords,
                hours_back,
            },
            store: StoreConfig {
                backend,
                path: resolve_path(&data_dir(&lookup), store_path),
            },
            schedule: ScheduleConfig {
                poll_interval,
                retry_delay,
            },
        })
    }
}

impl TelegramConfig {
    /// Only the client credentials, for tools that do not poll.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_id = match non_empty(lookup("API_ID")) {
            Some(raw) => raw.trim().parse::<i32>().map_err(|e| ConfigError::Invalid {
                key: "API_ID",
                reason: e.to_string(),
            })?,
            None => return Err(ConfigError::Missing("API_ID")),
        };
        let api_hash = non_empty(lookup("API_HASH")).ok_or(ConfigError::Missing("API_HASH"))?;
        let phone_number = non_empty(lookup("PHONE_NUMBER"));
        let session_file = non_empty(lookup("SESSION_FILE"))
            .map(PathBuf::from)
            .unwrap_or_else(default_session_file);

        Ok(TelegramConfig {
            api_id,
            api_hash,
            phone_number,
            session_file: resolve_path(&data_dir(lookup), session_file),
        })
    }
}

/// Comma split with no trimming or filtering: `"a,"` yields `["a", ""]`.
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(lookup(key)) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn data_dir<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup("DATA_DIR"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn resolve_path(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
