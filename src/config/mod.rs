//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "listingdesk";
const ENV_PREFIX: &str = "LISTINGDESK";
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/";
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DATA_DIR: &str = ".listingdesk";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_POLL_MAX_DURATION_SECS: u64 = 15 * 60;
const DEFAULT_POLL_BACKOFF_MAX_SECS: u64 = 30;
const DEFAULT_ACTIVITY_RETENTION_HOURS: u64 = 24;
const DEFAULT_ACTIVITY_SWEEP_SECS: u64 = 60;

/// Command-line overrides applied on top of file and environment sources.
#[derive(Debug, Args, Default, Clone)]
pub struct SettingsOverrides {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "LISTINGDESK_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    /// Override the backend API base URL, e.g. <http://localhost:8000/api/>.
    #[arg(long = "api-url", env = "LISTINGDESK_API_URL", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Override the request timeout.
    #[arg(long = "api-timeout-seconds", value_name = "SECONDS", global = true)]
    pub api_timeout_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the directory holding the session token and activity log.
    #[arg(long = "data-dir", value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Override the job status polling interval.
    #[arg(long = "poll-interval-ms", value_name = "MILLIS", global = true)]
    pub poll_interval_ms: Option<u64>,

    /// Override the maximum time spent watching one posting job.
    #[arg(long = "poll-max-seconds", value_name = "SECONDS", global = true)]
    pub poll_max_seconds: Option<u64>,
}

/// Fully-resolved client settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub logging: LoggingSettings,
    pub storage: StorageSettings,
    pub poller: PollerSettings,
    pub activity: ActivitySettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub interval: Duration,
    pub max_duration: Duration,
    pub backoff_max: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_duration: Duration::from_secs(DEFAULT_POLL_MAX_DURATION_SECS),
            backoff_max: Duration::from_secs(DEFAULT_POLL_BACKOFF_MAX_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActivitySettings {
    pub retention: Duration,
    pub sweep_interval: Duration,
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(DEFAULT_ACTIVITY_RETENTION_HOURS * 3600),
            sweep_interval: Duration::from_secs(DEFAULT_ACTIVITY_SWEEP_SECS),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(overrides: &SettingsOverrides) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = overrides.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    api: RawApiSettings,
    logging: RawLoggingSettings,
    storage: RawStorageSettings,
    poller: RawPollerSettings,
    activity: RawActivitySettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    base_url: Option<String>,
    timeout_seconds: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStorageSettings {
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPollerSettings {
    interval_ms: Option<u64>,
    max_duration_seconds: Option<u64>,
    backoff_max_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawActivitySettings {
    retention_hours: Option<u64>,
    sweep_interval_seconds: Option<u64>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        if let Some(url) = overrides.api_url.as_ref() {
            self.api.base_url = Some(url.clone());
        }
        if let Some(seconds) = overrides.api_timeout_seconds {
            self.api.timeout_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(dir) = overrides.data_dir.as_ref() {
            self.storage.data_dir = Some(dir.clone());
        }
        if let Some(interval) = overrides.poll_interval_ms {
            self.poller.interval_ms = Some(interval);
        }
        if let Some(max) = overrides.poll_max_seconds {
            self.poller.max_duration_seconds = Some(max);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            api,
            logging,
            storage,
            poller,
            activity,
        } = raw;

        Ok(Self {
            api: build_api_settings(api)?,
            logging: build_logging_settings(logging)?,
            storage: build_storage_settings(storage)?,
            poller: build_poller_settings(poller)?,
            activity: build_activity_settings(activity)?,
        })
    }
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let raw_url = api
        .base_url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
    let base_url = normalize_base_url(&raw_url)
        .map_err(|reason| LoadError::invalid("api.base_url", reason))?;

    let timeout_secs = api.timeout_seconds.unwrap_or(DEFAULT_API_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "api.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let user_agent = api
        .user_agent
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| concat!("listingdesk/", env!("CARGO_PKG_VERSION")).to_string());

    Ok(ApiSettings {
        base_url,
        timeout: Duration::from_secs(timeout_secs),
        user_agent,
    })
}

/// Parse the base URL and make sure relative joins keep its path.
pub fn normalize_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw).map_err(|err| format!("failed to parse `{raw}`: {err}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::WARN,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_storage_settings(storage: RawStorageSettings) -> Result<StorageSettings, LoadError> {
    let data_dir = storage
        .data_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    if data_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "storage.data_dir",
            "path must not be empty",
        ));
    }
    Ok(StorageSettings { data_dir })
}

fn build_poller_settings(poller: RawPollerSettings) -> Result<PollerSettings, LoadError> {
    let interval_ms = poller.interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
    if interval_ms == 0 {
        return Err(LoadError::invalid(
            "poller.interval_ms",
            "must be greater than zero",
        ));
    }

    let max_secs = poller
        .max_duration_seconds
        .unwrap_or(DEFAULT_POLL_MAX_DURATION_SECS);
    let backoff_secs = poller
        .backoff_max_seconds
        .unwrap_or(DEFAULT_POLL_BACKOFF_MAX_SECS);

    let interval = Duration::from_millis(interval_ms);
    let max_duration = Duration::from_secs(max_secs);
    let backoff_max = Duration::from_secs(backoff_secs);

    if max_duration < interval {
        return Err(LoadError::invalid(
            "poller.max_duration_seconds",
            "must be at least one polling interval",
        ));
    }
    if backoff_max < interval {
        return Err(LoadError::invalid(
            "poller.backoff_max_seconds",
            "must be at least one polling interval",
        ));
    }

    Ok(PollerSettings {
        interval,
        max_duration,
        backoff_max,
    })
}

fn build_activity_settings(activity: RawActivitySettings) -> Result<ActivitySettings, LoadError> {
    let retention_hours = activity
        .retention_hours
        .unwrap_or(DEFAULT_ACTIVITY_RETENTION_HOURS);
    if retention_hours == 0 {
        return Err(LoadError::invalid(
            "activity.retention_hours",
            "must be greater than zero",
        ));
    }

    let sweep_secs = activity
        .sweep_interval_seconds
        .unwrap_or(DEFAULT_ACTIVITY_SWEEP_SECS);
    if sweep_secs == 0 {
        return Err(LoadError::invalid(
            "activity.sweep_interval_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ActivitySettings {
        retention: Duration::from_secs(retention_hours.saturating_mul(3600)),
        sweep_interval: Duration::from_secs(sweep_secs),
    })
}
