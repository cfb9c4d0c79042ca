//! Configuration types and loading
//!
//! Defaults cover a local development backend; every value can be
//! overridden through `CHANTIER_*` environment variables (a `.env` file is
//! loaded by the binary before [`AppConfig::from_env`] runs).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Remote store (REST API) configuration
    pub remote: RemoteConfig,

    /// Local durable cache configuration
    pub cache: CacheConfig,

    /// Background sync configuration
    pub sync: SyncConfig,

    /// Status indicator timing
    pub status: StatusConfig,

    /// Team roster and working hours
    pub team: TeamConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Base URL, e.g. `http://127.0.0.1:5000/api`
    pub base_url: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Directory holding one JSON file per cache key
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    pub interval_seconds: u64,
    pub initial_delay_seconds: u64,
    /// Retries after the first failed fetch
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusConfig {
    pub success_clear_ms: u64,
    pub error_clear_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeamConfig {
    pub assignees: Vec<String>,
    pub working_hours: WorkingHours,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct WorkingHours {
    pub start_hour: u32,
    pub end_hour: u32,
    /// ISO weekday numbers (1 = Monday .. 7 = Sunday)
    pub days: Vec<u32>,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start_hour: 8,
            end_hour: 17,
            days: vec![1, 2, 3, 4, 5],
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig {
                base_url: "http://127.0.0.1:5000/api".to_string(),
                request_timeout_seconds: 30,
            },
            cache: CacheConfig {
                dir: std::env::temp_dir().join("chantier-planner"),
            },
            sync: SyncConfig {
                interval_seconds: 300, // 5 minutes
                initial_delay_seconds: 2,
                max_retries: 3,
                retry_delay_ms: 2000,
            },
            status: StatusConfig {
                success_clear_ms: 2000,
                error_clear_ms: 5000,
            },
            team: TeamConfig {
                assignees: ["wang", "he", "hu", "guo"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                working_hours: WorkingHours::default(),
            },
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable not set: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl From<ConfigError> for crate::PlanError {
    fn from(err: ConfigError) -> Self {
        crate::PlanError::Config(err.to_string())
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unparseable numbers keep their defaults; structurally wrong values
    /// (a non-HTTP base URL, inverted working hours) are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let number = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        // Remote
        if let Some(url) = lookup("CHANTIER_API_URL") {
            let url = url.trim().trim_end_matches('/').to_string();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    key: "CHANTIER_API_URL".into(),
                    message: format!("expected an http(s) URL, got {:?}", url),
                });
            }
            config.remote.base_url = url;
        }
        config.remote.request_timeout_seconds = number(
            "CHANTIER_REQUEST_TIMEOUT_SECS",
            config.remote.request_timeout_seconds,
        );

        // Cache
        if let Some(dir) = lookup("CHANTIER_CACHE_DIR").filter(|d| !d.trim().is_empty()) {
            config.cache.dir = PathBuf::from(dir);
        }

        // Sync
        config.sync.interval_seconds =
            number("CHANTIER_SYNC_INTERVAL_SECS", config.sync.interval_seconds);
        config.sync.initial_delay_seconds = number(
            "CHANTIER_SYNC_INITIAL_DELAY_SECS",
            config.sync.initial_delay_seconds,
        );
        config.sync.max_retries =
            number("CHANTIER_SYNC_MAX_RETRIES", u64::from(config.sync.max_retries)) as u32;
        config.sync.retry_delay_ms =
            number("CHANTIER_SYNC_RETRY_DELAY_MS", config.sync.retry_delay_ms);

        // Status
        config.status.success_clear_ms =
            number("CHANTIER_STATUS_SUCCESS_CLEAR_MS", config.status.success_clear_ms);
        config.status.error_clear_ms =
            number("CHANTIER_STATUS_ERROR_CLEAR_MS", config.status.error_clear_ms);

        // Team
        if let Some(roster) = lookup("CHANTIER_ASSIGNEES") {
            let mut assignees: Vec<String> = Vec::new();
            for name in roster.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                if !assignees.iter().any(|a| a == name) {
                    assignees.push(name.to_string());
                }
            }
            if !assignees.is_empty() {
                config.team.assignees = assignees;
            }
        }
        let hours = &mut config.team.working_hours;
        hours.start_hour = number("CHANTIER_WORK_START_HOUR", u64::from(hours.start_hour)) as u32;
        hours.end_hour = number("CHANTIER_WORK_END_HOUR", u64::from(hours.end_hour)) as u32;
        if hours.start_hour >= hours.end_hour || hours.end_hour > 24 {
            return Err(ConfigError::InvalidValue {
                key: "CHANTIER_WORK_START_HOUR".into(),
                message: format!(
                    "working hours {}:00-{}:00 are not a valid range",
                    hours.start_hour, hours.end_hour
                ),
            });
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.remote.request_timeout_seconds)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync.interval_seconds)
    }

    pub fn sync_initial_delay(&self) -> Duration {
        Duration::from_secs(self.sync.initial_delay_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.sync.retry_delay_ms)
    }

    /// `{base}/chantiers`
    pub fn chantiers_url(&self) -> String {
        format!("{}/chantiers", self.remote.base_url)
    }
}
