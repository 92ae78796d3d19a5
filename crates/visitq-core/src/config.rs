//! Service configuration, read from a TOML file.
//!
//! Every section has defaults except `[devices]`, whose catalog path must be
//! given. `load` parses and then validates; a file that loads is usable.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;
use serde::Deserialize;

use crate::app::permits::DEFAULT_PERMITS;
use crate::app::planner::TransitionTimePlanner;
use crate::app::reaper::ReclaimPolicy;
use crate::app::scheduler::DEFAULT_TICK_INTERVAL;
use crate::domain::Owner;

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Upper bound for the scheduler periods: 30 days.
pub const MAX_PERIOD_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path:?}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file at {path:?}")]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{message}")]
    Validation { message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: Service,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    pub devices: Devices,
    #[serde(default)]
    pub planner: PlannerConfig,
    /// Owners known to the built-in directory.
    #[serde(default)]
    pub owners: Vec<Owner>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Service {
    pub log_level: String,
}

impl Default for Service {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub tick_interval_secs: u64,
    /// Absent disables stale-claim reclaiming.
    pub reclaim_after_secs: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: DEFAULT_TICK_INTERVAL.as_secs(),
            reclaim_after_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub permits: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            permits: DEFAULT_PERMITS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Devices {
    /// JSON device catalog. Relative paths resolve against the config file.
    pub catalog: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub utc_offset_minutes: i32,
}

impl Config {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.tick_interval_secs)
    }

    pub fn reclaim_policy(&self) -> ReclaimPolicy {
        match self.scheduler.reclaim_after_secs {
            Some(secs) => ReclaimPolicy::after(chrono::Duration::seconds(secs as i64)),
            None => ReclaimPolicy::disabled(),
        }
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        self.planner
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ConfigError::Validation {
                message: "planner.utc_offset_minutes must be within one day of UTC.".to_string(),
            })
    }

    pub fn planner(&self) -> Result<TransitionTimePlanner> {
        Ok(TransitionTimePlanner::new(self.utc_offset()?))
    }
}

pub fn load(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cfg = parse(&raw).map_err(|source| ConfigError::ParseConfig {
        path: path.to_path_buf(),
        source,
    })?;

    if cfg.devices.catalog.is_relative() {
        if let Some(dir) = path.parent() {
            cfg.devices.catalog = dir.join(&cfg.devices.catalog);
        }
    }

    validate(&cfg)?;
    Ok(cfg)
}

pub fn parse(raw: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(raw)
}

pub fn validate(cfg: &Config) -> Result<()> {
    if cfg.service.log_level.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "service.log_level must be non-empty.".to_string(),
        });
    }
    if cfg.scheduler.tick_interval_secs == 0 {
        return Err(ConfigError::Validation {
            message: "scheduler.tick_interval_secs must be greater than zero.".to_string(),
        });
    }
    if cfg.scheduler.tick_interval_secs > MAX_PERIOD_SECS {
        return Err(ConfigError::Validation {
            message: format!("scheduler.tick_interval_secs must be at most {MAX_PERIOD_SECS}."),
        });
    }
    if cfg.scheduler.reclaim_after_secs == Some(0) {
        return Err(ConfigError::Validation {
            message: "scheduler.reclaim_after_secs must be greater than zero when set.".to_string(),
        });
    }
    if cfg
        .scheduler
        .reclaim_after_secs
        .is_some_and(|secs| secs > MAX_PERIOD_SECS)
    {
        return Err(ConfigError::Validation {
            message: format!("scheduler.reclaim_after_secs must be at most {MAX_PERIOD_SECS}."),
        });
    }
    if cfg.resolver.permits == 0 {
        return Err(ConfigError::Validation {
            message: "resolver.permits must be greater than zero.".to_string(),
        });
    }
    if cfg.devices.catalog.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "devices.catalog must be non-empty.".to_string(),
        });
    }
    cfg.utc_offset()?;

    let mut seen = std::collections::HashSet::new();
    if let Some(owner) = cfg.owners.iter().find(|owner| !seen.insert(owner.id)) {
        return Err(ConfigError::Validation {
            message: format!("owners lists {} more than once.", owner.id),
        });
    }
    Ok(())
}
