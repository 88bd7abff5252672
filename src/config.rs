//! Configuration loading.
//!
//! Reads `missionlog.toml`. Every field has a default, so a missing file or a
//! partial file is fine; a file that does not parse is an error.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use chrono::{FixedOffset, NaiveDate, Utc};
use directories::ProjectDirs;
use missionlog_core::clock::parse_utc_offset;
use missionlog_core::StatsConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "missionlog.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub clock: ClockConfig,

    #[serde(default)]
    pub stats: StatsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database location; the platform data dir when unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClockConfig {
    /// Reference timezone for day boundaries, e.g. `+02:00` or `Z`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsSection {
    #[serde(default = "default_stats_start")]
    pub default_start: NaiveDate,

    /// Overrides `default_start` with a trailing window ending today.
    #[serde(default)]
    pub default_window_days: Option<u32>,
}

fn default_stats_start() -> NaiveDate {
    StatsConfig::default().default_start
}

impl Default for StatsSection {
    fn default() -> Self {
        Self {
            default_start: default_stats_start(),
            default_window_days: None,
        }
    }
}

impl Config {
    /// `<config dir>/missionlog.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "missionlog")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Load `path`, or the default location. A missing file yields defaults.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn utc_offset(&self) -> anyhow::Result<FixedOffset> {
        parse_utc_offset(&self.clock.utc_offset)
            .ok_or_else(|| anyhow!("Invalid clock.utc_offset: {}", self.clock.utc_offset))
    }

    /// Stats defaults, with the trailing window checked against today.
    pub fn stats_config(&self) -> anyhow::Result<StatsConfig> {
        let stats = StatsConfig {
            default_start: self.stats.default_start,
            default_window_days: self.stats.default_window_days,
        };
        let today = Utc::now().with_timezone(&self.utc_offset()?).date_naive();
        stats.window_start(today).with_context(|| {
            format!(
                "Invalid stats.default_window_days: {:?}",
                stats.default_window_days
            )
        })?;
        Ok(stats)
    }
}
