//! Configuration loading
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/tallybook/config/tallybook.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Keys missing from an override keep their default values. The advisor
//! section can additionally be overridden from the environment:
//! - `AI_BACKEND`: ollama, mock or disabled
//! - `OLLAMA_HOST`: Ollama server URL
//! - `OLLAMA_MODEL`: model name

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::anomaly::{AnomalyConfig, DEFAULT_HISTORY_DAYS};
use crate::error::{Error, Result};
use crate::streak::DEFAULT_LOOKBACK_CAP;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/tallybook.toml");

/// Which advisory backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Ollama,
    Mock,
    Disabled,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Mock => "mock",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            _ => Err(format!(
                "Unknown advisor backend: {} (valid: ollama, mock, disabled)",
                s
            )),
        }
    }
}

/// Advisory backend settings
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisorConfig {
    pub backend: BackendKind,
    pub host: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Ollama,
            host: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Effective configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TallyConfig {
    pub anomaly: AnomalyConfig,
    /// Days of history used for anomaly baselines
    pub history_days: i64,
    pub streak_lookback_cap: u32,
    pub advisor: AdvisorConfig,
    /// File the config was read from; `None` for the embedded defaults
    pub source: Option<PathBuf>,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            anomaly: AnomalyConfig::default(),
            history_days: DEFAULT_HISTORY_DAYS,
            streak_lookback_cap: DEFAULT_LOOKBACK_CAP,
            advisor: AdvisorConfig::default(),
            source: None,
        }
    }
}

impl TallyConfig {
    /// Load from `path`, the default override location, or embedded defaults
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// override silently falls back to the embedded config.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (content, source) = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                (content, Some(path.to_path_buf()))
            }
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => {
                    let content = fs::read_to_string(&path).map_err(|e| {
                        Error::Config(format!("Failed to read {}: {}", path.display(), e))
                    })?;
                    (content, Some(path))
                }
                None => (DEFAULT_CONFIG.to_string(), None),
            },
        };

        let mut config = Self::from_toml(&content)?;
        config.source = source;
        debug!(source = ?config.source, "Loaded configuration");
        Ok(config)
    }

    /// Parse TOML on top of the built-in defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();

        if let Some(anomaly) = raw.anomaly {
            if let Some(ratio) = anomaly.threshold_ratio {
                config.anomaly.threshold_ratio = ratio;
            }
            if let Some(floor) = anomaly.absolute_floor {
                config.anomaly.absolute_floor = floor;
            }
            if let Some(days) = anomaly.history_days {
                config.history_days = days;
            }
        }

        if let Some(streak) = raw.streak {
            if let Some(cap) = streak.lookback_cap_days {
                config.streak_lookback_cap = cap;
            }
        }

        if let Some(advisor) = raw.advisor {
            if let Some(backend) = advisor.backend {
                config.advisor.backend = backend.parse().map_err(Error::Config)?;
            }
            if let Some(host) = advisor.host {
                config.advisor.host = host;
            }
            if let Some(model) = advisor.model {
                config.advisor.model = model;
            }
            if let Some(timeout) = advisor.timeout_secs {
                config.advisor.timeout = Duration::from_secs(timeout);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply `AI_BACKEND`, `OLLAMA_HOST` and `OLLAMA_MODEL` from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply advisor overrides from an arbitrary variable lookup
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(backend) = lookup("AI_BACKEND") {
            match backend.parse() {
                Ok(kind) => self.advisor.backend = kind,
                Err(e) => warn!("Ignoring AI_BACKEND: {}", e),
            }
        }
        if let Some(host) = lookup("OLLAMA_HOST").filter(|h| !h.trim().is_empty()) {
            self.advisor.host = host;
        }
        if let Some(model) = lookup("OLLAMA_MODEL").filter(|m| !m.trim().is_empty()) {
            self.advisor.model = model;
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.anomaly.threshold_ratio.is_finite() && self.anomaly.threshold_ratio > 0.0) {
            return Err(Error::Config(format!(
                "anomaly.threshold_ratio must be a positive number, got {}",
                self.anomaly.threshold_ratio
            )));
        }
        if !(self.anomaly.absolute_floor.is_finite() && self.anomaly.absolute_floor >= 0.0) {
            return Err(Error::Config(format!(
                "anomaly.absolute_floor must be zero or more, got {}",
                self.anomaly.absolute_floor
            )));
        }
        if self.history_days <= 0 {
            return Err(Error::Config(format!(
                "anomaly.history_days must be positive, got {}",
                self.history_days
            )));
        }
        if self.streak_lookback_cap == 0 {
            return Err(Error::Config(
                "streak.lookback_cap_days must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tallybook").join("config").join("tallybook.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    anomaly: Option<RawAnomaly>,
    streak: Option<RawStreak>,
    advisor: Option<RawAdvisor>,
}

#[derive(Debug, Deserialize)]
struct RawAnomaly {
    threshold_ratio: Option<f64>,
    absolute_floor: Option<f64>,
    history_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawStreak {
    lookback_cap_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawAdvisor {
    backend: Option<String>,
    host: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}
