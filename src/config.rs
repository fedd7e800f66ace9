//! Runtime configuration loaded from TOML with environment overrides.
//!
//! Precedence: explicit path > `SCOUTLITE_CONFIG` > `./scoutlite.toml` > defaults,
//! then `SCOUTLITE_DEFAULT_LIMIT`, `SCOUTLITE_MAX_LIMIT` and `SCOUTLITE_SLOW_QUERY_MS`.

use crate::errors::ScoutError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { default_limit: 25, max_limit: 100 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    /// error|warn|info|debug|trace
    pub level: Option<String>,
    pub retention: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub slow_query_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { slow_query_ms: 500 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub pagination: PaginationConfig,
    pub logging: LoggingConfig,
    pub telemetry: TelemetryConfig,
}

impl ScoutConfig {
    /// # Errors
    /// Returns an error for malformed TOML or inconsistent values.
    pub fn from_toml_str(s: &str) -> Result<Self, ScoutError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Returns an error when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ScoutError> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| ScoutError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&s)
    }

    /// Resolves the config file by precedence and applies process environment overrides.
    ///
    /// # Errors
    /// Returns an error when a selected file is unreadable or a value is invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ScoutError> {
        let mut candidates: Vec<(PathBuf, bool)> = Vec::new();
        if let Some(p) = explicit {
            candidates.push((p.to_path_buf(), true));
        }
        if let Ok(p) = std::env::var("SCOUTLITE_CONFIG") {
            candidates.push((PathBuf::from(p), true));
        }
        if let Ok(cur) = std::env::current_dir() {
            candidates.push((cur.join("scoutlite.toml"), false));
        }
        let mut cfg = Self::default();
        for (path, required) in candidates {
            if path.exists() || required {
                log::debug!("loading config from {}", path.display());
                cfg = Self::from_file(&path)?;
                break;
            }
        }
        cfg.apply_env(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Applies overrides read through `var`, then re-validates.
    ///
    /// # Errors
    /// Returns a config error for unparsable numbers or inconsistent limits.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ScoutError> {
        if let Some(v) = var("SCOUTLITE_DEFAULT_LIMIT") {
            self.pagination.default_limit = parse_env("SCOUTLITE_DEFAULT_LIMIT", &v)?;
        }
        if let Some(v) = var("SCOUTLITE_MAX_LIMIT") {
            self.pagination.max_limit = parse_env("SCOUTLITE_MAX_LIMIT", &v)?;
        }
        if let Some(v) = var("SCOUTLITE_SLOW_QUERY_MS") {
            self.telemetry.slow_query_ms = parse_env("SCOUTLITE_SLOW_QUERY_MS", &v)?;
        }
        self.validate()
    }

    /// # Errors
    /// Returns a config error when limits are zero or the default exceeds the maximum.
    pub fn validate(&self) -> Result<(), ScoutError> {
        let p = &self.pagination;
        if p.default_limit == 0 || p.max_limit == 0 {
            return Err(ScoutError::Config("pagination limits must be at least 1".into()));
        }
        if p.default_limit > p.max_limit {
            return Err(ScoutError::Config(format!(
                "default_limit {} exceeds max_limit {}",
                p.default_limit, p.max_limit
            )));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ScoutError> {
    raw.trim().parse().map_err(|_| ScoutError::Config(format!("{key}: cannot parse '{raw}'")))
}
