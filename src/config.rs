/**
 * Configuration
 * Server and matching settings, read from PALM_* environment variables
 */

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.85;
pub const DEFAULT_LANDMARK_COUNT: usize = 21;

/// Accept policy and expected sample shape for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Minimum similarity (inclusive) for a verification to be accepted.
    pub threshold: f64,
    /// Points per landmark vector produced by the upstream extractor.
    pub landmark_count: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            landmark_count: DEFAULT_LANDMARK_COUNT,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() || !(-1.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::Threshold(self.threshold));
        }
        if self.landmark_count == 0 {
            return Err(ConfigError::LandmarkCount);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub matching: MatchConfig,
    /// Directory for the file store; the in-memory store is used when unset.
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            matching: MatchConfig::default(),
            store_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from any variable source, falling back to defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = parse_var(&lookup, "PALM_BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(threshold) = parse_var(&lookup, "PALM_MATCH_THRESHOLD")? {
            config.matching.threshold = threshold;
        }
        if let Some(count) = parse_var(&lookup, "PALM_LANDMARK_COUNT")? {
            config.matching.landmark_count = count;
        }
        config.store_dir = lookup("PALM_STORE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        config.matching.validate()?;
        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Parse {
                var,
                reason: e.to_string(),
                value,
            }),
    }
}
