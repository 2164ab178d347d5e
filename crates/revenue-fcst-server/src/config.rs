//! Server configuration from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use revenue_fcst_core::DEFAULT_MAX_HISTORY_DAYS;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TIME_BUDGET_MS: u64 = 10_000;
pub const DEFAULT_MAX_HORIZON_DAYS: usize = 730;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Wall-clock budget for candidate fitting per request
    pub time_budget: Option<Duration>,
    pub max_horizon_days: usize,
    /// Longest accepted history span in days
    pub max_history_days: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            time_budget: Some(Duration::from_millis(DEFAULT_TIME_BUDGET_MS)),
            max_horizon_days: DEFAULT_MAX_HORIZON_DAYS,
            max_history_days: DEFAULT_MAX_HISTORY_DAYS,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = parse_var(&lookup, "HOST", defaults.host)?;
        let port = parse_var(&lookup, "PORT", defaults.port)?;
        let budget_ms = parse_var(&lookup, "FORECAST_TIME_BUDGET_MS", DEFAULT_TIME_BUDGET_MS)?;
        let max_horizon_days = parse_var(
            &lookup,
            "FORECAST_MAX_HORIZON_DAYS",
            defaults.max_horizon_days,
        )?;

        let max_history_days = parse_var(
            &lookup,
            "FORECAST_MAX_HISTORY_DAYS",
            defaults.max_history_days,
        )?;

        require_positive("FORECAST_MAX_HORIZON_DAYS", max_horizon_days)?;
        require_positive("FORECAST_MAX_HISTORY_DAYS", max_history_days)?;

        Ok(Self {
            host,
            port,
            time_budget: (budget_ms > 0).then(|| Duration::from_millis(budget_ms)),
            max_horizon_days,
            max_history_days,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn require_positive(key: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}
