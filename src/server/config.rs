use std::time::Duration;

use crate::server::error::config::ConfigError;

/// Default base URL of the guild platform REST API.
pub static DEFAULT_DISCORD_API_URL: &str = "https://discord.com/api/v10";

/// Default interval between expiration reconciler ticks.
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 10;

/// Default upper bound on a single guild platform request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

pub struct Config {
    pub database_url: String,
    pub discord_token: String,
    pub discord_api_url: String,
    pub reconcile_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            discord_token: required("DISCORD_TOKEN")?,
            discord_api_url: std::env::var("DISCORD_API_URL")
                .unwrap_or_else(|_| DEFAULT_DISCORD_API_URL.to_string()),
            reconcile_interval: seconds_var(
                "RECONCILE_INTERVAL_SECS",
                DEFAULT_RECONCILE_INTERVAL_SECS,
            )?,
            request_timeout: seconds_var(
                "DISCORD_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
        })
    }
}

fn required(var: &str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
}

fn seconds_var(var: &str, default: u64) -> Result<Duration, ConfigError> {
    let Ok(raw) = std::env::var(var) else {
        return Ok(Duration::from_secs(default));
    };

    parse_interval(var, &raw)
}

fn parse_interval(var: &str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidEnvValue {
            var: var.to_string(),
            reason: e.to_string(),
        })?;

    if secs == 0 {
        return Err(ConfigError::InvalidEnvValue {
            var: var.to_string(),
            reason: "interval must be greater than zero".to_string(),
        });
    }

    Ok(Duration::from_secs(secs))
}

/// License quota ceilings.
pub mod limits {
    /// Licenses a guild may hold at once
    pub const MAX_LICENSES: u64 = 500;

    /// Licenses a guild with an active premium grant may hold at once
    pub const MAX_LICENSES_PREMIUM: u64 = 2000;

    /// Licenses a single create or generate call may mint
    pub const MAX_LICENSES_PER_COMMAND: u64 = 100;

    /// Licenses a single create or generate call may mint in a premium guild
    pub const MAX_LICENSES_PER_COMMAND_PREMIUM: u64 = 250;

    /// Length of generated alphanumeric license keys
    pub const LICENSE_KEY_LENGTH: usize = 16;

    /// Maximum length of a template name after trimming
    pub const MAX_TEMPLATE_NAME_LENGTH: usize = 64;

    /// Default number of history entries returned by a history query
    pub const DEFAULT_HISTORY_LIMIT: u64 = 10;

    /// Upper bound on history entries returned by a history query
    pub const MAX_HISTORY_LIMIT: u64 = 25;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_interval_seconds() {
        let result = parse_interval("RECONCILE_INTERVAL_SECS", " 30 ");

        assert_eq!(result.unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_zero_interval() {
        let result = parse_interval("RECONCILE_INTERVAL_SECS", "0");

        assert!(matches!(result, Err(ConfigError::InvalidEnvValue { .. })));
    }

    #[test]
    fn rejects_non_numeric_interval() {
        let result = parse_interval("RECONCILE_INTERVAL_SECS", "ten");

        assert!(matches!(result, Err(ConfigError::InvalidEnvValue { .. })));
    }
}
