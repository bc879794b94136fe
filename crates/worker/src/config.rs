//! Worker configuration loaded from environment variables.

use std::time::Duration;

/// Worker configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `DATABASE_URL` — PostgreSQL event store; in-memory when unset
/// - `SUBSCRIPTION_GROUP` — checkpoint group name (default: `"query-side"`)
/// - `BATCH_SIZE` — events per subscription batch (default: `256`)
/// - `POLL_INTERVAL_MS` — idle poll delay (default: `200`)
/// - `MAX_IN_FLIGHT` — main pipeline concurrency bound (default: `16`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub subscription_group: String,
    pub batch_size: usize,
    pub poll_interval: Duration,
    pub max_in_flight: usize,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            subscription_group: std::env::var("SUBSCRIPTION_GROUP")
                .unwrap_or_else(|_| "query-side".to_string()),
            batch_size: std::env::var("BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(256),
            poll_interval: Duration::from_millis(
                std::env::var("POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(200),
            ),
            max_in_flight: std::env::var("MAX_IN_FLIGHT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(16),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            subscription_group: "query-side".to_string(),
            batch_size: 256,
            poll_interval: Duration::from_millis(200),
            max_in_flight: 16,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = Config::default();
        assert_eq!(config.subscription_group, "query-side");
        assert_eq!(config.batch_size, 256);
        assert_eq!(config.poll_interval, Duration::from_millis(200));
        assert_eq!(config.max_in_flight, 16);
        assert!(config.database_url.is_none());
    }
}
