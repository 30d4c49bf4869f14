//! Configuration management

use crate::db::{DbConfig, DEFAULT_DATABASE_URL};
use crate::pipeline::{
    PipelineConfig, DEFAULT_BATCH_SIZE, DEFAULT_BUFFER_SIZE, DEFAULT_ERROR_BUDGET,
};

/// Default wait between polls while the source downloads, in milliseconds
pub const DEFAULT_WAIT_INTERVAL_MS: u64 = 1_000;

/// Default directory of captured stream files for the replay source
pub const DEFAULT_CAPTURE_DIR: &str = "./capture";

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Ingestion configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub database: DbConfig,
    pub batch_size: usize,
    pub error_budget: i64,
    pub wait_interval_ms: u64,
    pub buffer_size: usize,
    pub capture_dir: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database: DbConfig::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            error_budget: DEFAULT_ERROR_BUDGET,
            wait_interval_ms: DEFAULT_WAIT_INTERVAL_MS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            capture_dir: DEFAULT_CAPTURE_DIR.to_string(),
        }
    }
}

impl IngestConfig {
    /// Load configuration from environment and defaults
    ///
    /// Environment variables:
    /// - `DATABASE_URL`: SQLite URL (default `sqlite://turf.db`)
    /// - `DATABASE_MAX_CONNECTIONS`
    /// - `TDP_BATCH_SIZE`: records per transactional batch
    /// - `TDP_ERROR_BUDGET`: tolerated errors per run
    /// - `TDP_WAIT_INTERVAL_MS`: download backoff interval
    /// - `TDP_BUFFER_SIZE`: read buffer size in bytes
    /// - `TDP_CAPTURE_DIR`: replay-source directory
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        config.database.url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        config.database.max_connections = env_parsed(
            "DATABASE_MAX_CONNECTIONS",
            DEFAULT_DATABASE_MAX_CONNECTIONS,
        );
        config.batch_size = env_parsed("TDP_BATCH_SIZE", DEFAULT_BATCH_SIZE);
        config.error_budget = env_parsed("TDP_ERROR_BUDGET", DEFAULT_ERROR_BUDGET);
        config.wait_interval_ms = env_parsed("TDP_WAIT_INTERVAL_MS", DEFAULT_WAIT_INTERVAL_MS);
        config.buffer_size = env_parsed("TDP_BUFFER_SIZE", DEFAULT_BUFFER_SIZE);

        if let Ok(dir) = std::env::var("TDP_CAPTURE_DIR") {
            config.capture_dir = dir;
        }

        Ok(config)
    }

    /// Pipeline tuning derived from this configuration
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            batch_size: self.batch_size,
            error_budget: self.error_budget,
            wait_interval: std::time::Duration::from_millis(self.wait_interval_ms),
            buffer_size: self.buffer_size,
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.error_budget, 10);
        assert_eq!(config.database.url, "sqlite://turf.db");

        let pipeline = config.pipeline();
        assert_eq!(pipeline.wait_interval.as_millis(), 1_000);
    }
}
