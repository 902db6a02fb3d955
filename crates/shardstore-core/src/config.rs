//! Configuration module
//!
//! Service configuration is read from environment variables (optionally seeded from a
//! `.env` file) and validated before any backend is built.

use std::env;
use std::str::FromStr;

use crate::chunking::{ChunkingPolicy, DEFAULT_MIN_CHUNK_SIZE, DEFAULT_SPLIT_COUNT};
use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 8002;
const BACKEND_COUNT: usize = 7;
const BACKEND_CAPACITY_MB: u64 = 100;
const MAX_UPLOAD_SIZE_MB: u64 = 1024;
const SHUTDOWN_GRACE_SECS: u64 = 5;

/// Parse `key` from the environment, or `default` when it is unset
fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, anyhow::Error> {
    parse_value(key, env::var(key).ok(), default)
}

fn parse_value<T: FromStr>(
    key: &str,
    value: Option<String>,
    default: T,
) -> Result<T, anyhow::Error> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

/// Convert a megabyte setting to bytes, rejecting values that overflow `u64`
fn megabytes(key: &str, value: u64) -> Result<u64, anyhow::Error> {
    value
        .checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("{} is too large: {} MB", key, value))
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    // Backend pool
    pub storage_backend: StorageBackend,
    pub backend_count: usize,
    pub backend_capacity_bytes: u64,
    pub local_storage_path: Option<String>,
    // Placement
    pub split_count: usize,
    pub min_chunk_size_bytes: u64,
    pub max_upload_size_bytes: u64,
    /// Serve records whose write has not completed yet.
    pub allow_incomplete_reads: bool,
    /// Delay between a termination signal and the start of graceful shutdown.
    pub shutdown_grace_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::Memory,
        };

        let config = Config {
            server_port: env_parse("PORT", SERVER_PORT)?,
            environment,
            storage_backend,
            backend_count: env_parse("BACKEND_COUNT", BACKEND_COUNT)?,
            backend_capacity_bytes: megabytes(
                "BACKEND_CAPACITY_MB",
                env_parse("BACKEND_CAPACITY_MB", BACKEND_CAPACITY_MB)?,
            )?,
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok().filter(|s| !s.is_empty()),
            split_count: env_parse("SPLIT_COUNT", DEFAULT_SPLIT_COUNT)?,
            min_chunk_size_bytes: env_parse("MIN_CHUNK_SIZE_BYTES", DEFAULT_MIN_CHUNK_SIZE)?,
            max_upload_size_bytes: megabytes(
                "MAX_UPLOAD_SIZE_MB",
                env_parse("MAX_UPLOAD_SIZE_MB", MAX_UPLOAD_SIZE_MB)?,
            )?,
            allow_incomplete_reads: parse_value(
                "ALLOW_INCOMPLETE_READS",
                env::var("ALLOW_INCOMPLETE_READS").ok().map(|v| v.to_lowercase()),
                false,
            )?,
            shutdown_grace_secs: env_parse("SHUTDOWN_GRACE_SECS", SHUTDOWN_GRACE_SECS)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.backend_count == 0 {
            return Err(anyhow::anyhow!("BACKEND_COUNT must be at least 1"));
        }

        if self.split_count == 0 {
            return Err(anyhow::anyhow!("SPLIT_COUNT must be at least 1"));
        }

        if self.split_count > self.backend_count {
            return Err(anyhow::anyhow!(
                "SPLIT_COUNT ({}) cannot exceed BACKEND_COUNT ({})",
                self.split_count,
                self.backend_count
            ));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be at least 1"));
        }

        match self.storage_backend {
            StorageBackend::Memory => {}
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn chunking_policy(&self) -> ChunkingPolicy {
        ChunkingPolicy::new(self.split_count, self.min_chunk_size_bytes).unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            storage_backend: StorageBackend::Memory,
            backend_count: BACKEND_COUNT,
            backend_capacity_bytes: BACKEND_CAPACITY_MB * 1024 * 1024,
            local_storage_path: None,
            split_count: DEFAULT_SPLIT_COUNT,
            min_chunk_size_bytes: DEFAULT_MIN_CHUNK_SIZE,
            max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            allow_incomplete_reads: false,
            shutdown_grace_secs: SHUTDOWN_GRACE_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server_port, 8002);
        assert_eq!(config.backend_count, 7);
        assert_eq!(config.backend_capacity_bytes, 100 * 1024 * 1024);
        assert!(!config.is_production());
    }

    #[test]
    fn local_backend_requires_path() {
        let config = Config {
            storage_backend: StorageBackend::Local,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            storage_backend: StorageBackend::Local,
            local_storage_path: Some("/var/lib/shardstore".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn split_count_bounded_by_backends() {
        let config = Config {
            split_count: 8,
            backend_count: 7,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            split_count: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(parse_value("PORT", None, 8002u16).unwrap(), 8002);
        assert_eq!(parse_value("PORT", Some(" 9000 ".to_string()), 8002u16).unwrap(), 9000);

        let err =
            parse_value("BACKEND_CAPACITY_MB", Some("lots".to_string()), 100u64).unwrap_err();
        assert!(err.to_string().contains("BACKEND_CAPACITY_MB"));
        assert!(parse_value("MAX_UPLOAD_SIZE_MB", Some("-1".to_string()), 1024u64).is_err());
        assert!(parse_value("ALLOW_INCOMPLETE_READS", Some("maybe".to_string()), false).is_err());
    }

    #[test]
    fn megabyte_settings_do_not_overflow() {
        assert_eq!(megabytes("BACKEND_CAPACITY_MB", 100).unwrap(), 100 * 1024 * 1024);

        let err = megabytes("BACKEND_CAPACITY_MB", u64::MAX / 1024).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn production_detection() {
        let config = Config {
            environment: "Prod".to_string(),
            ..Config::default()
        };
        assert!(config.is_production());
    }

    #[test]
    fn chunking_policy_follows_config() {
        let config = Config {
            split_count: 3,
            min_chunk_size_bytes: 4,
            ..Config::default()
        };
        let policy = config.chunking_policy();
        assert_eq!(policy.split_count(), 3);
        assert_eq!(policy.min_chunk_size(), 4);
    }
}
