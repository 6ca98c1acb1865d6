use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
#[error("Invalid {key} value {value:?}: {reason}")]
pub struct ConfigError {
    key: &'static str,
    value: String,
    reason: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub session_ttl: Duration,
    pub backup_on_write: bool,
    pub cors_max_age: Duration,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load("RUST_PORT", "1111")?,
            data_dir: try_load("DATA_DIR", "data")?,
            session_ttl: Duration::from_secs(60 * try_load::<u64>("SESSION_TTL_MINUTES", "720")?),
            backup_on_write: try_load("BACKUP_ON_WRITE", "true")?,
            cors_max_age: Duration::from_secs(try_load("CORS_MAX_AGE_SECS", "3600")?),
        })
    }

    /// Defaults for a given data directory, used by the seed tool and tests.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            port: 1111,
            data_dir: data_dir.into(),
            session_ttl: Duration::from_secs(60 * 720),
            backup_on_write: true,
            cors_max_age: Duration::from_secs(3600),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError {
            key,
            reason: e.to_string(),
            value,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        let port: u16 = try_load("CLINIC_TEST_UNSET_PORT", "1111").unwrap();
        let backup: bool = try_load("CLINIC_TEST_UNSET_BACKUP", "true").unwrap();

        assert_eq!(port, 1111);
        assert!(backup);
    }

    #[test]
    fn test_invalid_default_is_an_error() {
        let err = try_load::<u16>("CLINIC_TEST_UNSET_PORT", "not-a-port").unwrap_err();

        assert!(err.to_string().contains("CLINIC_TEST_UNSET_PORT"));
    }
}
