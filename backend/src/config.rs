//! Runtime configuration from environment variables.
//!
//! Call `dotenvy::dotenv()` first so a local `.env` file is honoured.
//!
//! | Variable                     | Default    |
//! |------------------------------|------------|
//! | `TABLETALK_HOST`             | `0.0.0.0`  |
//! | `TABLETALK_PORT`             | `3000`     |
//! | `TABLETALK_MAX_UPLOAD_BYTES` | 10 MiB     |
//! | `TABLETALK_HISTORY_LIMIT`    | `500`      |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

/// Host settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub max_upload_bytes: usize,
    /// Most recent modification records kept per session
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl Config {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            host: read(&lookup, "TABLETALK_HOST", defaults.host)?,
            port: read(&lookup, "TABLETALK_PORT", defaults.port)?,
            max_upload_bytes: read(&lookup, "TABLETALK_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            history_limit: read(&lookup, "TABLETALK_HISTORY_LIMIT", defaults.history_limit)?,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn read<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("TABLETALK_HOST", "127.0.0.1"),
            ("TABLETALK_PORT", " 8080 "),
            ("TABLETALK_HISTORY_LIMIT", "5"),
        ]))
        .unwrap()
        .with_port(9000);
        assert_eq!(config.addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_invalid_value() {
        let err = Config::from_lookup(lookup(&[("TABLETALK_PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("TABLETALK_PORT"));
    }
}
