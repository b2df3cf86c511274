//! Gateway configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_MAX_CONNECTIONS: &str = "5";
const DEFAULT_ANALYSIS_TIMEOUT_SECS: &str = "30";
const DEFAULT_SUBMIT_MODE: &str = "sync";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// How `POST /submit` relates to the analysis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Answer only after the job reached a terminal state.
    Sync,
    /// Answer as soon as the job is recorded; analyze on a background task.
    Background,
}

impl FromStr for SubmitMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sync" => Ok(SubmitMode::Sync),
            "background" | "async" => Ok(SubmitMode::Background),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub analysis_service_url: Url,
    pub analysis_timeout: Duration,
    pub submit_mode: SubmitMode,
    pub store: StoreBackend,
    /// Allowed CORS origin; any origin when unset.
    pub client_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let analysis_service_url = var("ANALYSIS_SERVICE_URL")
            .ok_or(ConfigError::Missing("ANALYSIS_SERVICE_URL"))?;
        let analysis_service_url =
            Url::parse(&analysis_service_url).map_err(|_| ConfigError::Invalid {
                name: "ANALYSIS_SERVICE_URL",
                value: analysis_service_url.clone(),
            })?;

        let store = match var("JOB_STORE").as_deref().unwrap_or("postgres") {
            "postgres" => StoreBackend::Postgres {
                database_url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse_var(
                    "DATABASE_MAX_CONNECTIONS",
                    var("DATABASE_MAX_CONNECTIONS"),
                    DEFAULT_MAX_CONNECTIONS,
                )?,
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "JOB_STORE",
                    value: other.to_string(),
                })
            }
        };

        let timeout_secs: u64 = parse_var(
            "ANALYSIS_TIMEOUT_SECS",
            var("ANALYSIS_TIMEOUT_SECS"),
            DEFAULT_ANALYSIS_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "ANALYSIS_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Config {
            bind_addr: parse_var("BIND_ADDR", var("BIND_ADDR"), DEFAULT_BIND_ADDR)?,
            analysis_service_url,
            analysis_timeout: Duration::from_secs(timeout_secs),
            submit_mode: parse_var("SUBMIT_MODE", var("SUBMIT_MODE"), DEFAULT_SUBMIT_MODE)?,
            store,
            client_url: var("CLIENT_URL"),
        })
    }
}

fn parse_var<T: FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: &str,
) -> Result<T, ConfigError> {
    let value = raw.unwrap_or_else(|| default.to_string());
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_with_required_vars() {
        let config = config(&[
            ("ANALYSIS_SERVICE_URL", "http://analysis:8080"),
            ("DATABASE_URL", "postgres://postgres@db/analyti_core"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.analysis_timeout, Duration::from_secs(30));
        assert_eq!(config.submit_mode, SubmitMode::Sync);
        assert_eq!(
            config.store,
            StoreBackend::Postgres {
                database_url: "postgres://postgres@db/analyti_core".into(),
                max_connections: 5,
            }
        );
        assert!(config.client_url.is_none());
    }

    #[test]
    fn analysis_url_is_required() {
        assert_eq!(
            config(&[("DATABASE_URL", "postgres://db")]).unwrap_err(),
            ConfigError::Missing("ANALYSIS_SERVICE_URL")
        );
        assert_eq!(
            config(&[("ANALYSIS_SERVICE_URL", "  "), ("DATABASE_URL", "postgres://db")])
                .unwrap_err(),
            ConfigError::Missing("ANALYSIS_SERVICE_URL")
        );
    }

    #[test]
    fn database_url_only_needed_for_postgres() {
        assert_eq!(
            config(&[("ANALYSIS_SERVICE_URL", "http://analysis")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        let config = config(&[
            ("ANALYSIS_SERVICE_URL", "http://analysis"),
            ("JOB_STORE", "memory"),
        ])
        .unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config(&[
            ("ANALYSIS_SERVICE_URL", "http://analysis"),
            ("JOB_STORE", "memory"),
            ("BIND_ADDR", "0.0.0.0:8000"),
            ("ANALYSIS_TIMEOUT_SECS", "5"),
            ("SUBMIT_MODE", "background"),
            ("CLIENT_URL", "http://localhost:5173"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.analysis_timeout, Duration::from_secs(5));
        assert_eq!(config.submit_mode, SubmitMode::Background);
        assert_eq!(config.client_url.as_deref(), Some("http://localhost:5173"));
    }

    #[test]
    fn invalid_values_are_reported() {
        let base = [("ANALYSIS_SERVICE_URL", "http://analysis"), ("JOB_STORE", "memory")];

        let err = config(&[base[0], base[1], ("SUBMIT_MODE", "later")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "SUBMIT_MODE", .. }));

        let err = config(&[base[0], base[1], ("ANALYSIS_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "ANALYSIS_TIMEOUT_SECS", .. }));

        let err = config(&[base[0], ("JOB_STORE", "mysql")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "JOB_STORE", .. }));

        let err = config(&[("ANALYSIS_SERVICE_URL", "not a url"), base[1]]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "ANALYSIS_SERVICE_URL", .. }));
    }
}
