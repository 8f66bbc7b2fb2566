// Configuration from the environment (with optional .env file)

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Json,
    Sqlite,
}

impl StoreKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(StoreKind::Memory),
            "json" | "file" => Some(StoreKind::Json),
            "sqlite" | "db" => Some(StoreKind::Sqlite),
            _ => None,
        }
    }

    fn default_path(&self) -> PathBuf {
        match self {
            StoreKind::Memory => PathBuf::new(),
            StoreKind::Json => PathBuf::from("budget_data.json"),
            StoreKind::Sqlite => PathBuf::from("budget.db"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub path: PathBuf,
    /// Seed the starter categories into an empty SQLite database
    pub seed_defaults: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub store: StoreConfig,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_raw = lookup("BUDGET_LISTEN_ADDR").unwrap_or_else(|| "127.0.0.1:5000".into());
        let listen_addr = listen_raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "BUDGET_LISTEN_ADDR",
                value: listen_raw.clone(),
            })?;

        let kind = match lookup("BUDGET_STORE") {
            Some(raw) => StoreKind::parse(&raw).ok_or(ConfigError::InvalidValue {
                key: "BUDGET_STORE",
                value: raw,
            })?,
            None => StoreKind::Json,
        };

        let path = lookup("BUDGET_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| kind.default_path());

        let seed_defaults = match lookup("BUDGET_SEED_DEFAULTS") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "BUDGET_SEED_DEFAULTS",
                        value: raw,
                    })
                }
            },
            None => true,
        };

        let log_format = match lookup("BUDGET_LOG_FORMAT") {
            Some(raw) if raw.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(raw) if raw.eq_ignore_ascii_case("text") => LogFormat::Text,
            Some(raw) => {
                return Err(ConfigError::InvalidValue {
                    key: "BUDGET_LOG_FORMAT",
                    value: raw,
                })
            }
            None => LogFormat::Text,
        };

        Ok(Config {
            listen_addr,
            store: StoreConfig {
                kind,
                path,
                seed_defaults,
            },
            log_format,
        })
    }
}
