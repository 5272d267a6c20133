use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_LOG_DIR: &str = "./logs";
const DEFAULT_LOG_FILE: &str = "relay.log";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not a valid socket address: {1:?}")]
    InvalidAddr(&'static str, String),
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    pub addr: SocketAddr,
    pub log_dir: PathBuf,
    pub log_file: String,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // Unset keys fall back to the defaults, set-but-empty keys are an error
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr = setting(&lookup, "GOMOKU_RELAY_ADDR", DEFAULT_ADDR)?;
        let addr = addr
            .parse()
            .map_err(|_| ConfigError::InvalidAddr("GOMOKU_RELAY_ADDR", addr))?;
        Ok(RelayConfig {
            addr,
            log_dir: PathBuf::from(setting(&lookup, "GOMOKU_LOG_DIR", DEFAULT_LOG_DIR)?),
            log_file: setting(&lookup, "GOMOKU_LOG_FILE", DEFAULT_LOG_FILE)?,
        })
    }

    pub fn ws_url(&self, connection_id: &str) -> String {
        format!("ws://{}/ws/{}", self.addr, connection_id)
    }
}

fn setting(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<String, ConfigError> {
    match lookup(key) {
        None => Ok(default.to_string()),
        Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(key)),
        Some(value) => Ok(value.trim().to_string()),
    }
}
