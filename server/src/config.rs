//! Process configuration: defaults plus environment overrides.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DB_NAME: &str = "demo_todo";
pub const DEFAULT_COLLECTION: &str = "todo";
pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: expected {expected}")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub uri: String,
    pub name: String,
    pub collection: String,
    /// Upper bound on server selection, which also bounds the startup ping.
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_MONGODB_URI.to_string(),
            name: DEFAULT_DB_NAME.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub database: DatabaseConfig,
    pub shutdown_grace: Duration,
    /// Limit on receiving a request head, and on keep-alive idleness.
    pub read_timeout: Duration,
    /// Limit on producing a response once the request has arrived.
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            database: DatabaseConfig::default(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset keys keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(port) = lookup("PORT") {
            let port = parse(&port, "PORT", "a port number")?;
            config.listen_addr.set_port(port);
        }
        if let Some(uri) = lookup("TODO_MONGODB_URI") {
            config.database.uri = uri;
        }
        if let Some(name) = lookup("TODO_DB_NAME") {
            config.database.name = name;
        }
        if let Some(collection) = lookup("TODO_COLLECTION") {
            config.database.collection = collection;
        }
        if let Some(secs) = lookup("TODO_SHUTDOWN_GRACE_SECS") {
            config.shutdown_grace = seconds(&secs, "TODO_SHUTDOWN_GRACE_SECS")?;
        }
        if let Some(secs) = lookup("TODO_READ_TIMEOUT_SECS") {
            config.read_timeout = seconds(&secs, "TODO_READ_TIMEOUT_SECS")?;
        }
        if let Some(secs) = lookup("TODO_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = seconds(&secs, "TODO_REQUEST_TIMEOUT_SECS")?;
        }

        Ok(config)
    }
}

fn seconds(value: &str, key: &'static str) -> Result<Duration, ConfigError> {
    parse(value, key, "a whole number of seconds").map(Duration::from_secs)
}

fn parse<T: std::str::FromStr>(
    value: &str,
    key: &'static str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
        expected,
    })
}
