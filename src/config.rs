//! Runtime settings from environment variables (a `.env` file is loaded by the server first).

use crate::error::ConfigError;
use std::net::SocketAddr;

pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017/to-do-lists";
pub const DEFAULT_DATABASE: &str = "to-do-lists";
pub const DEFAULT_COLLECTION: &str = "todoitems";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub mongodb_uri: String,
    /// `MONGODB_DATABASE`. When unset the store uses the URI's default database, else
    /// [`DEFAULT_DATABASE`].
    pub database: Option<String>,
    pub collection: String,
    pub bind_addr: SocketAddr,
    pub body_limit: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mongodb_uri = lookup("MONGODB_URI").unwrap_or_else(|| DEFAULT_MONGODB_URI.into());
        let database = lookup("MONGODB_DATABASE").filter(|d| !d.is_empty());
        let collection = lookup("TODO_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.into());

        let raw_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key: "BIND_ADDR", value: raw_addr.clone() })?;

        let body_limit = match lookup("BODY_LIMIT_BYTES") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "BODY_LIMIT_BYTES", value: raw.clone() })?,
            None => DEFAULT_BODY_LIMIT,
        };

        Ok(Settings {
            mongodb_uri,
            database,
            collection,
            bind_addr,
            body_limit,
        })
    }
}
