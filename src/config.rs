// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup; invalid values abort startup instead of falling back to
//! defaults.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding `presence.redb` | `./data` |
//! | `RPC_URL` | EVM node JSON-RPC endpoint | `http://127.0.0.1:8545` |
//! | `CONTRACT_ARTIFACT` | Deployed contract JSON (`{address, abi}`) | `blockchain/deployed/ProofOfPresence.json` |
//! | `LEDGER_TIMEOUT_SECS` | Per-call node timeout, 1 to 60 | `10` |
//! | `TLS_CERT_PATH` | PEM certificate chain (enables HTTPS) | unset |
//! | `TLS_KEY_PATH` | PEM private key (enables HTTPS) | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage::DATABASE_FILE;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const CONTRACT_ARTIFACT_ENV: &str = "CONTRACT_ARTIFACT";
pub const LEDGER_TIMEOUT_ENV: &str = "LEDGER_TIMEOUT_SECS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_CONTRACT_ARTIFACT: &str = "blockchain/deployed/ProofOfPresence.json";
pub const DEFAULT_LEDGER_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const LEDGER_TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// PEM file pair for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub rpc_url: url::Url,
    pub contract_artifact: PathBuf,
    pub ledger_timeout: Duration,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let raw_url = get(RPC_URL_ENV).unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        let rpc_url = url::Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidRpcUrl(e.to_string()))?;
        if !matches!(rpc_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidRpcUrl(format!(
                "unsupported scheme `{}`",
                rpc_url.scheme()
            )));
        }

        let timeout_secs = match get(LEDGER_TIMEOUT_ENV) {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| LEDGER_TIMEOUT_RANGE.contains(secs))
                .ok_or(ConfigError::InvalidLedgerTimeout(raw))?,
            None => DEFAULT_LEDGER_TIMEOUT_SECS,
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        let log_format = match get(LOG_FORMAT_ENV).map(|v| v.to_ascii_lowercase()) {
            None => LogFormat::Pretty,
            Some(v) if v == "pretty" => LogFormat::Pretty,
            Some(v) if v == "json" => LogFormat::Json,
            Some(other) => return Err(ConfigError::InvalidLogFormat(other)),
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            data_dir: PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.into())),
            rpc_url,
            contract_artifact: PathBuf::from(
                get(CONTRACT_ARTIFACT_ENV).unwrap_or_else(|| DEFAULT_CONTRACT_ARTIFACT.into()),
            ),
            ledger_timeout: Duration::from_secs(timeout_secs),
            tls,
            log_format,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(format!("{}:{}", self.host, self.port)))
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT: {0}")]
    InvalidPort(String),

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid RPC_URL: {0}")]
    InvalidRpcUrl(String),

    #[error("LEDGER_TIMEOUT_SECS must be an integer between 1 and 60, got {0}")]
    InvalidLedgerTimeout(String),

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,

    #[error("LOG_FORMAT must be `json` or `pretty`, got {0}")]
    InvalidLogFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rpc_url.as_str(), "http://127.0.0.1:8545/");
        assert_eq!(config.ledger_timeout, Duration::from_secs(10));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.tls.is_none());
        assert_eq!(config.database_path(), PathBuf::from("./data/presence.redb"));
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
    }

    #[test]
    fn overrides_are_read() {
        let config = load(&[
            ("PORT", "9000"),
            ("RPC_URL", "https://rpc.example.org"),
            ("LEDGER_TIMEOUT_SECS", "60"),
            ("LOG_FORMAT", "JSON"),
            ("TLS_CERT_PATH", "/certs/server.pem"),
            ("TLS_KEY_PATH", "/certs/server.key"),
            ("HOST", "127.0.0.1"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.ledger_timeout, Duration::from_secs(60));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.tls.as_ref().unwrap().cert, PathBuf::from("/certs/server.pem"));
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn empty_values_are_unset() {
        let config = load(&[("PORT", "  "), ("LOG_FORMAT", "")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn invalid_values_fail() {
        assert!(matches!(load(&[("PORT", "eighty")]), Err(ConfigError::InvalidPort(_))));
        assert!(matches!(
            load(&[("LEDGER_TIMEOUT_SECS", "0")]),
            Err(ConfigError::InvalidLedgerTimeout(_))
        ));
        assert!(matches!(
            load(&[("LEDGER_TIMEOUT_SECS", "61")]),
            Err(ConfigError::InvalidLedgerTimeout(_))
        ));
        assert!(matches!(
            load(&[("RPC_URL", "ws://node:8546")]),
            Err(ConfigError::InvalidRpcUrl(_))
        ));
        assert!(matches!(
            load(&[("TLS_CERT_PATH", "/certs/server.pem")]),
            Err(ConfigError::IncompleteTls)
        ));
        assert!(matches!(
            load(&[("LOG_FORMAT", "xml")]),
            Err(ConfigError::InvalidLogFormat(_))
        ));
        let bad_host = load(&[("HOST", "not a host")]).unwrap();
        assert!(bad_host.bind_addr().is_err());
    }
}
