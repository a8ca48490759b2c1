// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values shared
//! by the REST server and the CLI. Configuration is loaded from the
//! environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `TEZOS_RPC_HOST` | Tezos node RPC URL | client `config` endpoint, else `https://rpc.ghostnet.teztnets.com` |
//! | `TEZOS_INDEX_HOST` | Indexer API base URL | inferred from the RPC network |
//! | `TEZOS_INDEX_KIND` | Indexer backend (`tzkt` or `tzstats`) | `tzkt` |
//! | `TEZOS_INDEX_WEB` | Indexer web UI for deep links | inferred from the RPC network |
//! | `SIGNATORY_HOST` | Remote signer base URL | unset |
//! | `TEZOS_CLIENT_DIR` | tezos-client credential directory | `$HOME/.tezos-client` |
//! | `CUSTODIAN_OPERATOR` | Signer used by the retire routes | unset |
//! | `TEZOS_TRANSACTION_LIMITS` | Contract call `fee,gas_limit,storage_limit` | `50000,200000,1000` |
//! | `TEZOS_ORIGINATION_LIMITS` | Origination `fee,gas_limit,storage_limit` | `200000,200000,60000` |
//! | `TEZOS_CONFIRMATION_BLOCKS` | Blocks scanned for an injected operation | `120` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` (server), `warn` (CLI) |

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::indexer::{self, IndexerBackend};
use crate::tezos::node::DEFAULT_MAX_WAIT_BLOCKS;
use crate::tezos::{Limits, OperationLimits, RpcNode};
use crate::x4c::credentials::{default_client_dir, CredentialStore};
use crate::x4c::{ClientSettings, X4cClient, X4cError};

/// Environment variable name for the Tezos node RPC URL.
pub const TEZOS_RPC_HOST_ENV: &str = "TEZOS_RPC_HOST";

/// Environment variable name for the indexer API base URL.
pub const TEZOS_INDEX_HOST_ENV: &str = "TEZOS_INDEX_HOST";

/// Environment variable name for the indexer backend.
///
/// The backend is never guessed from the URL.
pub const TEZOS_INDEX_KIND_ENV: &str = "TEZOS_INDEX_KIND";

/// Environment variable name for the indexer web UI base URL.
pub const TEZOS_INDEX_WEB_ENV: &str = "TEZOS_INDEX_WEB";

/// Environment variable name for the Signatory remote signer.
pub const SIGNATORY_HOST_ENV: &str = "SIGNATORY_HOST";

/// Environment variable name for the tezos-client directory.
pub const TEZOS_CLIENT_DIR_ENV: &str = "TEZOS_CLIENT_DIR";

/// Environment variable name for the signer alias used by `POST /retire`.
pub const CUSTODIAN_OPERATOR_ENV: &str = "CUSTODIAN_OPERATOR";

/// Environment variable names for the fee (mutez), gas and storage limits of
/// contract calls and originations, written `fee,gas_limit,storage_limit`.
pub const TEZOS_TRANSACTION_LIMITS_ENV: &str = "TEZOS_TRANSACTION_LIMITS";
pub const TEZOS_ORIGINATION_LIMITS_ENV: &str = "TEZOS_ORIGINATION_LIMITS";

/// Environment variable name for the number of blocks to wait for inclusion.
pub const TEZOS_CONFIRMATION_BLOCKS_ENV: &str = "TEZOS_CONFIRMATION_BLOCKS";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_RPC_URL: &str = "https://rpc.ghostnet.teztnets.com";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Default `RUST_LOG` filter of the REST server.
pub const SERVER_LOG_FILTER: &str = "info,tower_http=debug";

/// Default `RUST_LOG` filter of the CLI.
pub const CLI_LOG_FILTER: &str = "warn";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rpc_url: String,
    pub indexer_backend: IndexerBackend,
    pub indexer_url: String,
    pub indexer_web_url: String,
    pub signatory_url: Option<String>,
    pub client_dir: PathBuf,
    pub custodian_operator: Option<String>,
    pub operation_limits: OperationLimits,
    pub confirmation_blocks: u64,
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through `lookup`, which returns the value of one
    /// variable. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let client_dir = var(TEZOS_CLIENT_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_client_dir);

        let rpc_url = var(TEZOS_RPC_HOST_ENV)
            .or_else(|| CredentialStore::new(&client_dir).endpoint())
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        check_url(TEZOS_RPC_HOST_ENV, &rpc_url)?;

        let indexer_backend = match var(TEZOS_INDEX_KIND_ENV) {
            Some(kind) => kind.parse().map_err(|reason| ConfigError::Invalid {
                name: TEZOS_INDEX_KIND_ENV,
                reason,
            })?,
            None => IndexerBackend::default(),
        };

        let (default_api, default_web) = default_indexer_urls(indexer_backend, &rpc_url);
        let indexer_url = var(TEZOS_INDEX_HOST_ENV).unwrap_or(default_api);
        check_url(TEZOS_INDEX_HOST_ENV, &indexer_url)?;
        let signatory_url = var(SIGNATORY_HOST_ENV);
        if let Some(signatory_url) = &signatory_url {
            check_url(SIGNATORY_HOST_ENV, signatory_url)?;
        }
        let indexer_web_url = var(TEZOS_INDEX_WEB_ENV)
            .unwrap_or(default_web)
            .trim_end_matches('/')
            .to_string();

        let defaults = OperationLimits::default();
        let operation_limits = OperationLimits {
            transaction: match var(TEZOS_TRANSACTION_LIMITS_ENV) {
                Some(value) => parse_limits(TEZOS_TRANSACTION_LIMITS_ENV, &value)?,
                None => defaults.transaction,
            },
            origination: match var(TEZOS_ORIGINATION_LIMITS_ENV) {
                Some(value) => parse_limits(TEZOS_ORIGINATION_LIMITS_ENV, &value)?,
                None => defaults.origination,
            },
            ..defaults
        };
        let confirmation_blocks = match var(TEZOS_CONFIRMATION_BLOCKS_ENV) {
            Some(blocks) => blocks.parse().map_err(|e| ConfigError::Invalid {
                name: TEZOS_CONFIRMATION_BLOCKS_ENV,
                reason: format!("{e}"),
            })?,
            None => DEFAULT_MAX_WAIT_BLOCKS,
        };

        let port = match var(PORT_ENV) {
            Some(port) => port.parse().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            rpc_url,
            indexer_backend,
            indexer_url,
            indexer_web_url,
            signatory_url,
            client_dir,
            custodian_operator: var(CUSTODIAN_OPERATOR_ENV),
            operation_limits,
            confirmation_blocks,
            host: var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        })
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            indexer_web_url: self.indexer_web_url.clone(),
            signatory_url: self.signatory_url.clone(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connect the node and indexer clients and load the credential files.
    pub async fn load_client(&self) -> Result<X4cClient, X4cError> {
        let node = RpcNode::new(self.rpc_url.as_str())?
            .with_limits(self.operation_limits)
            .with_max_wait_blocks(self.confirmation_blocks);
        let node = Arc::new(node);
        let indexer = indexer::connect(self.indexer_backend, &self.indexer_url)?;
        Ok(X4cClient::load(
            node,
            indexer,
            self.client_settings(),
            CredentialStore::new(&self.client_dir),
        )
        .await)
    }
}

fn check_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    value
        .parse::<url::Url>()
        .map(|_| ())
        .map_err(|e: url::ParseError| ConfigError::Invalid {
            name,
            reason: format!("`{value}` is not a URL: {e}"),
        })
}

/// Parse `fee,gas_limit,storage_limit`.
fn parse_limits(name: &'static str, value: &str) -> Result<Limits, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid { name, reason };
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| invalid(format!("`{value}`: {e}")))?;
    match parts[..] {
        [fee, gas_limit, storage_limit] => Ok(Limits {
            fee,
            gas_limit,
            storage_limit,
        }),
        _ => Err(invalid(format!(
            "`{value}` is not `fee,gas_limit,storage_limit`"
        ))),
    }
}

/// Indexer API and web URLs for the network named in the RPC URL.
fn default_indexer_urls(backend: IndexerBackend, rpc_url: &str) -> (String, String) {
    let network = if rpc_url.contains("ghostnet") {
        "ghostnet"
    } else if rpc_url.contains("kathmandunet") {
        "kathmandunet"
    } else {
        "mainnet"
    };

    match (backend, network) {
        (IndexerBackend::Tzkt, network) => (
            format!("https://api.{network}.tzkt.io"),
            format!("https://{network}.tzkt.io"),
        ),
        (IndexerBackend::Tzstats, "mainnet") => (
            "https://api.tzstats.com".to_string(),
            "https://tzstats.com".to_string(),
        ),
        (IndexerBackend::Tzstats, "ghostnet") => (
            "https://api.ghost.tzstats.com".to_string(),
            "https://ghost.tzstats.com".to_string(),
        ),
        (IndexerBackend::Tzstats, _) => (
            "https://api.kathmandu.tzstats.com".to_string(),
            "https://kathmandu.tzstats.com".to_string(),
        ),
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_filter`; `LOG_FORMAT=json` selects JSON lines.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).try_init()
    };
    if let Err(e) = result {
        eprintln!("Tracing already initialised: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_follow_the_rpc_network() {
        let dir = tempdir().unwrap();
        let dir = dir.path().to_str().unwrap();

        let s = settings(&[(TEZOS_CLIENT_DIR_ENV, dir)]).unwrap();
        assert_eq!(s.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(s.indexer_backend, IndexerBackend::Tzkt);
        assert_eq!(s.indexer_url, "https://api.ghostnet.tzkt.io");
        assert_eq!(s.indexer_web_url, "https://ghostnet.tzkt.io");
        assert_eq!(s.bind_address(), "0.0.0.0:8080");
        assert_eq!(s.custodian_operator, None);
        assert_eq!(s.operation_limits, OperationLimits::default());
        assert_eq!(s.confirmation_blocks, DEFAULT_MAX_WAIT_BLOCKS);

        let s = settings(&[
            (TEZOS_CLIENT_DIR_ENV, dir),
            (TEZOS_RPC_HOST_ENV, "https://mainnet.api.tez.ie"),
        ])
        .unwrap();
        assert_eq!(s.indexer_url, "https://api.mainnet.tzkt.io");

        let s = settings(&[
            (TEZOS_CLIENT_DIR_ENV, dir),
            (TEZOS_RPC_HOST_ENV, "https://rpc.kathmandunet.teztnets.xyz"),
            (TEZOS_INDEX_KIND_ENV, "tzstats"),
        ])
        .unwrap();
        assert_eq!(s.indexer_backend, IndexerBackend::Tzstats);
        assert_eq!(s.indexer_web_url, "https://kathmandu.tzstats.com");
    }

    #[test]
    fn rpc_url_falls_back_to_client_config() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("config"),
            r#"{"endpoint": "https://rpc.ghostnet.example"}"#,
        )
        .unwrap();

        let s = settings(&[(TEZOS_CLIENT_DIR_ENV, dir.path().to_str().unwrap())]).unwrap();
        assert_eq!(s.rpc_url, "https://rpc.ghostnet.example");
        assert_eq!(s.client_dir, dir.path());
    }

    #[test]
    fn explicit_values_win() {
        let dir = tempdir().unwrap();
        let s = settings(&[
            (TEZOS_CLIENT_DIR_ENV, dir.path().to_str().unwrap()),
            (TEZOS_INDEX_HOST_ENV, "http://indexer.local"),
            (TEZOS_INDEX_WEB_ENV, "http://web.local/"),
            (SIGNATORY_HOST_ENV, "http://signatory:6732"),
            (CUSTODIAN_OPERATOR_ENV, "operator"),
            (PORT_ENV, "9000"),
        ])
        .unwrap();
        assert_eq!(s.indexer_url, "http://indexer.local");
        assert_eq!(s.indexer_web_url, "http://web.local");
        assert_eq!(s.signatory_url.as_deref(), Some("http://signatory:6732"));
        assert_eq!(s.custodian_operator.as_deref(), Some("operator"));
        assert_eq!(s.port, 9000);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            settings(&[(TEZOS_INDEX_KIND_ENV, "tzscan")]),
            Err(ConfigError::Invalid { name: TEZOS_INDEX_KIND_ENV, .. })
        ));
        assert!(matches!(
            settings(&[(PORT_ENV, "http")]),
            Err(ConfigError::Invalid { name: PORT_ENV, .. })
        ));
        assert!(matches!(
            settings(&[(TEZOS_INDEX_HOST_ENV, "api.tzkt.io")]),
            Err(ConfigError::Invalid { name: TEZOS_INDEX_HOST_ENV, .. })
        ));
        assert!(matches!(
            settings(&[(TEZOS_TRANSACTION_LIMITS_ENV, "1000,2000")]),
            Err(ConfigError::Invalid { name: TEZOS_TRANSACTION_LIMITS_ENV, .. })
        ));
        assert!(matches!(
            settings(&[(TEZOS_ORIGINATION_LIMITS_ENV, "1,two,3")]),
            Err(ConfigError::Invalid { name: TEZOS_ORIGINATION_LIMITS_ENV, .. })
        ));
        assert!(matches!(
            settings(&[(TEZOS_CONFIRMATION_BLOCKS_ENV, "-1")]),
            Err(ConfigError::Invalid { name: TEZOS_CONFIRMATION_BLOCKS_ENV, .. })
        ));
    }

    #[test]
    fn operation_limits_are_configurable() {
        let dir = tempdir().unwrap();
        let s = settings(&[
            (TEZOS_CLIENT_DIR_ENV, dir.path().to_str().unwrap()),
            (TEZOS_TRANSACTION_LIMITS_ENV, "80000, 400000, 2000"),
            (TEZOS_CONFIRMATION_BLOCKS_ENV, "10"),
        ])
        .unwrap();
        assert_eq!(
            s.operation_limits.transaction,
            Limits {
                fee: 80_000,
                gas_limit: 400_000,
                storage_limit: 2_000,
            }
        );
        assert_eq!(s.operation_limits.origination, OperationLimits::default().origination);
        assert_eq!(s.operation_limits.reveal, OperationLimits::default().reveal);
        assert_eq!(s.confirmation_blocks, 10);
    }
}
