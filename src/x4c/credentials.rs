// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! tezos-client credential files.
//!
//! Every source is a JSON list of `{name, value}` pairs inside the client
//! directory (`~/.tezos-client` by default):
//!
//! | File | Value |
//! |------|-------|
//! | `contracts` | `KT1…` address |
//! | `secret_keys` | `edsk…`, optionally prefixed `unencrypted:` |
//! | `public_key_hashs` | `tz…` address (keys held by the remote signer) |
//!
//! A missing or malformed source is logged and read as empty.

use std::{fs, io, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

pub const CONTRACTS_FILE: &str = "contracts";
pub const SECRET_KEYS_FILE: &str = "secret_keys";
pub const PUBLIC_KEY_HASHS_FILE: &str = "public_key_hashs";
pub const CONFIG_FILE: &str = "config";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed credential file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Alias `{0}` is already in use")]
    AliasExists(String),
}

#[derive(Debug, Deserialize)]
struct ClientConfig {
    endpoint: Option<String>,
}

/// Read/append access to one tezos-client directory.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn contracts(&self) -> Vec<NamedValue> {
        self.load_source(CONTRACTS_FILE)
    }

    pub fn secret_keys(&self) -> Vec<NamedValue> {
        self.load_source(SECRET_KEYS_FILE)
    }

    pub fn public_key_hashes(&self) -> Vec<NamedValue> {
        self.load_source(PUBLIC_KEY_HASHS_FILE)
    }

    /// Node endpoint from the client `config` file, if any.
    pub fn endpoint(&self) -> Option<String> {
        let path = self.dir.join(CONFIG_FILE);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<ClientConfig>(&raw) {
            Ok(config) => config.endpoint.filter(|e| !e.trim().is_empty()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring malformed client config");
                None
            }
        }
    }

    /// Record a contract alias in the `contracts` file.
    pub fn append_contract(&self, alias: &str, address: &str) -> Result<(), CredentialError> {
        let path = self.dir.join(CONTRACTS_FILE);
        let mut entries = match self.read_source(CONTRACTS_FILE) {
            Ok(entries) => entries,
            Err(CredentialError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        if entries.iter().any(|entry| entry.name == alias) {
            return Err(CredentialError::AliasExists(alias.to_string()));
        }
        entries.push(NamedValue {
            name: alias.to_string(),
            value: address.to_string(),
        });

        let body = serde_json::to_string_pretty(&entries).map_err(|source| CredentialError::Json {
            path: path.clone(),
            source,
        })?;
        fs::create_dir_all(&self.dir).map_err(|source| CredentialError::Io {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, body).map_err(|source| CredentialError::Io { path, source })
    }

    fn read_source(&self, file: &str) -> Result<Vec<NamedValue>, CredentialError> {
        let path = self.dir.join(file);
        let raw = fs::read_to_string(&path).map_err(|source| CredentialError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| CredentialError::Json { path, source })
    }

    fn load_source(&self, file: &str) -> Vec<NamedValue> {
        match self.read_source(file) {
            Ok(entries) => entries,
            Err(CredentialError::Io { path, source }) if source.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Credential source missing, skipping");
                Vec::new()
            }
            Err(e) => {
                error!(error = %e, "Credential source unreadable, skipping");
                Vec::new()
            }
        }
    }
}

/// `$HOME/.tezos-client`, or `.tezos-client` in the working directory when
/// `HOME` is unset.
pub fn default_client_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".tezos-client")
}
