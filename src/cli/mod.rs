// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # x4cli
//!
//! Operator commands for the X4C contracts. Every command resolves its
//! arguments through the [`X4cClient`] registry, so contracts and signers
//! may be named by alias or by address.
//!
//! ```text
//! x4cli info [--json]
//! x4cli fa2 info|originate|add-token|mint|transfer|retire ...
//! x4cli custodian info|originate|internal-mint|internal-transfer|add-operator|remove-operator|retire ...
//! ```

pub mod custodian;
pub mod fa2;
pub mod output;

use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::ConfigError;
use crate::indexer::IndexerError;
use crate::tezos::Micheline;
use crate::x4c::{ContractHandle, CredentialError, X4cClient, X4cError};

use output::Output;

#[derive(Parser, Debug)]
#[command(name = "x4cli", version, about = "Operate X4C FA2 and Custodian contracts on Tezos")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show known keys, remote-signer accounts and contracts.
    Info {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// FA2 token contract commands.
    #[command(subcommand)]
    Fa2(fa2::Fa2Command),

    /// Custodian contract commands.
    #[command(subcommand)]
    Custodian(custodian::CustodianCommand),
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    X4c(#[from] X4cError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read contract code {path}: {source}")]
    Code {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Contract code is not Micheline JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<IndexerError> for CliError {
    fn from(err: IndexerError) -> Self {
        CliError::X4c(X4cError::Indexer(err))
    }
}

/// Run one parsed command against a loaded client.
pub async fn run(command: Command, client: &X4cClient, out: &dyn Output) -> Result<(), CliError> {
    match command {
        Command::Info { json } => info(client, json, out).await,
        Command::Fa2(command) => fa2::run(command, client, out).await,
        Command::Custodian(command) => custodian::run(command, client, out).await,
    }
}

/// Print a failed command's error and map the outcome to an exit code.
pub fn report(result: Result<(), CliError>, out: &dyn Output) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            out.error(&format!("Error: {e}"));
            ExitCode::FAILURE
        }
    }
}

#[derive(Serialize)]
struct Account {
    alias: String,
    address: String,
    remote: bool,
}

#[derive(Serialize)]
struct ClientInfo {
    accounts: Vec<Account>,
    contracts: Vec<ContractHandle>,
    default_fa2: Option<String>,
}

async fn info(client: &X4cClient, json: bool, out: &dyn Output) -> Result<(), CliError> {
    let accounts: Vec<Account> = client
        .keys()
        .into_iter()
        .map(|(alias, address)| Account {
            alias,
            address,
            remote: false,
        })
        .chain(client.addresses().into_iter().map(|(alias, address)| Account {
            alias,
            address,
            remote: true,
        }))
        .collect();
    let contracts: Vec<ContractHandle> = client
        .contracts()
        .await
        .iter()
        .map(|h| h.as_ref().clone())
        .collect();
    let default_fa2 = client.default_fa2().await.map(|h| h.alias.clone());

    if json {
        return out.print_json(&serde_json::to_value(ClientInfo {
            accounts,
            contracts,
            default_fa2,
        })?);
    }

    out.header("Accounts");
    for account in &accounts {
        let suffix = if account.remote { " (remote signer)" } else { "" };
        out.print(&format!("{}: {}{suffix}", account.alias, account.address));
    }
    out.header("Contracts");
    for contract in &contracts {
        let marker = if default_fa2.as_deref() == Some(contract.alias.as_str()) {
            " (default)"
        } else {
            ""
        };
        out.print(&format!(
            "{}: {} [{}]{marker}",
            contract.alias, contract.address, contract.kind
        ));
    }
    Ok(())
}

/// Read Micheline JSON contract code from `path`.
fn read_code(path: &Path) -> Result<Micheline, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Code {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

/// Refuse an alias that already names a contract, before anything is sent.
async fn ensure_alias_free(client: &X4cClient, alias: &str) -> Result<(), CliError> {
    if client.resolve_contract(Some(alias)).await.is_some() {
        return Err(X4cError::from(CredentialError::AliasExists(alias.to_string())).into());
    }
    Ok(())
}
