// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Subcommand;
use serde::Serialize;

use crate::x4c::custodian::SELF_IDENTITY;
use crate::x4c::storage::{CustodianLedgerEntry, ExternalLedgerEntry, Operator};
use crate::x4c::{ContractEvent, X4cClient};

use super::output::Output;
use super::{ensure_alias_free, read_code, CliError};

/// Off-chain identities (`--kyc`, `--from`, `--to`, owners) default to `self`.
#[derive(Subcommand, Debug)]
pub enum CustodianCommand {
    /// Dump storage, ledgers and events of a Custodian contract.
    Info {
        #[arg(long)]
        json: bool,
        contract: String,
    },

    /// Originate a new Custodian contract and save it under ALIAS.
    Originate {
        alias: String,
        /// Contract code as Micheline JSON.
        code: PathBuf,
        signer: String,
        /// Custodian account; defaults to the signer.
        custodian: Option<String>,
    },

    /// Credit tokens the custodian received on TOKEN_ADDRESS.
    InternalMint {
        contract: String,
        signer: String,
        token_address: String,
        token_id: u64,
    },

    InternalTransfer {
        contract: String,
        signer: String,
        token_address: String,
        token_id: u64,
        amount: u64,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },

    AddOperator {
        contract: String,
        signer: String,
        operator: String,
        token_id: u64,
        owner: Option<String>,
    },

    RemoveOperator {
        contract: String,
        signer: String,
        operator: String,
        token_id: u64,
        owner: Option<String>,
    },

    Retire {
        contract: String,
        signer: String,
        token_address: String,
        token_id: u64,
        amount: u64,
        reason: String,
        #[arg(long)]
        kyc: Option<String>,
    },
}

#[derive(Serialize)]
struct CustodianSnapshot {
    alias: String,
    address: String,
    custodian: String,
    ledger: Vec<CustodianLedgerEntry>,
    external_ledger: Vec<ExternalLedgerEntry>,
    operators: Vec<Operator>,
    metadata: BTreeMap<String, String>,
    events: Vec<ContractEvent>,
}

pub async fn run(
    command: CustodianCommand,
    client: &X4cClient,
    out: &dyn Output,
) -> Result<(), CliError> {
    let web_url = client.settings().indexer_web_url.as_str();

    let result = match command {
        CustodianCommand::Info { json, contract } => {
            return info(client, &contract, json, out).await;
        }

        CustodianCommand::Originate {
            alias,
            code,
            signer,
            custodian,
        } => {
            ensure_alias_free(client, &alias).await?;
            let code = read_code(&code)?;
            let originated = client
                .originate_custodian(code, &signer, custodian.as_deref())
                .await?;
            out.operation(web_url, &originated.operation_hash);
            client.save_alias(&alias, &originated.contract.address).await?;
            out.print(&format!("Saved {alias}: {}", originated.contract.address));
            return Ok(());
        }

        CustodianCommand::InternalMint {
            contract,
            signer,
            token_address,
            token_id,
        } => {
            let custodian = client.custodian_contract(Some(&contract), Some(&signer)).await?;
            let token_address = client.resolve_hash(&token_address).await;
            custodian.internal_mint(&token_address, token_id).await?
        }

        CustodianCommand::InternalTransfer {
            contract,
            signer,
            token_address,
            token_id,
            amount,
            from,
            to,
        } => {
            let custodian = client.custodian_contract(Some(&contract), Some(&signer)).await?;
            let token_address = client.resolve_hash(&token_address).await;
            custodian
                .internal_transfer(&token_address, token_id, amount, from.as_deref(), to.as_deref())
                .await?
        }

        CustodianCommand::AddOperator {
            contract,
            signer,
            operator,
            token_id,
            owner,
        } => {
            let custodian = client.custodian_contract(Some(&contract), Some(&signer)).await?;
            let operator = client.resolve_hash(&operator).await;
            custodian
                .add_operator(&operator, token_id, owner.as_deref().unwrap_or(SELF_IDENTITY))
                .await?
        }

        CustodianCommand::RemoveOperator {
            contract,
            signer,
            operator,
            token_id,
            owner,
        } => {
            let custodian = client.custodian_contract(Some(&contract), Some(&signer)).await?;
            let operator = client.resolve_hash(&operator).await;
            custodian
                .remove_operator(&operator, token_id, owner.as_deref().unwrap_or(SELF_IDENTITY))
                .await?
        }

        CustodianCommand::Retire {
            contract,
            signer,
            token_address,
            token_id,
            amount,
            reason,
            kyc,
        } => {
            let custodian = client.custodian_contract(Some(&contract), Some(&signer)).await?;
            let token_address = client.resolve_hash(&token_address).await;
            custodian
                .retire(&token_address, token_id, amount, kyc.as_deref(), &reason)
                .await?
        }
    };

    out.operation(web_url, &result.operation_hash);
    Ok(())
}

async fn info(client: &X4cClient, contract: &str, json: bool, out: &dyn Output) -> Result<(), CliError> {
    let custodian = client.custodian_contract(Some(contract), None).await?;
    let storage = custodian.storage();
    let snapshot = CustodianSnapshot {
        alias: custodian.handle().alias.clone(),
        address: custodian.address().to_string(),
        custodian: storage.custodian_address().await?,
        ledger: storage.ledger().await?,
        external_ledger: storage.external_ledger().await?,
        operators: storage.operators().await?,
        metadata: storage.metadata().await?,
        events: custodian.events(None).await?,
    };

    if json {
        return out.print_json(&serde_json::to_value(&snapshot)?);
    }

    out.header(&format!("Custodian {}", snapshot.alias));
    out.print(&format!("Address: {}", snapshot.address));
    out.print(&format!("Custodian: {}", snapshot.custodian));

    out.header("Ledger");
    for entry in &snapshot.ledger {
        out.print(&format!(
            "{} {} token {}: {}",
            entry.kyc, entry.minter, entry.token_id, entry.amount
        ));
    }

    out.header("External ledger");
    for entry in &snapshot.external_ledger {
        out.print(&format!(
            "{} token {}: {}",
            entry.token.token_address, entry.token.token_id, entry.amount
        ));
    }

    out.header("Operators");
    for op in &snapshot.operators {
        out.print(&format!(
            "{} for {} token {}",
            op.operator, op.owner, op.token_id
        ));
    }

    if !snapshot.metadata.is_empty() {
        out.header("Metadata");
        for (key, value) in &snapshot.metadata {
            out.print(&format!("{key}: {value}"));
        }
    }

    out.header("Events");
    for event in &snapshot.events {
        out.print(&format!(
            "{} {} {}",
            event.timestamp.to_rfc3339(),
            event.tag,
            serde_json::to_string(&event.payload)?
        ));
    }
    Ok(())
}
