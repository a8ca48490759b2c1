// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Subcommand;
use serde::Serialize;

use crate::x4c::storage::{Fa2LedgerEntry, Operator, TokenMetadata};
use crate::x4c::{ContractEvent, TokenInfo, X4cClient};

use super::output::Output;
use super::{ensure_alias_free, read_code, CliError};

#[derive(Subcommand, Debug)]
pub enum Fa2Command {
    /// Dump storage, ledger and events of an FA2 contract.
    Info {
        #[arg(long)]
        json: bool,
        /// Contract alias or address; defaults to the only known FA2 contract.
        contract: Option<String>,
    },

    /// Originate a new FA2 contract and save it under ALIAS.
    Originate {
        alias: String,
        /// Contract code as Micheline JSON.
        code: PathBuf,
        signer: String,
        /// Oracle account; defaults to the signer.
        oracle: Option<String>,
    },

    /// Register a new token id with its title and url.
    AddToken {
        signer: String,
        token_id: u64,
        title: String,
        url: String,
        #[arg(long)]
        contract: Option<String>,
    },

    Mint {
        signer: String,
        owner: String,
        token_id: u64,
        amount: u64,
        #[arg(long)]
        contract: Option<String>,
    },

    /// Transfer from the signer's account.
    Transfer {
        signer: String,
        receiver: String,
        token_id: u64,
        amount: u64,
        #[arg(long)]
        contract: Option<String>,
    },

    /// Retire tokens held by the signer.
    Retire {
        signer: String,
        token_id: u64,
        amount: u64,
        reason: String,
        #[arg(long)]
        contract: Option<String>,
    },
}

#[derive(Serialize)]
struct Fa2Snapshot {
    alias: String,
    address: String,
    oracle: String,
    ledger: Vec<Fa2LedgerEntry>,
    operators: Vec<Operator>,
    token_metadata: Vec<TokenMetadata>,
    metadata: BTreeMap<String, String>,
    events: Vec<ContractEvent>,
}

pub async fn run(command: Fa2Command, client: &X4cClient, out: &dyn Output) -> Result<(), CliError> {
    let web_url = client.settings().indexer_web_url.as_str();

    match command {
        Fa2Command::Info { json, contract } => info(client, contract.as_deref(), json, out).await,

        Fa2Command::Originate {
            alias,
            code,
            signer,
            oracle,
        } => {
            ensure_alias_free(client, &alias).await?;
            let code = read_code(&code)?;
            let originated = client.originate_fa2(code, &signer, oracle.as_deref()).await?;
            out.operation(web_url, &originated.operation_hash);
            client.save_alias(&alias, &originated.contract.address).await?;
            out.print(&format!("Saved {alias}: {}", originated.contract.address));
            Ok(())
        }

        Fa2Command::AddToken {
            signer,
            token_id,
            title,
            url,
            contract,
        } => {
            let fa2 = client.fa2_contract(contract.as_deref(), Some(&signer)).await?;
            let result = fa2.add_token_id(token_id, &TokenInfo { title, url }).await?;
            out.operation(web_url, &result.operation_hash);
            Ok(())
        }

        Fa2Command::Mint {
            signer,
            owner,
            token_id,
            amount,
            contract,
        } => {
            let fa2 = client.fa2_contract(contract.as_deref(), Some(&signer)).await?;
            let owner = client.resolve_hash(&owner).await;
            let result = fa2.mint(&owner, token_id, amount).await?;
            out.operation(web_url, &result.operation_hash);
            Ok(())
        }

        Fa2Command::Transfer {
            signer,
            receiver,
            token_id,
            amount,
            contract,
        } => {
            let fa2 = client.fa2_contract(contract.as_deref(), Some(&signer)).await?;
            let receiver = client.resolve_hash(&receiver).await;
            let result = fa2.transfer(&receiver, token_id, amount).await?;
            out.operation(web_url, &result.operation_hash);
            Ok(())
        }

        Fa2Command::Retire {
            signer,
            token_id,
            amount,
            reason,
            contract,
        } => {
            let fa2 = client.fa2_contract(contract.as_deref(), Some(&signer)).await?;
            let result = fa2.retire(token_id, amount, &reason).await?;
            out.operation(web_url, &result.operation_hash);
            Ok(())
        }
    }
}

async fn info(
    client: &X4cClient,
    contract: Option<&str>,
    json: bool,
    out: &dyn Output,
) -> Result<(), CliError> {
    let fa2 = client.fa2_contract(contract, None).await?;
    let storage = fa2.storage();
    let snapshot = Fa2Snapshot {
        alias: fa2.handle().alias.clone(),
        address: fa2.address().to_string(),
        oracle: storage.oracle_address().await?,
        ledger: storage.ledger().await?,
        operators: storage.operators().await?,
        token_metadata: storage.token_metadata().await?,
        metadata: storage.metadata().await?,
        events: fa2.events(None).await?,
    };

    if json {
        return out.print_json(&serde_json::to_value(&snapshot)?);
    }

    out.header(&format!("FA2 {}", snapshot.alias));
    out.print(&format!("Address: {}", snapshot.address));
    out.print(&format!("Oracle: {}", snapshot.oracle));

    out.header("Ledger");
    for entry in &snapshot.ledger {
        out.print(&format!(
            "{} token {}: {}",
            entry.owner, entry.token_id, entry.amount
        ));
    }

    out.header("Operators");
    for op in &snapshot.operators {
        out.print(&format!(
            "{} for {} token {}",
            op.operator, op.owner, op.token_id
        ));
    }

    out.header("Tokens");
    for token in &snapshot.token_metadata {
        let info: Vec<String> = token
            .token_info
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        out.print(&format!("{}: {}", token.token_id, info.join(", ")));
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::output::testing::MockOutput;
    use crate::cli::testing::{client, fa2_address, node, ALICE_PKH, WEB_URL};
    use crate::tezos::encoding::{b58check_encode, prefix};
    use crate::tezos::testing::MockNode;
    use crate::x4c::credentials::CONTRACTS_FILE;
    use crate::x4c::{ContractKind, X4cError};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    const NO_INDEXER: &str = "http://127.0.0.1:9";

    #[tokio::test]
    async fn mint_resolves_owner_and_links_operation() {
        let dir = tempdir().unwrap();
        let node = Arc::new(node());
        let client = client(dir.path(), node.clone(), NO_INDEXER).await;
        let out = MockOutput::default();

        let command = Fa2Command::Mint {
            signer: "alice".to_string(),
            owner: "alice".to_string(),
            token_id: 2,
            amount: 50,
            contract: None,
        };
        run(command, &client, &out).await.unwrap();

        assert_eq!(
            out.messages(),
            vec![format!("Operation injected: {WEB_URL}/ooMockOperation1")]
        );
        let calls = node.calls();
        assert_eq!(calls[0].destination, fa2_address());
        assert_eq!(calls[0].parameters.entrypoint, "mint");
        let value = serde_json::to_value(&calls[0].parameters.value).unwrap();
        assert_eq!(value[0]["args"][0]["args"][0], json!({"string": ALICE_PKH}));
    }

    #[tokio::test]
    async fn unknown_signer_is_reported_before_submitting() {
        let dir = tempdir().unwrap();
        let node = Arc::new(node());
        let client = client(dir.path(), node.clone(), NO_INDEXER).await;

        let command = Fa2Command::Retire {
            signer: "mallory".to_string(),
            token_id: 1,
            amount: 1,
            reason: "offset".to_string(),
            contract: Some("credits".to_string()),
        };
        let err = run(command, &client, &MockOutput::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Signer `mallory` not recognised");
        assert!(node.calls().is_empty());
    }

    #[tokio::test]
    async fn originate_saves_alias_and_becomes_addressable() {
        let dir = tempdir().unwrap();
        let code_path = dir.path().join("fa2.json");
        std::fs::write(&code_path, r#"[{"prim": "parameter", "args": []}]"#).unwrap();

        let new_address = b58check_encode(prefix::KT1, &[9; 20]);
        let node = Arc::new(MockNode {
            next_contract: Some(new_address.clone()),
            ..node()
        });
        let client = client(dir.path(), node.clone(), NO_INDEXER).await;
        let out = MockOutput::default();

        let command = Fa2Command::Originate {
            alias: "credits2".to_string(),
            code: code_path,
            signer: "alice".to_string(),
            oracle: None,
        };
        run(command, &client, &out).await.unwrap();

        out.assert_contains_message(&format!("Operation injected: {WEB_URL}/ooMockOrigination"));
        out.assert_contains_message(&format!("Saved credits2: {new_address}"));
        let saved = std::fs::read_to_string(dir.path().join(CONTRACTS_FILE)).unwrap();
        assert!(saved.contains("credits2"));

        let handle = client.resolve_contract(Some("credits2")).await.unwrap();
        assert_eq!(handle.kind, ContractKind::Fa2);
        assert_eq!(handle.address, new_address);
        // Two FA2 contracts now: no default any more.
        assert!(client.default_fa2().await.is_none());
    }

    #[tokio::test]
    async fn originate_refuses_taken_alias() {
        let dir = tempdir().unwrap();
        let node = Arc::new(node());
        let client = client(dir.path(), node.clone(), NO_INDEXER).await;

        let command = Fa2Command::Originate {
            alias: "credits".to_string(),
            code: dir.path().join("unused.json"),
            signer: "alice".to_string(),
            oracle: None,
        };
        let err = run(command, &client, &MockOutput::default()).await.unwrap_err();
        assert!(matches!(err, CliError::X4c(X4cError::Credentials(_))));
        assert!(node.originations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn info_json_dumps_storage_and_events() {
        let mut server = mockito::Server::new_async().await;
        let fa2 = fa2_address();
        let _storage = server
            .mock("GET", format!("/v1/contracts/{fa2}/storage").as_str())
            .with_body(
                json!({
                    "oracle": ALICE_PKH,
                    "ledger": 31,
                    "operators": [],
                    "token_metadata": null,
                    "metadata": null
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _ledger = server
            .mock("GET", "/v1/bigmaps/31/keys")
            .match_query(mockito::Matcher::Any)
            .with_body(
                json!([{
                    "id": 1, "active": true,
                    "key": {"token_owner": ALICE_PKH, "token_id": "0"},
                    "value": "100"
                }])
                .to_string(),
            )
            .create_async()
            .await;
        let _events = server
            .mock("GET", "/v1/contracts/events")
            .match_query(mockito::Matcher::Any)
            .with_body(
                json!([{
                    "id": 3, "tag": "retire", "timestamp": "2022-10-01T12:00:00Z",
                    "payload": "6f6666736574"
                }])
                .to_string(),
            )
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let client = client(dir.path(), Arc::new(node()), &server.url()).await;
        let out = MockOutput::default();

        run(Fa2Command::Info { json: true, contract: None }, &client, &out)
            .await
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&out.messages()[0]).unwrap();
        assert_eq!(value["alias"], "credits");
        assert_eq!(value["oracle"], ALICE_PKH);
        assert_eq!(value["ledger"][0]["amount"], 100);
        assert_eq!(value["events"][0]["payload"]["reason"], "offset");
    }
}
