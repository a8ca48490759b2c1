// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Alias registry and facade factory.
//!
//! [`X4cClient`] is built once at start-up from the tezos-client credential
//! files and handed to every command or route handler. It owns three alias
//! tables:
//!
//! - **keys**: local secret keys (`secret_keys`)
//! - **contracts**: known contracts (`contracts`), classified by entrypoints
//! - **addresses**: accounts whose keys live in a remote signer (`public_key_hashs`)
//!
//! Lookups try the tables in that order and the first match wins.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::indexer::IndexerClient;
use crate::tezos::encoding::{is_contract_address, is_ed25519_address, is_implicit_address};
use crate::tezos::{LocalKey, Micheline, RemoteSigner, Script, Signer, TezosNode};

use super::credentials::CredentialStore;
use super::custodian::CustodianContract;
use super::fa2::Fa2Contract;
use super::{AliasRole, X4cError};

const FA2_MARKER_ENTRYPOINT: &str = "mint";
const CUSTODIAN_MARKER_ENTRYPOINT: &str = "internal_mint";

/// Contract family, decided once when the contract is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    Fa2,
    Custodian,
    Unknown,
}

impl ContractKind {
    /// Classify a contract by the entrypoints it exposes.
    pub fn classify(entrypoints: &[String]) -> Self {
        let exposes = |name: &str| entrypoints.iter().any(|e| e == name);
        if exposes(FA2_MARKER_ENTRYPOINT) {
            Self::Fa2
        } else if exposes(CUSTODIAN_MARKER_ENTRYPOINT) {
            Self::Custodian
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fa2 => write!(f, "FA2"),
            Self::Custodian => write!(f, "Custodian"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A known on-chain contract. Never mutated once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractHandle {
    pub alias: String,
    pub address: String,
    pub kind: ContractKind,
    pub entrypoints: Vec<String>,
}

/// Endpoints shared by every facade the client builds.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Indexer web UI used for deep links.
    pub indexer_web_url: String,
    pub signatory_url: Option<String>,
}

/// Result of an origination through the registry.
#[derive(Debug, Clone)]
pub struct Originated {
    pub operation_hash: String,
    pub contract: Arc<ContractHandle>,
}

#[derive(Default)]
struct ContractTable {
    by_alias: BTreeMap<String, Arc<ContractHandle>>,
    default_fa2: Option<Arc<ContractHandle>>,
}

impl ContractTable {
    fn insert(&mut self, handle: Arc<ContractHandle>) {
        self.by_alias.insert(handle.alias.clone(), handle);
        self.refresh_default();
    }

    /// The default FA2 contract is set only when exactly one FA2 address is
    /// known.
    fn refresh_default(&mut self) {
        let fa2s: BTreeSet<&str> = self
            .by_alias
            .values()
            .filter(|h| h.kind == ContractKind::Fa2)
            .map(|h| h.address.as_str())
            .collect();

        self.default_fa2 = match fa2s.len() {
            1 => self
                .by_alias
                .values()
                .find(|h| h.kind == ContractKind::Fa2)
                .cloned(),
            _ => None,
        };
    }

    fn find(&self, name: &str) -> Option<Arc<ContractHandle>> {
        self.by_alias
            .get(name)
            .or_else(|| self.by_alias.values().find(|h| h.address == name))
            .cloned()
    }
}

/// Process-wide alias registry.
pub struct X4cClient {
    node: Arc<dyn TezosNode>,
    indexer: Arc<dyn IndexerClient>,
    settings: ClientSettings,
    credentials: CredentialStore,
    keys: BTreeMap<String, Arc<LocalKey>>,
    addresses: BTreeMap<String, String>,
    contracts: RwLock<ContractTable>,
}

impl X4cClient {
    /// Read every credential source and classify the known contracts.
    ///
    /// Missing or malformed sources and individual bad entries are logged and
    /// skipped; loading itself never fails.
    pub async fn load(
        node: Arc<dyn TezosNode>,
        indexer: Arc<dyn IndexerClient>,
        settings: ClientSettings,
        credentials: CredentialStore,
    ) -> Self {
        let mut keys = BTreeMap::new();
        for entry in credentials.secret_keys() {
            match LocalKey::from_secret_key(&entry.value) {
                Ok(key) => {
                    keys.insert(entry.name, Arc::new(key));
                }
                Err(e) => warn!(alias = %entry.name, error = %e, "Skipping unusable secret key"),
            }
        }

        let mut addresses = BTreeMap::new();
        for entry in credentials.public_key_hashes() {
            if keys.contains_key(&entry.name) {
                continue;
            }
            if !is_implicit_address(&entry.value) {
                warn!(alias = %entry.name, value = %entry.value, "Skipping invalid account address");
                continue;
            }
            if !is_ed25519_address(&entry.value) {
                warn!(alias = %entry.name, value = %entry.value, "Skipping remote account: only tz1 addresses can be signed for");
                continue;
            }
            addresses.insert(entry.name, entry.value);
        }

        let mut table = ContractTable::default();
        for entry in credentials.contracts() {
            if !is_contract_address(&entry.value) {
                warn!(alias = %entry.name, value = %entry.value, "Skipping invalid contract address");
                continue;
            }
            let handle = describe_contract(node.as_ref(), entry.name, entry.value).await;
            table.by_alias.insert(handle.alias.clone(), Arc::new(handle));
        }
        table.refresh_default();

        info!(
            keys = keys.len(),
            contracts = table.by_alias.len(),
            addresses = addresses.len(),
            default_fa2 = table.default_fa2.as_ref().map(|h| h.alias.as_str()),
            "Loaded client state"
        );

        Self {
            node,
            indexer,
            settings,
            credentials,
            keys,
            addresses,
            contracts: RwLock::new(table),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn indexer(&self) -> &Arc<dyn IndexerClient> {
        &self.indexer
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Local keys as `(alias, public key hash)`.
    pub fn keys(&self) -> Vec<(String, String)> {
        self.keys
            .iter()
            .map(|(alias, key)| (alias.clone(), key.public_key_hash().to_string()))
            .collect()
    }

    /// Remote-signer accounts as `(alias, public key hash)`.
    pub fn addresses(&self) -> Vec<(String, String)> {
        self.addresses
            .iter()
            .map(|(alias, pkh)| (alias.clone(), pkh.clone()))
            .collect()
    }

    pub async fn contracts(&self) -> Vec<Arc<ContractHandle>> {
        self.contracts.read().await.by_alias.values().cloned().collect()
    }

    pub async fn default_fa2(&self) -> Option<Arc<ContractHandle>> {
        self.contracts.read().await.default_fa2.clone()
    }

    /// Canonical address for `name`; unknown names are returned unchanged.
    pub async fn resolve_hash(&self, name: &str) -> String {
        if let Some(key) = self.keys.get(name) {
            return key.public_key_hash().to_string();
        }
        if let Some(handle) = self.contracts.read().await.by_alias.get(name) {
            return handle.address.clone();
        }
        if let Some(pkh) = self.addresses.get(name) {
            return pkh.clone();
        }
        name.to_string()
    }

    /// Signer for an alias or public key hash; `Ok(None)` when nothing matches.
    pub fn resolve_signer(&self, name: &str) -> Result<Option<Arc<dyn Signer>>, X4cError> {
        if let Some(key) = self
            .keys
            .get(name)
            .or_else(|| self.keys.values().find(|k| k.public_key_hash() == name))
        {
            return Ok(Some(key.clone() as Arc<dyn Signer>));
        }

        let Some((alias, pkh)) = self
            .addresses
            .iter()
            .find(|(alias, pkh)| alias.as_str() == name || pkh.as_str() == name)
        else {
            return Ok(None);
        };
        let signer = RemoteSigner::new(alias.clone(), self.settings.signatory_url.clone(), pkh.clone())?;
        Ok(Some(Arc::new(signer) as Arc<dyn Signer>))
    }

    /// Contract by alias or address; `None` picks the default FA2 contract.
    pub async fn resolve_contract(&self, name: Option<&str>) -> Option<Arc<ContractHandle>> {
        let table = self.contracts.read().await;
        match name {
            None => table.default_fa2.clone(),
            Some(name) => table.find(name),
        }
    }

    pub async fn fa2_contract(
        &self,
        contract: Option<&str>,
        signer: Option<&str>,
    ) -> Result<Fa2Contract, X4cError> {
        let handle = self.require_contract(contract).await?;
        let signer = self.optional_signer(signer)?;
        Ok(Fa2Contract::new(
            self.node.clone(),
            self.indexer.clone(),
            handle,
            signer,
        ))
    }

    pub async fn custodian_contract(
        &self,
        contract: Option<&str>,
        signer: Option<&str>,
    ) -> Result<CustodianContract, X4cError> {
        let handle = self.require_contract(contract).await?;
        let signer = self.optional_signer(signer)?;
        Ok(CustodianContract::new(
            self.node.clone(),
            self.indexer.clone(),
            handle,
            signer,
        ))
    }

    /// Originate an FA2 contract whose oracle defaults to the signer.
    pub async fn originate_fa2(
        &self,
        code: Micheline,
        signer: &str,
        oracle: Option<&str>,
    ) -> Result<Originated, X4cError> {
        let signer = self.require_signer(signer)?;
        let oracle = match oracle {
            Some(name) => self.resolve_hash(name).await,
            None => signer.public_key_hash().to_string(),
        };

        // (Pair (Pair (Pair {} {}) (Pair {} "oracle")) {})
        let storage = Micheline::pair(
            Micheline::pair(
                Micheline::pair(Micheline::empty(), Micheline::empty()),
                Micheline::pair(Micheline::empty(), Micheline::string(oracle)),
            ),
            Micheline::empty(),
        );
        self.originate(signer.as_ref(), Script { code, storage }, ContractKind::Fa2)
            .await
    }

    /// Originate a Custodian contract whose custodian defaults to the signer.
    pub async fn originate_custodian(
        &self,
        code: Micheline,
        signer: &str,
        custodian: Option<&str>,
    ) -> Result<Originated, X4cError> {
        let signer = self.require_signer(signer)?;
        let custodian = match custodian {
            Some(name) => self.resolve_hash(name).await,
            None => signer.public_key_hash().to_string(),
        };

        // (Pair (Pair (Pair "custodian" {}) (Pair {} {})) {})
        let storage = Micheline::pair(
            Micheline::pair(
                Micheline::pair(Micheline::string(custodian), Micheline::empty()),
                Micheline::pair(Micheline::empty(), Micheline::empty()),
            ),
            Micheline::empty(),
        );
        self.originate(
            signer.as_ref(),
            Script { code, storage },
            ContractKind::Custodian,
        )
        .await
    }

    /// Persist `alias` for `address` in the `contracts` file and register it.
    pub async fn save_alias(&self, alias: &str, address: &str) -> Result<Arc<ContractHandle>, X4cError> {
        if !is_contract_address(address) {
            return Err(X4cError::InvalidArgument(format!(
                "`{address}` is not a contract address"
            )));
        }
        self.credentials.append_contract(alias, address)?;

        let known = self.contracts.read().await.find(address);
        let handle = match known {
            Some(existing) => ContractHandle {
                alias: alias.to_string(),
                ..existing.as_ref().clone()
            },
            None => describe_contract(self.node.as_ref(), alias.to_string(), address.to_string()).await,
        };
        let handle = Arc::new(handle);
        self.contracts.write().await.insert(handle.clone());
        Ok(handle)
    }

    async fn originate(
        &self,
        signer: &dyn Signer,
        script: Script,
        kind: ContractKind,
    ) -> Result<Originated, X4cError> {
        let origination = self.node.originate(signer, script).await?;
        let entrypoints = match self.node.entrypoints(&origination.contract_address).await {
            Ok(entrypoints) => entrypoints,
            Err(e) => {
                warn!(address = %origination.contract_address, error = %e, "Could not list entrypoints of new contract");
                Vec::new()
            }
        };

        let handle = Arc::new(ContractHandle {
            alias: origination.contract_address.clone(),
            address: origination.contract_address,
            kind,
            entrypoints,
        });
        self.contracts.write().await.insert(handle.clone());
        info!(address = %handle.address, kind = %kind, operation = %origination.operation_hash, "Contract originated");

        Ok(Originated {
            operation_hash: origination.operation_hash,
            contract: handle,
        })
    }

    async fn require_contract(&self, name: Option<&str>) -> Result<Arc<ContractHandle>, X4cError> {
        match name {
            None => self
                .resolve_contract(None)
                .await
                .ok_or(X4cError::NoDefaultContract),
            Some(name) => self
                .resolve_contract(Some(name))
                .await
                .ok_or_else(|| X4cError::AliasNotFound {
                    role: AliasRole::Contract,
                    name: name.to_string(),
                }),
        }
    }

    fn require_signer(&self, name: &str) -> Result<Arc<dyn Signer>, X4cError> {
        self.resolve_signer(name)?
            .ok_or_else(|| X4cError::AliasNotFound {
                role: AliasRole::Signer,
                name: name.to_string(),
            })
    }

    fn optional_signer(&self, name: Option<&str>) -> Result<Option<Arc<dyn Signer>>, X4cError> {
        name.map(|name| self.require_signer(name)).transpose()
    }
}

async fn describe_contract(node: &dyn TezosNode, alias: String, address: String) -> ContractHandle {
    let entrypoints = match node.entrypoints(&address).await {
        Ok(entrypoints) => entrypoints,
        Err(e) => {
            warn!(alias = %alias, address = %address, error = %e, "Could not classify contract");
            Vec::new()
        }
    };
    ContractHandle {
        kind: ContractKind::classify(&entrypoints),
        alias,
        address,
        entrypoints,
    }
}
