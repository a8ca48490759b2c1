// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! FA2 token contract facade.

use std::sync::Arc;

use crate::indexer::IndexerClient;
use crate::tezos::{Micheline, Parameters, Signer, TezosNode};

use super::events::ContractEvent;
use super::registry::ContractHandle;
use super::storage::Fa2Storage;
use super::{OperationResult, X4cError};

/// Metadata registered with a new token id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub title: String,
    pub url: String,
}

/// An FA2 contract bound to an optional signer.
pub struct Fa2Contract {
    node: Arc<dyn TezosNode>,
    indexer: Arc<dyn IndexerClient>,
    contract: Arc<ContractHandle>,
    signer: Option<Arc<dyn Signer>>,
}

impl Fa2Contract {
    pub fn new(
        node: Arc<dyn TezosNode>,
        indexer: Arc<dyn IndexerClient>,
        contract: Arc<ContractHandle>,
        signer: Option<Arc<dyn Signer>>,
    ) -> Self {
        Self {
            node,
            indexer,
            contract,
            signer,
        }
    }

    pub fn address(&self) -> &str {
        &self.contract.address
    }

    pub fn handle(&self) -> &Arc<ContractHandle> {
        &self.contract
    }

    pub fn signer_hash(&self) -> Option<&str> {
        self.signer.as_deref().map(|s| s.public_key_hash())
    }

    fn signer(&self) -> Result<&dyn Signer, X4cError> {
        self.signer.as_deref().ok_or(X4cError::SignerRequired)
    }

    async fn call(&self, parameters: Parameters) -> Result<OperationResult, X4cError> {
        let signer = self.signer()?;
        let operation_hash = self
            .node
            .call_contract(signer, &self.contract.address, parameters)
            .await?;
        Ok(OperationResult { operation_hash })
    }

    pub async fn add_token_id(
        &self,
        token_id: u64,
        info: &TokenInfo,
    ) -> Result<OperationResult, X4cError> {
        self.call(add_token_id_parameters(token_id, info)).await
    }

    pub async fn mint(
        &self,
        owner: &str,
        token_id: u64,
        amount: u64,
    ) -> Result<OperationResult, X4cError> {
        self.call(mint_parameters(owner, token_id, amount)).await
    }

    /// Transfer from the bound signer's account.
    pub async fn transfer(
        &self,
        receiver: &str,
        token_id: u64,
        amount: u64,
    ) -> Result<OperationResult, X4cError> {
        let from = self.signer()?.public_key_hash().to_string();
        self.call(transfer_parameters(&from, receiver, token_id, amount))
            .await
    }

    /// Retire tokens held by the bound signer; `reason` is the on-chain memo.
    pub async fn retire(
        &self,
        token_id: u64,
        amount: u64,
        reason: &str,
    ) -> Result<OperationResult, X4cError> {
        let party = self.signer()?.public_key_hash().to_string();
        self.call(retire_parameters(&party, token_id, amount, reason))
            .await
    }

    pub fn storage(&self) -> Fa2Storage {
        Fa2Storage::new(self.indexer.clone(), self.contract.address.clone())
    }

    pub async fn events(&self, tag: Option<&str>) -> Result<Vec<ContractEvent>, X4cError> {
        let events = self.indexer.events(&self.contract.address, tag).await?;
        Ok(events.into_iter().map(ContractEvent::from).collect())
    }
}

// (list %add_token_id (pair (nat %token_id) (map %token_info string bytes)))
fn add_token_id_parameters(token_id: u64, info: &TokenInfo) -> Parameters {
    Parameters::new(
        "add_token_id",
        Micheline::seq(vec![Micheline::pair(
            Micheline::nat(token_id),
            Micheline::seq(vec![
                Micheline::elt(Micheline::string("title"), Micheline::bytes(hex::encode(&info.title))),
                Micheline::elt(Micheline::string("url"), Micheline::bytes(hex::encode(&info.url))),
            ]),
        )]),
    )
}

// (list %mint (pair (pair (address %owner) (nat %qty)) (nat %token_id)))
fn mint_parameters(owner: &str, token_id: u64, amount: u64) -> Parameters {
    Parameters::new(
        "mint",
        Micheline::seq(vec![Micheline::pair(
            Micheline::pair(Micheline::string(owner), Micheline::nat(amount)),
            Micheline::nat(token_id),
        )]),
    )
}

// (list %transfer (pair (address %from_)
//                       (list %txs (pair (address %to_) (pair (nat %token_id) (nat %amount))))))
fn transfer_parameters(from: &str, receiver: &str, token_id: u64, amount: u64) -> Parameters {
    Parameters::new(
        "transfer",
        Micheline::seq(vec![Micheline::pair(
            Micheline::string(from),
            Micheline::seq(vec![Micheline::pair(
                Micheline::string(receiver),
                Micheline::pair(Micheline::nat(token_id), Micheline::nat(amount)),
            )]),
        )]),
    )
}

// (list %retire (pair (pair (nat %amount) (bytes %retiring_data))
//                     (pair (address %retiring_party) (nat %token_id))))
fn retire_parameters(party: &str, token_id: u64, amount: u64, reason: &str) -> Parameters {
    Parameters::new(
        "retire",
        Micheline::seq(vec![Micheline::pair(
            Micheline::pair(Micheline::nat(amount), Micheline::bytes(hex::encode(reason))),
            Micheline::pair(Micheline::string(party), Micheline::nat(token_id)),
        )]),
    )
}
