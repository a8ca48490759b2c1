// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custodian contract facade.
//!
//! Off-chain identities (`kyc`, `from_`, `to_`, `token_owner`) are passed as
//! plain strings and packed with [`string_to_michelson_bytes`]. The custodian
//! itself is addressed by the identity [`SELF_IDENTITY`].

use std::sync::Arc;

use crate::indexer::IndexerClient;
use crate::tezos::encoding::string_to_michelson_bytes;
use crate::tezos::{Micheline, Parameters, Signer, TezosNode};

use super::events::ContractEvent;
use super::registry::ContractHandle;
use super::storage::CustodianStorage;
use super::{OperationResult, X4cError};

/// Identity of the custodian's own holdings.
pub const SELF_IDENTITY: &str = "self";

/// A Custodian contract bound to an optional signer.
pub struct CustodianContract {
    node: Arc<dyn TezosNode>,
    indexer: Arc<dyn IndexerClient>,
    contract: Arc<ContractHandle>,
    signer: Option<Arc<dyn Signer>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperatorUpdate {
    Add,
    Remove,
}

impl CustodianContract {
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

    async fn call(&self, parameters: Parameters) -> Result<OperationResult, X4cError> {
        let signer = self.signer.as_deref().ok_or(X4cError::SignerRequired)?;
        let operation_hash = self
            .node
            .call_contract(signer, &self.contract.address, parameters)
            .await?;
        Ok(OperationResult { operation_hash })
    }

    pub async fn add_operator(
        &self,
        operator: &str,
        token_id: u64,
        token_owner: &str,
    ) -> Result<OperationResult, X4cError> {
        self.call(operator_parameters(OperatorUpdate::Add, operator, token_id, token_owner))
            .await
    }

    pub async fn remove_operator(
        &self,
        operator: &str,
        token_id: u64,
        token_owner: &str,
    ) -> Result<OperationResult, X4cError> {
        self.call(operator_parameters(OperatorUpdate::Remove, operator, token_id, token_owner))
            .await
    }

    /// Credit the custodian with tokens of `fa2` it received externally.
    pub async fn internal_mint(&self, fa2: &str, token_id: u64) -> Result<OperationResult, X4cError> {
        // (list %internal_mint (pair (address %token_address) (nat %token_id)))
        self.call(Parameters::new(
            "internal_mint",
            Micheline::seq(vec![Micheline::pair(
                Micheline::string(fa2),
                Micheline::nat(token_id),
            )]),
        ))
        .await
    }

    /// Move tokens between off-chain identities; both default to `"self"`.
    pub async fn internal_transfer(
        &self,
        fa2: &str,
        token_id: u64,
        amount: u64,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<OperationResult, X4cError> {
        let from = string_to_michelson_bytes(from.unwrap_or(SELF_IDENTITY));
        let to = string_to_michelson_bytes(to.unwrap_or(SELF_IDENTITY));

        // (list %internal_transfer (pair (bytes %from_) (pair (address %token_address)
        //     (list %txs (pair (bytes %to_) (pair (nat %token_id) (nat %amount)))))))
        self.call(Parameters::new(
            "internal_transfer",
            Micheline::seq(vec![Micheline::pair(
                Micheline::bytes(from),
                Micheline::pair(
                    Micheline::string(fa2),
                    Micheline::seq(vec![Micheline::pair(
                        Micheline::bytes(to),
                        Micheline::pair(Micheline::nat(token_id), Micheline::nat(amount)),
                    )]),
                ),
            )]),
        ))
        .await
    }

    /// Retire tokens held for `kyc` (default `"self"`).
    pub async fn retire(
        &self,
        fa2: &str,
        token_id: u64,
        amount: u64,
        kyc: Option<&str>,
        reason: &str,
    ) -> Result<OperationResult, X4cError> {
        let kyc = string_to_michelson_bytes(kyc.unwrap_or(SELF_IDENTITY));

        // (list %retire (pair (address %token_address)
        //     (list %txs (pair (pair (nat %amount) (bytes %retiring_data))
        //                      (pair (bytes %retiring_party_kyc) (nat %token_id))))))
        self.call(Parameters::new(
            "retire",
            Micheline::seq(vec![Micheline::pair(
                Micheline::string(fa2),
                Micheline::seq(vec![Micheline::pair(
                    Micheline::pair(Micheline::nat(amount), Micheline::bytes(hex::encode(reason))),
                    Micheline::pair(Micheline::bytes(kyc), Micheline::nat(token_id)),
                )]),
            )]),
        ))
        .await
    }

    pub fn storage(&self) -> CustodianStorage {
        CustodianStorage::new(self.indexer.clone(), self.contract.address.clone())
    }

    pub async fn events(&self, tag: Option<&str>) -> Result<Vec<ContractEvent>, X4cError> {
        let events = self.indexer.events(&self.contract.address, tag).await?;
        Ok(events.into_iter().map(ContractEvent::from).collect())
    }
}

// (list %update_internal_operators (or
//     (pair %add_operator (bytes %token_owner) (pair (address %token_operator) (nat %token_id)))
//     (pair %remove_operator (bytes %token_owner) (pair (address %token_operator) (nat %token_id)))))
fn operator_parameters(
    update: OperatorUpdate,
    operator: &str,
    token_id: u64,
    token_owner: &str,
) -> Parameters {
    let record = Micheline::pair(
        Micheline::bytes(string_to_michelson_bytes(token_owner)),
        Micheline::pair(Micheline::string(operator), Micheline::nat(token_id)),
    );
    let update = match update {
        OperatorUpdate::Add => Micheline::left(record),
        OperatorUpdate::Remove => Micheline::right(record),
    };
    Parameters::new("update_internal_operators", Micheline::seq(vec![update]))
}
