// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory node used by registry and facade tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::node::{Origination, TezosNode};
use super::{Parameters, Script, Signer, TezosError};

/// A recorded contract call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub source: String,
    pub destination: String,
    pub parameters: Parameters,
}

#[derive(Default)]
pub struct MockNode {
    pub entrypoints: HashMap<String, Vec<String>>,
    pub calls: Mutex<Vec<RecordedCall>>,
    pub originations: Mutex<Vec<Script>>,
    /// Address handed out by the next origination.
    pub next_contract: Option<String>,
    /// When set, every submission fails with this reason.
    pub reject_with: Option<String>,
}

impl MockNode {
    pub fn with_contract(mut self, address: &str, entrypoints: &[&str]) -> Self {
        self.entrypoints.insert(
            address.to_string(),
            entrypoints.iter().map(|e| e.to_string()).collect(),
        );
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TezosNode for MockNode {
    async fn entrypoints(&self, address: &str) -> Result<Vec<String>, TezosError> {
        self.entrypoints
            .get(address)
            .cloned()
            .ok_or_else(|| TezosError::Rpc(format!("GET {address}/entrypoints returned 404")))
    }

    async fn call_contract(
        &self,
        signer: &dyn Signer,
        destination: &str,
        parameters: Parameters,
    ) -> Result<String, TezosError> {
        if let Some(reason) = &self.reject_with {
            return Err(TezosError::OperationRejected {
                hash: "ooRejected".to_string(),
                reason: reason.clone(),
            });
        }
        let mut calls = self.calls.lock().unwrap();
        calls.push(RecordedCall {
            source: signer.public_key_hash().to_string(),
            destination: destination.to_string(),
            parameters,
        });
        Ok(format!("ooMockOperation{}", calls.len()))
    }

    async fn originate(
        &self,
        _signer: &dyn Signer,
        script: Script,
    ) -> Result<Origination, TezosError> {
        if let Some(reason) = &self.reject_with {
            return Err(TezosError::OperationRejected {
                hash: "ooRejected".to_string(),
                reason: reason.clone(),
            });
        }
        self.originations.lock().unwrap().push(script);
        Ok(Origination {
            operation_hash: "ooMockOrigination".to_string(),
            contract_address: self
                .next_contract
                .clone()
                .unwrap_or_else(|| "KT1MockOriginated".to_string()),
        })
    }
}
