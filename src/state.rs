// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::x4c::X4cClient;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<X4cClient>,
    /// Signer alias or address used by the retire routes.
    pub custodian_operator: Option<String>,
}

impl AppState {
    pub fn new(client: X4cClient, custodian_operator: Option<String>) -> Self {
        Self {
            client: Arc::new(client),
            custodian_operator,
        }
    }
}
