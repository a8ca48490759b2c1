// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! X4C - CLI and REST wrapper for the X4C carbon-credit contracts on Tezos.
//!
//! An FA2 token contract mints credits; a Custodian contract holds them on
//! behalf of off-chain identities and retires them.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `cli` - `x4cli` commands (clap)
//! - `indexer` - Tzkt and Tzstats indexer clients behind one trait
//! - `tezos` - addresses, Michelson encoding, signers and node RPC
//! - `x4c` - alias registry, contract facades and storage views

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod indexer;
pub mod models;
pub mod state;
pub mod tezos;
pub mod x4c;
