// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;

use tracing::{error, info};

use x4c::api::router;
use x4c::config::{init_tracing, Settings, SERVER_LOG_FILTER};
use x4c::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing(SERVER_LOG_FILTER);

    let settings = Settings::from_env().expect("Invalid configuration");
    let client = settings
        .load_client()
        .await
        .expect("Failed to initialise the Tezos clients");

    let state = AppState::new(client, settings.custodian_operator.clone());
    let app = router(state);

    let addr: SocketAddr = settings
        .bind_address()
        .parse()
        .expect("Failed to parse bind address");

    info!(
        %addr,
        rpc = %settings.rpc_url,
        indexer = %settings.indexer_backend,
        indexer_url = %settings.indexer_url,
        "X4C server listening (docs at /docs)"
    );

    let server = axum_server::bind(addr).serve(app.into_make_service());

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server failed");
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }
}
