// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{process, sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tracing_subscriber::EnvFilter;

use presence_rust_server::{
    api::router,
    blockchain::{ContractDescriptor, LedgerClient, RpcLedgerClient},
    config::{LogFormat, ServerConfig, DEFAULT_LOG_FILTER},
    state::AppState,
    storage::PresenceDatabase,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            process::exit(1);
        }
    };
    init_tracing(config.log_format);

    let contract = match ContractDescriptor::load(&config.contract_artifact) {
        Ok(contract) => contract,
        Err(e) => {
            tracing::error!(
                path = %config.contract_artifact.display(),
                error = %e,
                "Failed to load contract artifact"
            );
            process::exit(1);
        }
    };

    let db_path = config.database_path();
    let db = match PresenceDatabase::open(&db_path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            tracing::error!(path = %db_path.display(), error = %e, "Failed to open database");
            process::exit(1);
        }
    };

    let ledger = Arc::new(RpcLedgerClient::new(
        config.rpc_url.clone(),
        config.ledger_timeout,
    ));
    match ledger.latest_block_number().await {
        Ok(head) => tracing::info!(latest_block = head, "Connected to blockchain node"),
        Err(e) => tracing::warn!(error = %e, "Blockchain node unreachable; check-ins will fail until it recovers"),
    }

    let addr = match config.bind_addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, "Invalid bind address");
            process::exit(1);
        }
    };

    let state = AppState::new(db, ledger, contract);
    let app = router(state);

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received, draining connections");
        shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    tracing::info!(
        contract = %contract.address(),
        database = %db_path.display(),
        "Presence server starting"
    );

    let result = match &config.tls {
        Some(tls) => {
            let tls_config = match RustlsConfig::from_pem_file(&tls.cert, &tls.key).await {
                Ok(tls_config) => tls_config,
                Err(e) => {
                    tracing::error!(
                        cert = %tls.cert.display(),
                        error = %e,
                        "Failed to load TLS certificate and key"
                    );
                    process::exit(1);
                }
            };
            tracing::info!("Listening on https://{addr} (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
        None => {
            tracing::info!("Listening on http://{addr} (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Server failed");
        process::exit(1);
    }
    tracing::info!("Server stopped");
}
