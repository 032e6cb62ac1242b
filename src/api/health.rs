// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    models::{BlockchainInfo, BlockchainInfoResponse, STATUS_SUCCESS},
    state::AppState,
};

/// Aggregate probe result.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// `ok` when every check passed, otherwise `degraded`.
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    pub service: String,
    /// Embedded database readability.
    pub database: String,
    /// Blockchain node reachability.
    pub ledger: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

fn check_database(state: &AppState) -> String {
    match state.db.check() {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            "error".to_string()
        }
    }
}

async fn check_ledger(state: &AppState) -> String {
    if state.ledger.is_connected().await {
        "ok".to_string()
    } else {
        "unavailable".to_string()
    }
}

/// Database and node status; 503 when either is down.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Database and node reachable", body = ReadyResponse),
        (status = 503, description = "Database or node unavailable", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let database = check_database(&state);
    let ledger = check_ledger(&state).await;
    let all_ok = database == "ok" && ledger == "ok";

    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            database,
            ledger,
        },
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Process liveness; never touches dependencies.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Process is up", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe; same checks as `/health`.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready to accept check-ins", body = ReadyResponse),
        (status = 503, description = "Not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    health(state).await
}

/// Contract address and node connectivity.
///
/// Always 200; an unreachable node is reported as `connected: false`.
#[utoipa::path(
    get,
    path = "/v1/blockchain/info",
    tag = "Blockchain",
    responses((status = 200, body = BlockchainInfoResponse))
)]
pub async fn blockchain_info(State(state): State<AppState>) -> Json<BlockchainInfoResponse> {
    let latest_block = match state.ledger.latest_block_number().await {
        Ok(number) => Some(number),
        Err(e) => {
            tracing::warn!(error = %e, "Blockchain node unreachable");
            None
        }
    };

    Json(BlockchainInfoResponse {
        status: STATUS_SUCCESS.to_string(),
        blockchain: BlockchainInfo {
            contract_address: state.contract.address().to_checksum(None),
            connected: latest_block.is_some(),
            latest_block,
        },
    })
}
