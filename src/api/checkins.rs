// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::str::FromStr;

use alloy::primitives::Address;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    attendance::CheckinError,
    error::ApiError,
    models::{
        CheckinUser, EventCheckinRequest, EventCheckinResponse, UserCheckinsResponse,
        STATUS_SUCCESS,
    },
    state::AppState,
};

fn missing_parameters() -> ApiError {
    ApiError::bad_request("Missing required parameters").with_code("missing_parameters")
}

/// Wrongly typed fields are invalid input; unreadable bodies count as missing parameters.
fn rejected_body(rejection: JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection, "Rejected check-in body");
    match rejection {
        JsonRejection::JsonDataError(err) if err.body_text().contains("event_id") => {
            ApiError::bad_request("Invalid event ID").with_code("invalid_input")
        }
        JsonRejection::JsonDataError(err) => {
            ApiError::bad_request(format!("Invalid check-in data: {}", err.body_text()))
                .with_code("invalid_input")
        }
        _ => missing_parameters(),
    }
}

/// Verify an on-chain check-in transaction and record the attendance.
#[utoipa::path(
    post,
    path = "/v1/event_checkin",
    request_body = EventCheckinRequest,
    tag = "Check-ins",
    responses(
        (status = 201, description = "Check-in verified and recorded", body = EventCheckinResponse),
        (status = 400, description = "Malformed input, replayed transaction or duplicate attendance"),
        (status = 401, description = "Transaction failed on-chain verification"),
        (status = 404, description = "Event not found"),
        (status = 503, description = "Blockchain node unavailable")
    )
)]
pub async fn event_checkin(
    State(state): State<AppState>,
    payload: Result<Json<EventCheckinRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventCheckinResponse>), ApiError> {
    let Json(request) = payload.map_err(rejected_body)?;

    let (Some(event_id), Some(wallet), Some(tx_hash)) =
        (request.event_id, request.wallet_address, request.tx_hash)
    else {
        return Err(missing_parameters());
    };
    if wallet.trim().is_empty() || tx_hash.trim().is_empty() {
        return Err(missing_parameters());
    }
    let event_id = event_id.to_event_id().map_err(CheckinError::from)?;

    let receipt = state
        .attendance
        .record_check_in(event_id, wallet.trim(), tx_hash.trim())
        .await?;

    let response = EventCheckinResponse {
        status: STATUS_SUCCESS.to_string(),
        message: format!("Check-in verified and registered for {}", receipt.event.name),
        attendance_id: receipt.attendance.id,
        event: receipt.event,
        blockchain: receipt.verified,
        user: CheckinUser {
            wallet_address: receipt.identity.address,
            new_user: receipt.identity_created,
            total_checkins: receipt.total_checkins,
        },
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// List a wallet's verified check-ins, newest first.
#[utoipa::path(
    get,
    path = "/v1/checkins/{address}",
    params(
        ("address" = String, Path, description = "Wallet address, 0x-prefixed")
    ),
    tag = "Check-ins",
    responses(
        (status = 200, body = UserCheckinsResponse),
        (status = 400, description = "Invalid wallet address")
    )
)]
pub async fn user_checkins(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UserCheckinsResponse>, ApiError> {
    let checkins = state.attendance.user_checkins(&address)?;
    let wallet_address = Address::from_str(&address)
        .map(|a| a.to_checksum(None))
        .unwrap_or(address);

    Ok(Json(UserCheckinsResponse {
        status: STATUS_SUCCESS.to_string(),
        wallet_address,
        total_checkins: checkins.len(),
        checkins,
    }))
}
