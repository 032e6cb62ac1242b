// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::{
    error::ApiError,
    models::{LoginWalletRequest, LoginWalletResponse, WalletUser, STATUS_SUCCESS},
    state::AppState,
};

/// Authenticate a wallet by its signature over a login nonce.
///
/// Creates the wallet's identity on first login.
#[utoipa::path(
    post,
    path = "/v1/login_wallet",
    request_body = LoginWalletRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Wallet authenticated", body = LoginWalletResponse),
        (status = 400, description = "Missing parameters or invalid address"),
        (status = 401, description = "Signature invalid or made by another wallet")
    )
)]
pub async fn login_wallet(
    State(state): State<AppState>,
    payload: Result<Json<LoginWalletRequest>, JsonRejection>,
) -> Result<Json<LoginWalletResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected login body");
        match rejection {
            JsonRejection::JsonDataError(err) => {
                ApiError::bad_request(format!("Invalid login data: {}", err.body_text()))
                    .with_code("invalid_input")
            }
            _ => ApiError::bad_request("Missing required parameters")
                .with_code("missing_parameters"),
        }
    })?;

    let wallet = state.identity.authenticate(
        request.address.as_deref().unwrap_or_default(),
        request.signature.as_deref().unwrap_or_default(),
        request.nonce.as_deref().unwrap_or_default(),
    )?;

    Ok(Json(LoginWalletResponse {
        status: STATUS_SUCCESS.to_string(),
        message: "Wallet authenticated successfully".to_string(),
        user: WalletUser {
            wallet_address: wallet.identity.address,
            username: wallet.identity.display_name,
            created: wallet.created,
            total_checkins: wallet.total_checkins,
        },
    }))
}
