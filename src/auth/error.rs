// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet login errors.

use axum::http::StatusCode;

use super::signature::SignatureError;
use crate::storage::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Address, signature or nonce missing or empty
    #[error("Missing required parameters")]
    MissingParameters,

    #[error("Invalid wallet address format")]
    InvalidAddressFormat,

    /// Signature could not be decoded or recovered
    #[error("Invalid signature")]
    InvalidSignature(#[source] SignatureError),

    /// Signature is valid but was made by another key
    #[error("Signature does not match wallet address")]
    SignatureMismatch,

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingParameters => "missing_parameters",
            AuthError::InvalidAddressFormat => "invalid_address_format",
            AuthError::InvalidSignature(_) => "invalid_signature",
            AuthError::SignatureMismatch => "signature_mismatch",
            AuthError::Storage(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingParameters | AuthError::InvalidAddressFormat => {
                StatusCode::BAD_REQUEST
            }
            AuthError::InvalidSignature(_) | AuthError::SignatureMismatch => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
