// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Check-in errors.

use axum::http::StatusCode;

use crate::blockchain::VerifyError;
use crate::storage::StoreError;
use crate::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum CheckinError {
    #[error("{0}")]
    InvalidInput(#[from] ValidationError),

    #[error("Event not found")]
    EventNotFound,

    #[error("This transaction has already been recorded")]
    TransactionAlreadyUsed,

    #[error("User has already checked in to this event")]
    AlreadyAttended,

    #[error("Blockchain verification failed: {0}")]
    Verification(#[from] VerifyError),

    #[error("Storage error: {0}")]
    Storage(StoreError),

    #[error("Check-in task failed: {0}")]
    TaskFailed(String),
}

impl From<StoreError> for CheckinError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TransactionAlreadyUsed => CheckinError::TransactionAlreadyUsed,
            StoreError::AlreadyAttended => CheckinError::AlreadyAttended,
            other => CheckinError::Storage(other),
        }
    }
}

impl CheckinError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            CheckinError::InvalidInput(_) => "invalid_input",
            CheckinError::EventNotFound => "event_not_found",
            CheckinError::TransactionAlreadyUsed => "transaction_already_used",
            CheckinError::AlreadyAttended => "already_attended",
            CheckinError::Verification(kind) => kind.error_code(),
            CheckinError::Storage(_) | CheckinError::TaskFailed(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CheckinError::InvalidInput(_)
            | CheckinError::TransactionAlreadyUsed
            | CheckinError::AlreadyAttended => StatusCode::BAD_REQUEST,
            CheckinError::EventNotFound => StatusCode::NOT_FOUND,
            CheckinError::Verification(VerifyError::LedgerUnavailable) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CheckinError::Verification(kind) if kind.is_malformed_input() => {
                StatusCode::BAD_REQUEST
            }
            CheckinError::Verification(_) => StatusCode::UNAUTHORIZED,
            CheckinError::Storage(_) | CheckinError::TaskFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            CheckinError::from(ValidationError::TxHashLength).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(CheckinError::EventNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            CheckinError::from(VerifyError::TransactionNotFound).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            CheckinError::from(VerifyError::LedgerUnavailable).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            CheckinError::from(VerifyError::MalformedHash).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn store_conflicts_become_checkin_conflicts() {
        let used = CheckinError::from(StoreError::TransactionAlreadyUsed);
        assert!(matches!(used, CheckinError::TransactionAlreadyUsed));
        assert_eq!(used.error_code(), "transaction_already_used");

        let attended = CheckinError::from(StoreError::AlreadyAttended);
        assert_eq!(attended.error_code(), "already_attended");
        assert_eq!(attended.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn verification_code_passes_through() {
        let err = CheckinError::from(VerifyError::EventIdMismatch);
        assert_eq!(err.error_code(), "event_id_mismatch");
        assert_eq!(
            err.to_string(),
            "Blockchain verification failed: Check-in event does not match the requested event"
        );
    }
}
