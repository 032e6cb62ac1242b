// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::attendance::CheckinError;
use crate::auth::AuthError;
use crate::storage::StoreError;

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error_code: Option<&'static str>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_code: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.error_code = Some(code);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE).with_code("internal_error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.error_code,
        });
        (self.status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if let AuthError::Storage(ref inner) = err {
            tracing::error!(error = %inner, "Storage failure during login");
            return Self::internal();
        }
        Self::new(err.status_code(), err.to_string()).with_code(err.error_code())
    }
}

impl From<CheckinError> for ApiError {
    fn from(err: CheckinError) -> Self {
        match err {
            CheckinError::Storage(ref inner) => {
                tracing::error!(error = %inner, "Storage failure during check-in");
                Self::internal()
            }
            CheckinError::TaskFailed(ref reason) => {
                tracing::error!(error = %reason, "Check-in task failed");
                Self::internal()
            }
            _ => Self::new(err.status_code(), err.to_string()).with_code(err.error_code()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidEvent(reason) => {
                Self::bad_request(reason.to_string()).with_code("invalid_input")
            }
            other => {
                tracing::error!(error = %other, "Storage failure");
                Self::internal()
            }
        }
    }
}
