// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::diffusion::GateError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    InvalidRequest(String),
    Rejected(GateError),
    GenerationFailed(String),
    InternalError(String),
    Timeout,
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) => 400,
            ApiError::Rejected(_) => 400,
            ApiError::GenerationFailed(_) => 502,
            ApiError::InternalError(_) => 500,
            ApiError::Timeout => 504,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, message, code) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::Rejected(e) => ("rejected", e.to_string(), Some(e.error_code())),
            ApiError::GenerationFailed(msg) => ("generation_failed", msg.clone(), None),
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
            ApiError::Timeout => ("timeout", "Request timed out".to_string(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            code: code.map(|c| c.to_string()),
        }
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::InvalidRequest(msg) => ApiError::InvalidRequest(msg),
            e @ (GateError::OutOfBounds(_) | GateError::PixelBudgetExceeded { .. }) => {
                ApiError::Rejected(e)
            }
            GateError::Backend(msg) => ApiError::GenerationFailed(msg),
            GateError::Cancelled => ApiError::Timeout,
            e @ (GateError::Classifier(_) | GateError::Encoding(_)) => {
                ApiError::InternalError(e.to_string())
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::Rejected(e) => write!(f, "Rejected: {}", e),
            ApiError::GenerationFailed(msg) => write!(f, "Generation failed: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Timeout => write!(f, "Request timeout"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}
