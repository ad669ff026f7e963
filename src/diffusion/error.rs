// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the image generation gate
//!
//! Validation errors (`InvalidRequest`, `OutOfBounds`, `PixelBudgetExceeded`)
//! are raised before any backend call. `Classifier` never leaves the retry
//! orchestrator: a failed classification is treated as "all flagged".

use thiserror::Error;

/// Errors raised while admitting, generating or assembling an image request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Request is malformed (zero dimensions, zero images, bad seed, bad source tensor)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A hard dimension bound was violated
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    /// height * width * num_images exceeds the configured pixel budget
    #[error("Pixel budget exceeded: {total} pixels requested, limit is {max}")]
    PixelBudgetExceeded { total: u64, max: u64 },

    /// Generation backend failed
    #[error("Generation backend error: {0}")]
    Backend(String),

    /// Safety classifier failed
    #[error("Safety classifier error: {0}")]
    Classifier(String),

    /// Accepted images could not be serialized
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Request was cancelled before completion
    #[error("Request cancelled")]
    Cancelled,
}

impl GateError {
    /// Get error code for logging and API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            GateError::InvalidRequest(_) => "INVALID_REQUEST",
            GateError::OutOfBounds(_) => "OUT_OF_BOUNDS",
            GateError::PixelBudgetExceeded { .. } => "PIXEL_BUDGET_EXCEEDED",
            GateError::Backend(_) => "BACKEND_ERROR",
            GateError::Classifier(_) => "CLASSIFIER_ERROR",
            GateError::Encoding(_) => "ENCODING_ERROR",
            GateError::Cancelled => "CANCELLED",
        }
    }

    /// True for errors that reject the request before any generation work
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            GateError::InvalidRequest(_)
                | GateError::OutOfBounds(_)
                | GateError::PixelBudgetExceeded { .. }
        )
    }
}
