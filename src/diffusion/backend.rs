// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generation backend trait

use async_trait::async_trait;

use super::error::GateError;
use super::request::{GenerationResult, ValidatedRequest};
use super::seed::NoiseGenerator;

/// Opaque call into a diffusion model backend.
///
/// Implementations draw exactly one seed from `generator` per call and must
/// be deterministic for a given drawn seed and request. The request's mode
/// (text-to-image or image-to-image) selects the backend variant.
#[async_trait]
pub trait GenerationInvoker: Send + Sync {
    /// Generate up to `request.num_images` images
    async fn generate(
        &self,
        request: &ValidatedRequest,
        generator: &mut NoiseGenerator,
    ) -> Result<GenerationResult, GateError>;

    /// Get the backend name for logging
    fn name(&self) -> &str;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool {
        true
    }
}
