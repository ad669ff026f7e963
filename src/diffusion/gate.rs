// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-request pipeline: normalize, generate with screening, assemble

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::backend::GenerationInvoker;
use super::error::GateError;
use super::limits::ResourceLimits;
use super::normalizer::RequestNormalizer;
use super::output_safety::SafetyScreen;
use super::request::GenerationRequest;
use super::response::{assemble, GenerationResponse, SafetyInfo};
use super::retry::RetryOrchestrator;
use super::seed::SeedSource;

/// Admission and output-safety gate shared by every request handler.
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct ImageGate {
    normalizer: RequestNormalizer,
    orchestrator: RetryOrchestrator,
}

impl ImageGate {
    pub fn new(
        limits: ResourceLimits,
        allow_nsfw: bool,
        seeds: Arc<dyn SeedSource>,
        invoker: Arc<dyn GenerationInvoker>,
        screen: Arc<dyn SafetyScreen>,
    ) -> Self {
        if allow_nsfw {
            warn!("NSFW is enabled. Without a filter, this node may return unwanted images.");
        }
        Self {
            normalizer: RequestNormalizer::new(limits, allow_nsfw, seeds),
            orchestrator: RetryOrchestrator::new(invoker, screen),
        }
    }

    pub fn limits(&self) -> &ResourceLimits {
        self.normalizer.limits()
    }

    pub fn normalizer(&self) -> &RequestNormalizer {
        &self.normalizer
    }

    pub fn orchestrator(&self) -> &RetryOrchestrator {
        &self.orchestrator
    }

    /// Handle one request end to end.
    ///
    /// Validation errors return before the backend is touched.
    pub async fn handle(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResponse, GateError> {
        let validated = self.normalizer.normalize(request)?;
        let outcome = self.orchestrator.run(&validated, cancel).await?;
        let images = assemble(&outcome.images)?;

        info!(
            "Generated {} images ({:?}, {}x{}, seed={}, attempts={}, flagged={})",
            images.len(),
            validated.mode(),
            validated.width,
            validated.height,
            validated.seed,
            outcome.attempts,
            outcome.flagged
        );

        Ok(GenerationResponse {
            images,
            mode: validated.mode(),
            height: validated.height,
            width: validated.width,
            num_images: validated.num_images,
            seed: validated.seed,
            safety: SafetyInfo {
                screened: !outcome.screening_skipped,
                flagged: outcome.flagged,
                attempts: outcome.attempts,
            },
        })
    }
}
