// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generate, screen, and retry once when outputs are flagged
//!
//! State machine:
//! 1. Attempt 1: generate, then screen unless NSFW is allowed.
//! 2. Nothing flagged (or NSFW allowed): done.
//! 3. Attempt 2 with the same validated request and the same noise stream,
//!    screened the same way. Survivors of both attempts are concatenated,
//!    attempt-1 survivors first. There is never an attempt 3.
//!
//! A classifier failure counts as every image flagged. An empty final set is
//! a successful, degraded result.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backend::GenerationInvoker;
use super::error::GateError;
use super::image::Image;
use super::output_safety::SafetyScreen;
use super::request::{GenerationResult, ValidatedRequest};
use super::seed::NoiseGenerator;

/// Maximum backend invocations per request
pub const MAX_ATTEMPTS: u32 = 2;

/// Images accepted for a request plus what it took to get them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutcome {
    pub images: Vec<Image>,
    /// Backend invocations performed (1 or 2)
    pub attempts: u32,
    /// Images rejected across all attempts
    pub flagged: usize,
    /// Whether screening was skipped because NSFW output is allowed
    pub screening_skipped: bool,
}

/// Runs the generation backend and safety screen with one bounded retry.
pub struct RetryOrchestrator {
    invoker: Arc<dyn GenerationInvoker>,
    screen: Arc<dyn SafetyScreen>,
}

fn keep_unflagged(images: Vec<Image>, flags: &[bool]) -> Vec<Image> {
    images
        .into_iter()
        .zip(flags.iter())
        .filter(|(_, flagged)| !**flagged)
        .map(|(image, _)| image)
        .collect()
}

impl RetryOrchestrator {
    pub fn new(invoker: Arc<dyn GenerationInvoker>, screen: Arc<dyn SafetyScreen>) -> Self {
        Self { invoker, screen }
    }

    pub fn invoker(&self) -> &Arc<dyn GenerationInvoker> {
        &self.invoker
    }

    pub fn screen(&self) -> &Arc<dyn SafetyScreen> {
        &self.screen
    }

    async fn invoke(
        &self,
        request: &ValidatedRequest,
        generator: &mut NoiseGenerator,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult, GateError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GateError::Cancelled),
            result = self.invoker.generate(request, generator) => result,
        }
    }

    /// Classify `images`, failing closed on classifier errors.
    async fn screen_images(
        &self,
        images: &[Image],
        cancel: &CancellationToken,
    ) -> Result<Vec<bool>, GateError> {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GateError::Cancelled),
            outcome = self.screen.classify(images) => outcome,
        };

        match outcome {
            Ok(flags) if flags.len() == images.len() => Ok(flags),
            Ok(flags) => {
                warn!(
                    "Safety screen returned {} flags for {} images; treating all as flagged",
                    flags.len(),
                    images.len()
                );
                Ok(vec![true; images.len()])
            }
            Err(e) => {
                warn!("Safety screen failed ({}); treating all images as flagged", e);
                Ok(vec![true; images.len()])
            }
        }
    }

    /// Run the generation/screening state machine for one request.
    ///
    /// Fails only with `Backend` or `Cancelled`.
    pub async fn run(
        &self,
        request: &ValidatedRequest,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, GateError> {
        let mut generator = NoiseGenerator::new(request.seed);

        let first = self.invoke(request, &mut generator, cancel).await?;
        debug!(
            "Attempt 1 produced {} images via {}",
            first.images.len(),
            self.invoker.name()
        );

        if request.allow_nsfw {
            return Ok(RunOutcome {
                images: first.images,
                attempts: 1,
                flagged: 0,
                screening_skipped: true,
            });
        }

        let flags = self.screen_images(&first.images, cancel).await?;
        let produced = first.images.len();
        let mut kept = keep_unflagged(first.images, &flags);
        let mut flagged = produced - kept.len();

        if flagged == 0 {
            return Ok(RunOutcome {
                images: kept,
                attempts: 1,
                flagged: 0,
                screening_skipped: false,
            });
        }

        if cancel.is_cancelled() {
            return Err(GateError::Cancelled);
        }

        info!(
            "{} of {} images flagged on attempt 1; regenerating once",
            flagged, produced
        );

        let second = self.invoke(request, &mut generator, cancel).await?;
        let flags = self.screen_images(&second.images, cancel).await?;
        let produced = second.images.len();
        let survivors = keep_unflagged(second.images, &flags);
        flagged += produced - survivors.len();
        kept.extend(survivors);

        if kept.is_empty() {
            warn!("All images were flagged, returning empty list");
        }

        Ok(RunOutcome {
            images: kept,
            attempts: MAX_ATTEMPTS,
            flagged,
            screening_skipped: false,
        })
    }
}
