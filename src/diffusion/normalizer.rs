// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request normalization: dimension clamp, image-count cap, pixel budget and seed resolution

use std::sync::Arc;
use tracing::{debug, warn};

use super::clamp::clamp_dimensions;
use super::error::GateError;
use super::limits::ResourceLimits;
use super::request::{GenerationRequest, ValidatedRequest, UNSPECIFIED_SEED};
use super::seed::SeedSource;

/// Turns caller requests into `ValidatedRequest`s bounded by the server limits.
pub struct RequestNormalizer {
    limits: ResourceLimits,
    allow_nsfw: bool,
    seeds: Arc<dyn SeedSource>,
}

impl RequestNormalizer {
    /// `allow_nsfw` is the process default; a request may only skip
    /// screening when both it and the process allow NSFW output.
    pub fn new(limits: ResourceLimits, allow_nsfw: bool, seeds: Arc<dyn SeedSource>) -> Self {
        Self {
            limits,
            allow_nsfw,
            seeds,
        }
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    pub fn normalize(&self, req: &GenerationRequest) -> Result<ValidatedRequest, GateError> {
        if req.num_images == 0 {
            return Err(GateError::InvalidRequest(
                "num_images must be at least 1".to_string(),
            ));
        }

        let (height, width) = clamp_dimensions(
            req.height,
            req.width,
            &self.limits,
            req.fixed_resolution,
        )?;

        let mut num_images = req.num_images;
        if let Some(max_images) = self.limits.max_images {
            if num_images > max_images {
                warn!(
                    "num_images ({}) exceeds max_images ({}), reducing",
                    num_images, max_images
                );
                num_images = max_images;
            }
        }

        let total = height as u64 * width as u64 * num_images as u64;
        if let Some(max) = self.limits.max_pixels {
            if total > max {
                return Err(GateError::PixelBudgetExceeded { total, max });
            }
        }

        let seed = match req.seed {
            UNSPECIFIED_SEED => self.seeds.next_seed(),
            s if s >= 0 => s as u64,
            s => {
                return Err(GateError::InvalidRequest(format!(
                    "seed must be non-negative or -1, got {}",
                    s
                )))
            }
        };

        debug!(
            "Normalized request: {}x{} -> {}x{}, images {} -> {}, seed {}",
            req.width, req.height, width, height, req.num_images, num_images, seed
        );

        Ok(ValidatedRequest {
            params: req.params.clone(),
            height,
            width,
            num_images,
            seed,
            fixed_resolution: req.fixed_resolution,
            allow_nsfw: req.allow_nsfw && self.allow_nsfw,
            source_image: req.source_image.clone(),
        })
    }
}
