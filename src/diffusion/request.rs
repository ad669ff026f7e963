// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generation request types: raw caller input and the validated, bounded form

use serde::{Deserialize, Serialize};

use super::image::Image;

/// Seed value meaning "caller did not specify a seed"
pub const UNSPECIFIED_SEED: i64 = -1;

/// Which backend variant a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    TextToImage,
    ImageToImage,
}

/// Sampler parameters forwarded to the backend untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptParams {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub guidance_scale: Option<f32>,
    pub steps: Option<u32>,
    /// Image-to-image denoising strength
    pub strength: Option<f32>,
}

impl PromptParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

/// A caller's generation request, read-only input to the gate
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub params: PromptParams,
    pub height: u32,
    pub width: u32,
    pub num_images: u32,
    /// `UNSPECIFIED_SEED` (-1) asks the server to draw one
    pub seed: i64,
    pub fixed_resolution: bool,
    pub allow_nsfw: bool,
    /// Present for image-to-image, absent for text-to-image
    pub source_image: Option<Image>,
}

impl GenerationRequest {
    /// Text-to-image request with an unspecified seed and screening enabled
    pub fn text_to_image(prompt: impl Into<String>, height: u32, width: u32) -> Self {
        Self {
            params: PromptParams::new(prompt),
            height,
            width,
            num_images: 1,
            seed: UNSPECIFIED_SEED,
            fixed_resolution: false,
            allow_nsfw: false,
            source_image: None,
        }
    }

    pub fn mode(&self) -> GenerationMode {
        match self.source_image {
            Some(_) => GenerationMode::ImageToImage,
            None => GenerationMode::TextToImage,
        }
    }
}

/// A request whose dimensions, image count and pixel budget satisfy the limits.
///
/// Created once per inbound request by the normalizer and owned outright.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub params: PromptParams,
    pub height: u32,
    pub width: u32,
    pub num_images: u32,
    pub seed: u64,
    pub fixed_resolution: bool,
    /// Request flag AND process default
    pub allow_nsfw: bool,
    pub source_image: Option<Image>,
}

impl ValidatedRequest {
    pub fn mode(&self) -> GenerationMode {
        match self.source_image {
            Some(_) => GenerationMode::ImageToImage,
            None => GenerationMode::TextToImage,
        }
    }

    pub fn total_pixels(&self) -> u64 {
        self.height as u64 * self.width as u64 * self.num_images as u64
    }

    /// Size string in the sidecar's `WIDTHxHEIGHT` form
    pub fn size_string(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Images produced by one backend invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResult {
    pub images: Vec<Image>,
}

impl GenerationResult {
    pub fn new(images: Vec<Image>) -> Self {
        Self { images }
    }
}
