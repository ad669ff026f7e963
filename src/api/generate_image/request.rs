// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image generation request types and validation

use serde::{Deserialize, Serialize};

use crate::diffusion::request::{GenerationRequest, PromptParams, UNSPECIFIED_SEED};
use crate::diffusion::response::SerializedTensor;
use crate::diffusion::GateError;

fn default_dimension() -> u32 {
    512
}

fn default_num_images() -> u32 {
    1
}

fn default_seed() -> i64 {
    UNSPECIFIED_SEED
}

/// Request body for the generation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    /// Text prompt describing the desired image
    pub prompt: String,

    /// Negative prompt to guide away from
    #[serde(default)]
    pub negative_prompt: Option<String>,

    /// Classifier-free guidance scale
    #[serde(default)]
    pub guidance_scale: Option<f32>,

    /// Number of inference steps
    #[serde(default)]
    pub steps: Option<u32>,

    /// Image-to-image denoising strength
    #[serde(default)]
    pub strength: Option<f32>,

    #[serde(default = "default_dimension")]
    pub height: u32,

    #[serde(default = "default_dimension")]
    pub width: u32,

    #[serde(default = "default_num_images", alias = "numImagesPerPrompt")]
    pub num_images: u32,

    /// -1 lets the server pick
    #[serde(default = "default_seed")]
    pub seed: i64,

    /// Reject under-minimum dimensions instead of raising them
    #[serde(default)]
    pub fixed_resolution: bool,

    #[serde(default)]
    pub allow_nsfw: bool,

    /// Source image for image-to-image
    #[serde(default)]
    pub image: Option<SerializedTensor>,
}

impl GenerateImageRequest {
    /// Validate the image generation request
    pub fn validate(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err("prompt must not be empty".to_string());
        }

        if let Some(steps) = self.steps {
            if steps == 0 || steps > 100 {
                return Err(format!("steps must be between 1 and 100, got {}", steps));
            }
        }

        if let Some(strength) = self.strength {
            if !(0.0..=1.0).contains(&strength) {
                return Err(format!("strength must be between 0 and 1, got {}", strength));
            }
        }

        Ok(())
    }

    /// Convert into the gate's request type, decoding the source tensor if present
    pub fn into_generation_request(self) -> Result<GenerationRequest, GateError> {
        let source_image = match self.image {
            Some(ref tensor) => Some(tensor.to_image()?),
            None => None,
        };

        Ok(GenerationRequest {
            params: PromptParams {
                prompt: self.prompt,
                negative_prompt: self.negative_prompt,
                guidance_scale: self.guidance_scale,
                steps: self.steps,
                strength: self.strength,
            },
            height: self.height,
            width: self.width,
            num_images: self.num_images,
            seed: self.seed,
            fixed_resolution: self.fixed_resolution,
            allow_nsfw: self.allow_nsfw,
            source_image,
        })
    }
}
