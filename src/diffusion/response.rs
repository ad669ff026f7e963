// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Response assembly: accepted images to channel-first uint8 tensors

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::error::GateError;
use super::image::{Image, CHANNELS};
use super::request::GenerationMode;

/// dtype tag carried by every serialized image tensor
pub const TENSOR_DTYPE: &str = "torch.uint8";

/// Wire form of one image: base64 buffer of a `[3, height, width]` uint8 tensor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedTensor {
    pub buffer: String,
    pub dtype: String,
    pub shape: Vec<usize>,
}

impl SerializedTensor {
    /// Serialize an interleaved RGB image as a channel-first tensor
    pub fn from_image(image: &Image) -> Result<Self, GateError> {
        if !image.is_well_formed() {
            return Err(GateError::Encoding(format!(
                "pixel buffer has {} bytes, expected {} for {}x{}",
                image.pixels.len(),
                image.expected_len(),
                image.width,
                image.height
            )));
        }

        let plane = image.width as usize * image.height as usize;
        let mut chw = vec![0u8; plane * CHANNELS];
        for (i, pixel) in image.pixels.chunks_exact(CHANNELS).enumerate() {
            for (c, &value) in pixel.iter().enumerate() {
                chw[c * plane + i] = value;
            }
        }

        Ok(Self {
            buffer: STANDARD.encode(&chw),
            dtype: TENSOR_DTYPE.to_string(),
            shape: vec![CHANNELS, image.height as usize, image.width as usize],
        })
    }

    /// Inverse of `from_image`, used for incoming source images
    pub fn to_image(&self) -> Result<Image, GateError> {
        if self.dtype != TENSOR_DTYPE {
            return Err(GateError::InvalidRequest(format!(
                "unsupported tensor dtype '{}'; expected {}",
                self.dtype, TENSOR_DTYPE
            )));
        }
        let (height, width) = match self.shape.as_slice() {
            [c, h, w] if *c == CHANNELS && *h > 0 && *w > 0 => (*h, *w),
            other => {
                return Err(GateError::InvalidRequest(format!(
                    "tensor shape must be [3, height, width], got {:?}",
                    other
                )))
            }
        };
        let (Ok(height_px), Ok(width_px)) = (u32::try_from(height), u32::try_from(width)) else {
            return Err(GateError::InvalidRequest(format!(
                "tensor dimensions {}x{} exceed u32",
                width, height
            )));
        };
        let Some(needed) = height
            .checked_mul(width)
            .and_then(|p| p.checked_mul(CHANNELS))
        else {
            return Err(GateError::InvalidRequest(format!(
                "tensor shape {:?} is too large",
                self.shape
            )));
        };
        let plane = needed / CHANNELS;
        let chw = STANDARD
            .decode(self.buffer.as_bytes())
            .map_err(|e| GateError::InvalidRequest(format!("invalid tensor buffer: {}", e)))?;
        if chw.len() != needed {
            return Err(GateError::InvalidRequest(format!(
                "tensor buffer has {} bytes, shape needs {}",
                chw.len(),
                needed
            )));
        }

        let mut pixels = Vec::with_capacity(chw.len());
        for i in 0..plane {
            for c in 0..CHANNELS {
                pixels.push(chw[c * plane + i]);
            }
        }
        Ok(Image::new(width_px, height_px, pixels))
    }
}

/// Serialize every accepted image, in order. Encoding failures propagate.
pub fn assemble(images: &[Image]) -> Result<Vec<SerializedTensor>, GateError> {
    images.iter().map(SerializedTensor::from_image).collect()
}

/// Final response for one generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub images: Vec<SerializedTensor>,
    pub mode: GenerationMode,
    pub height: u32,
    pub width: u32,
    pub num_images: u32,
    pub seed: u64,
    pub safety: SafetyInfo,
}

/// Safety screening summary included in responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyInfo {
    /// Whether the safety screen ran at all
    pub screened: bool,
    /// Images rejected across all attempts
    pub flagged: usize,
    /// Backend invocations performed
    pub attempts: u32,
}
