// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Opaque RGB pixel buffer passed between the backend, the safety screen and the response

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ::image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

use super::error::GateError;

/// Number of channels in every pixel buffer (RGB)
pub const CHANNELS: usize = 3;

/// A generated or source image as an interleaved RGB8 buffer (row-major, HWC)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Image {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Image of a single solid colour
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * CHANNELS);
        for _ in 0..count {
            pixels.extend_from_slice(&rgb);
        }
        Self::new(width, height, pixels)
    }

    /// Length the pixel buffer must have for the declared dimensions
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * CHANNELS
    }

    pub fn is_well_formed(&self) -> bool {
        self.pixels.len() == self.expected_len()
    }

    /// Decode PNG (or any format the `image` crate sniffs) bytes
    pub fn from_encoded(bytes: &[u8]) -> Result<Self, GateError> {
        let decoded = ::image::load_from_memory(bytes)
            .map_err(|e| GateError::Encoding(format!("failed to decode image: {}", e)))?
            .to_rgb8();
        let (width, height) = decoded.dimensions();
        Ok(Self::new(width, height, decoded.into_raw()))
    }

    /// Decode a base64 string as returned by the sidecars (`b64_json`)
    pub fn from_base64(data: &str) -> Result<Self, GateError> {
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| GateError::Encoding(format!("invalid base64 image: {}", e)))?;
        Self::from_encoded(&bytes)
    }

    /// Encode as PNG bytes
    pub fn to_png(&self) -> Result<Vec<u8>, GateError> {
        let buffer = RgbImage::from_raw(self.width, self.height, self.pixels.clone()).ok_or_else(
            || {
                GateError::Encoding(format!(
                    "pixel buffer has {} bytes, expected {} for {}x{}",
                    self.pixels.len(),
                    self.expected_len(),
                    self.width,
                    self.height
                ))
            },
        )?;
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(buffer)
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| GateError::Encoding(format!("failed to encode png: {}", e)))?;
        Ok(cursor.into_inner())
    }

    /// Encode as base64 PNG for sidecar requests
    pub fn to_png_base64(&self) -> Result<String, GateError> {
        Ok(STANDARD.encode(self.to_png()?))
    }
}
