// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server-declared resource limits for image generation requests

use serde::{Deserialize, Serialize};

/// Immutable bounds applied to every generation request.
///
/// Every bound is optional; `None` means unconstrained on that axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default)]
    pub height_min: Option<u32>,
    #[serde(default)]
    pub height_max: Option<u32>,
    #[serde(default)]
    pub width_min: Option<u32>,
    #[serde(default)]
    pub width_max: Option<u32>,
    #[serde(default)]
    pub max_images: Option<u32>,
    #[serde(default)]
    pub max_pixels: Option<u64>,
}

impl ResourceLimits {
    /// Limits with no bounds at all
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Check the configuration precondition `min <= max` on both axes.
    ///
    /// Runs once at startup; requests are never checked against it.
    pub fn validate(&self) -> Result<(), String> {
        if let (Some(min), Some(max)) = (self.height_min, self.height_max) {
            if min > max {
                return Err(format!(
                    "height_min ({}) must be <= height_max ({})",
                    min, max
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.width_min, self.width_max) {
            if min > max {
                return Err(format!("width_min ({}) must be <= width_max ({})", min, max));
            }
        }
        Ok(())
    }

    /// Whether a height satisfies both height bounds
    pub fn height_in_bounds(&self, height: u32) -> bool {
        self.height_min.map_or(true, |min| height >= min)
            && self.height_max.map_or(true, |max| height <= max)
    }

    /// Whether a width satisfies both width bounds
    pub fn width_in_bounds(&self, width: u32) -> bool {
        self.width_min.map_or(true, |min| width >= min)
            && self.width_max.map_or(true, |max| width <= max)
    }
}
