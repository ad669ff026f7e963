// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Aspect-preserving dimension clamping against resource limits
//!
//! Under-minimum dimensions are raised (unless the caller asked for a fixed
//! resolution); over-maximum dimensions are always rejected. When anything
//! moved, one axis is aligned down to a multiple of 8 (up, if down would
//! cross its minimum) and the other is re-derived from the caller's original
//! aspect ratio. The re-derived result must still fit the limits.

use tracing::debug;

use super::error::GateError;
use super::limits::ResourceLimits;

/// Dimension alignment required by the diffusion backends
pub const ALIGNMENT: u32 = 8;

/// Round `value` down to the nearest multiple of `ALIGNMENT`
pub fn align_down(value: u32) -> u32 {
    value - (value % ALIGNMENT)
}

/// Align down, or up when aligning down would fall under `min`
fn align_within(value: u32, min: Option<u32>) -> u32 {
    let down = align_down(value);
    match min {
        Some(min) if down < min && value % ALIGNMENT != 0 => down.saturating_add(ALIGNMENT),
        _ => down,
    }
}

fn clamp_axis(
    axis: &str,
    value: u32,
    min: Option<u32>,
    max: Option<u32>,
    fixed_resolution: bool,
) -> Result<u32, GateError> {
    if let Some(min) = min.filter(|&min| value < min) {
        if fixed_resolution {
            return Err(GateError::OutOfBounds(format!(
                "{} below minimum: {} < {}",
                axis, value, min
            )));
        }
        return Ok(min);
    }
    if let Some(max) = max.filter(|&max| value > max) {
        return Err(GateError::OutOfBounds(format!(
            "{} above maximum: {} > {}",
            axis, value, max
        )));
    }
    Ok(value)
}

/// Clamp `(height, width)` to `limits`, returning the effective `(height, width)`.
///
/// Both inputs must be non-zero; the normalizer rejects zero dimensions
/// before calling this.
pub fn clamp_dimensions(
    height: u32,
    width: u32,
    limits: &ResourceLimits,
    fixed_resolution: bool,
) -> Result<(u32, u32), GateError> {
    if height == 0 || width == 0 {
        return Err(GateError::InvalidRequest(format!(
            "height and width must be > 0, got {}x{}",
            width, height
        )));
    }

    let mut new_height = clamp_axis(
        "height",
        height,
        limits.height_min,
        limits.height_max,
        fixed_resolution,
    )?;
    let mut new_width = clamp_axis(
        "width",
        width,
        limits.width_min,
        limits.width_max,
        fixed_resolution,
    )?;

    if new_height == height && new_width == width {
        return Ok((height, width));
    }

    // Compare new_width/new_height against width/height by cross-multiplying.
    let new_cross = new_width as u64 * height as u64;
    let original_cross = width as u64 * new_height as u64;
    if new_cross != original_cross {
        let ratio = width as f64 / height as f64;
        if new_cross > original_cross {
            new_width = align_within(new_width, limits.width_min);
            new_height = (new_width as f64 / ratio).round() as u32;
        } else {
            new_height = align_within(new_height, limits.height_min);
            new_width = (new_height as f64 * ratio).round() as u32;
        }
        debug!(
            "Re-derived {}x{} from {}x{} to keep aspect ratio {:.4}",
            new_width, new_height, width, height, ratio
        );
    }

    if new_height == 0 || !limits.height_in_bounds(new_height) {
        return Err(GateError::OutOfBounds(format!(
            "height {} cannot keep aspect ratio {}x{} within limits",
            new_height, width, height
        )));
    }
    if new_width == 0 || !limits.width_in_bounds(new_width) {
        return Err(GateError::OutOfBounds(format!(
            "width {} cannot keep aspect ratio {}x{} within limits",
            new_width, width, height
        )));
    }

    Ok((new_height, new_width))
}
