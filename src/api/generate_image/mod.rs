// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image generation API endpoint module
//!
//! Provides POST /v1/images/generate (mode chosen by the presence of a source
//! image) plus the explicit /v1/text-to-image and /v1/image-to-image routes.

pub mod handler;
pub mod request;

pub use handler::{generate_image_handler, image_to_image_handler, text_to_image_handler};
pub use request::GenerateImageRequest;
