// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for request normalization (image cap, pixel budget, seeds)

use super::mocks::FixedSeedSource;
use image_miner_node::diffusion::seed::SEED_RANGE;
use image_miner_node::diffusion::{
    GateError, GenerationMode, GenerationRequest, Image, RandomSeedSource, RequestNormalizer,
    ResourceLimits,
};
use std::sync::Arc;

fn server_limits() -> ResourceLimits {
    ResourceLimits {
        height_min: Some(512),
        height_max: Some(1024),
        width_min: Some(512),
        width_max: Some(1024),
        max_images: Some(4),
        max_pixels: Some(4_194_304),
    }
}

fn normalizer(limits: ResourceLimits, allow_nsfw: bool) -> RequestNormalizer {
    RequestNormalizer::new(limits, allow_nsfw, Arc::new(FixedSeedSource(777)))
}

#[test]
fn test_image_count_reduced() {
    let mut req = GenerationRequest::text_to_image("a red fox", 512, 512);
    req.num_images = 10;
    let validated = normalizer(server_limits(), false).normalize(&req).unwrap();
    assert_eq!(validated.num_images, 4);
}

#[test]
fn test_image_count_never_increased() {
    let n = normalizer(server_limits(), false);
    for count in 1..=6u32 {
        let mut req = GenerationRequest::text_to_image("a red fox", 512, 512);
        req.num_images = count;
        let validated = n.normalize(&req).unwrap();
        assert!(validated.num_images <= count);
        assert_eq!(validated.num_images, count.min(4));
    }
}

#[test]
fn test_pixel_budget_exceeded_iff_over_limit() {
    // 1024 * 1024 * 4 == 4_194_304 exactly: allowed
    let n = normalizer(server_limits(), false);
    let mut req = GenerationRequest::text_to_image("a red fox", 1024, 1024);
    req.num_images = 4;
    let validated = n.normalize(&req).unwrap();
    assert_eq!(validated.total_pixels(), 4_194_304);

    let tighter = ResourceLimits {
        max_pixels: Some(4_194_303),
        ..server_limits()
    };
    let err = normalizer(tighter, false).normalize(&req).unwrap_err();
    assert_eq!(
        err,
        GateError::PixelBudgetExceeded {
            total: 4_194_304,
            max: 4_194_303
        }
    );
}

#[test]
fn test_pixel_budget_uses_reduced_image_count() {
    // 10 requested, capped to 4; the budget fits 4 but not 10
    let limits = ResourceLimits {
        max_pixels: Some(512 * 512 * 4),
        ..server_limits()
    };
    let mut req = GenerationRequest::text_to_image("a red fox", 512, 512);
    req.num_images = 10;
    let validated = normalizer(limits, false).normalize(&req).unwrap();
    assert_eq!(validated.num_images, 4);
}

#[test]
fn test_pixel_budget_uses_clamped_dimensions() {
    let limits = ResourceLimits {
        max_pixels: Some(512 * 512 - 1),
        ..server_limits()
    };
    let req = GenerationRequest::text_to_image("a red fox", 256, 256);
    let err = normalizer(limits, false).normalize(&req).unwrap_err();
    assert!(matches!(err, GateError::PixelBudgetExceeded { total: 262_144, .. }));
}

#[test]
fn test_dimension_failure_propagates() {
    let mut req = GenerationRequest::text_to_image("a red fox", 256, 256);
    req.fixed_resolution = true;
    let err = normalizer(server_limits(), false).normalize(&req).unwrap_err();
    assert!(matches!(err, GateError::OutOfBounds(_)));
}

#[test]
fn test_unspecified_seed_is_drawn() {
    let req = GenerationRequest::text_to_image("a red fox", 512, 512);
    let validated = normalizer(server_limits(), false).normalize(&req).unwrap();
    assert_eq!(validated.seed, 777);

    let random = RequestNormalizer::new(server_limits(), false, Arc::new(RandomSeedSource::new()));
    let validated = random.normalize(&req).unwrap();
    assert!(validated.seed < SEED_RANGE);
}

#[test]
fn test_explicit_seed_kept() {
    let mut req = GenerationRequest::text_to_image("a red fox", 512, 512);
    req.seed = 0;
    assert_eq!(normalizer(server_limits(), false).normalize(&req).unwrap().seed, 0);
    req.seed = 123_456_789_012;
    assert_eq!(
        normalizer(server_limits(), false).normalize(&req).unwrap().seed,
        123_456_789_012
    );
}

#[test]
fn test_negative_seed_other_than_sentinel_rejected() {
    let mut req = GenerationRequest::text_to_image("a red fox", 512, 512);
    req.seed = -5;
    assert!(matches!(
        normalizer(server_limits(), false).normalize(&req),
        Err(GateError::InvalidRequest(_))
    ));
}

#[test]
fn test_zero_images_rejected() {
    let mut req = GenerationRequest::text_to_image("a red fox", 512, 512);
    req.num_images = 0;
    assert!(matches!(
        normalizer(server_limits(), false).normalize(&req),
        Err(GateError::InvalidRequest(_))
    ));
}

#[test]
fn test_allow_nsfw_requires_request_and_process() {
    let mut req = GenerationRequest::text_to_image("a red fox", 512, 512);

    req.allow_nsfw = true;
    assert!(normalizer(server_limits(), true).normalize(&req).unwrap().allow_nsfw);
    assert!(!normalizer(server_limits(), false).normalize(&req).unwrap().allow_nsfw);

    req.allow_nsfw = false;
    assert!(!normalizer(server_limits(), true).normalize(&req).unwrap().allow_nsfw);
}

#[test]
fn test_source_image_selects_image_to_image() {
    let mut req = GenerationRequest::text_to_image("a red fox", 512, 512);
    req.source_image = Some(Image::solid(16, 16, [1, 2, 3]));
    let validated = normalizer(server_limits(), false).normalize(&req).unwrap();
    assert_eq!(validated.mode(), GenerationMode::ImageToImage);
    assert_eq!(validated.source_image, req.source_image);
}
