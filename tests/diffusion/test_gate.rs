// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end tests for the admission gate: normalize, run, assemble

use super::mocks::{tagged_batch, FixedSeedSource, ScriptedInvoker, ScriptedScreen};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image_miner_node::diffusion::{
    assemble, GateError, GenerationMode, GenerationRequest, Image, ImageGate, ResourceLimits,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

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

fn gate(invoker: Arc<ScriptedInvoker>, screen: Arc<ScriptedScreen>, allow_nsfw: bool) -> ImageGate {
    ImageGate::new(
        server_limits(),
        allow_nsfw,
        Arc::new(FixedSeedSource(99)),
        invoker,
        screen,
    )
}

#[tokio::test]
async fn test_gate_returns_serialized_survivors() {
    let invoker = Arc::new(ScriptedInvoker::with_batches(vec![
        tagged_batch(&[10, 20, 30]),
        tagged_batch(&[40, 50, 60]),
    ]));
    let screen = Arc::new(ScriptedScreen::with_flags(vec![
        vec![true, false, true],
        vec![false, false, false],
    ]));
    let gate = gate(invoker.clone(), screen, false);

    let mut req = GenerationRequest::text_to_image("a lighthouse in fog", 256, 256);
    req.num_images = 3;

    let response = gate.handle(&req, &CancellationToken::new()).await.unwrap();

    assert_eq!(response.images.len(), 4);
    assert_eq!((response.height, response.width), (512, 512));
    assert_eq!(response.seed, 99);
    assert_eq!(response.mode, GenerationMode::TextToImage);
    assert_eq!(response.safety.attempts, 2);
    assert_eq!(response.safety.flagged, 2);
    assert!(response.safety.screened);

    // First survivor (tag 20) comes first
    let first = STANDARD.decode(&response.images[0].buffer).unwrap();
    assert!(first.iter().all(|&b| b == 20));
    assert_eq!(response.images[0].shape, vec![3, 8, 8]);
}

#[tokio::test]
async fn test_validation_errors_never_reach_backend() {
    let invoker = Arc::new(ScriptedInvoker::with_batches(vec![tagged_batch(&[1])]));
    let screen = Arc::new(ScriptedScreen::unused());
    let gate = gate(invoker.clone(), screen.clone(), false);

    let mut fixed = GenerationRequest::text_to_image("a lighthouse", 256, 256);
    fixed.fixed_resolution = true;
    let err = gate.handle(&fixed, &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, GateError::OutOfBounds(_)));

    let too_tall = GenerationRequest::text_to_image("a lighthouse", 4096, 512);
    let err = gate.handle(&too_tall, &CancellationToken::new()).await.unwrap_err();
    assert!(err.is_validation_error());

    assert_eq!(invoker.calls(), 0);
    assert_eq!(screen.calls(), 0);
}

#[tokio::test]
async fn test_nsfw_needs_process_permission() {
    let invoker = Arc::new(ScriptedInvoker::with_batches(vec![tagged_batch(&[1, 2])]));
    let screen = Arc::new(ScriptedScreen::with_flags(vec![vec![false, false]]));
    let gate = gate(invoker, screen.clone(), false);

    let mut req = GenerationRequest::text_to_image("a lighthouse", 512, 512);
    req.allow_nsfw = true;
    let response = gate.handle(&req, &CancellationToken::new()).await.unwrap();

    assert!(response.safety.screened);
    assert_eq!(screen.calls(), 1);
}

#[tokio::test]
async fn test_nsfw_allowed_skips_screen() {
    let invoker = Arc::new(ScriptedInvoker::with_batches(vec![tagged_batch(&[1, 2])]));
    let screen = Arc::new(ScriptedScreen::unused());
    let gate = gate(invoker, screen.clone(), true);

    let mut req = GenerationRequest::text_to_image("a lighthouse", 512, 512);
    req.allow_nsfw = true;
    req.num_images = 2;
    let response = gate.handle(&req, &CancellationToken::new()).await.unwrap();

    assert_eq!(response.images.len(), 2);
    assert!(!response.safety.screened);
    assert_eq!(screen.calls(), 0);
}

#[tokio::test]
async fn test_encoding_failure_propagates() {
    let broken = Image::new(8, 8, vec![0u8; 10]);
    let invoker = Arc::new(ScriptedInvoker::with_batches(vec![vec![broken]]));
    let screen = Arc::new(ScriptedScreen::with_flags(vec![vec![false]]));
    let gate = gate(invoker, screen, false);

    let req = GenerationRequest::text_to_image("a lighthouse", 512, 512);
    let err = gate.handle(&req, &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, GateError::Encoding(_)));
}

#[test]
fn test_assemble_preserves_order() {
    let images = tagged_batch(&[3, 1, 2]);
    let tensors = assemble(&images).unwrap();
    let firsts: Vec<u8> = tensors
        .iter()
        .map(|t| STANDARD.decode(&t.buffer).unwrap()[0])
        .collect();
    assert_eq!(firsts, vec![3, 1, 2]);
    assert!(assemble(&[]).unwrap().is_empty());
}
