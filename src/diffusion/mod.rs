// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image generation admission gate with output safety screening

pub mod backend;
pub mod clamp;
pub mod client;
pub mod error;
pub mod gate;
pub mod image;
pub mod limits;
pub mod normalizer;
pub mod output_safety;
pub mod request;
pub mod response;
pub mod retry;
pub mod seed;

pub use backend::GenerationInvoker;
pub use clamp::clamp_dimensions;
pub use client::DiffusionClient;
pub use error::GateError;
pub use gate::ImageGate;
pub use image::Image;
pub use limits::ResourceLimits;
pub use normalizer::RequestNormalizer;
pub use output_safety::{SafetyCheckerClient, SafetyScreen};
pub use request::{
    GenerationMode, GenerationRequest, GenerationResult, PromptParams, ValidatedRequest,
    UNSPECIFIED_SEED,
};
pub use response::{assemble, GenerationResponse, SafetyInfo, SerializedTensor};
pub use retry::{RetryOrchestrator, RunOutcome, MAX_ATTEMPTS};
pub use seed::{NoiseGenerator, RandomSeedSource, SeedSource};
