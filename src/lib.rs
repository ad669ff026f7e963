// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod diffusion;
pub mod version;

pub use config::MinerConfig;
pub use diffusion::{
    GateError, GenerationInvoker, GenerationRequest, ImageGate, ResourceLimits, SafetyScreen,
    ValidatedRequest,
};
