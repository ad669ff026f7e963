// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Scripted backend, safety screen and seed source for gate tests

use async_trait::async_trait;
use image_miner_node::diffusion::{
    GateError, GenerationInvoker, GenerationResult, Image, NoiseGenerator, SafetyScreen,
    SeedSource, ValidatedRequest,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Small distinguishable image: 8x8 of one grey level
pub fn tagged_image(tag: u8) -> Image {
    Image::solid(8, 8, [tag, tag, tag])
}

pub fn tagged_batch(tags: &[u8]) -> Vec<Image> {
    tags.iter().map(|&t| tagged_image(t)).collect()
}

/// Backend that replays a fixed script of results, one per call
pub struct ScriptedInvoker {
    script: Mutex<VecDeque<Result<Vec<Image>, GateError>>>,
    calls: AtomicUsize,
    seeds: Mutex<Vec<u64>>,
}

impl ScriptedInvoker {
    pub fn new(script: Vec<Result<Vec<Image>, GateError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            seeds: Mutex::new(Vec::new()),
        }
    }

    /// Backend whose every call returns `batches[i]`
    pub fn with_batches(batches: Vec<Vec<Image>>) -> Self {
        Self::new(batches.into_iter().map(Ok).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Seeds drawn from the noise generator, one per call
    pub fn seeds(&self) -> Vec<u64> {
        self.seeds.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationInvoker for ScriptedInvoker {
    async fn generate(
        &self,
        _request: &ValidatedRequest,
        generator: &mut NoiseGenerator,
    ) -> Result<GenerationResult, GateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seeds.lock().unwrap().push(generator.next_seed());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result.map(GenerationResult::new),
            None => Err(GateError::Backend("script exhausted".to_string())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Backend that never completes; used for cancellation tests
pub struct PendingInvoker {
    calls: AtomicUsize,
}

impl PendingInvoker {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationInvoker for PendingInvoker {
    async fn generate(
        &self,
        _request: &ValidatedRequest,
        _generator: &mut NoiseGenerator,
    ) -> Result<GenerationResult, GateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    fn name(&self) -> &str {
        "pending"
    }
}

/// Safety screen that replays a fixed script of verdicts, one per call
pub struct ScriptedScreen {
    script: Mutex<VecDeque<Result<Vec<bool>, GateError>>>,
    calls: AtomicUsize,
}

impl ScriptedScreen {
    pub fn new(script: Vec<Result<Vec<bool>, GateError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_flags(flags: Vec<Vec<bool>>) -> Self {
        Self::new(flags.into_iter().map(Ok).collect())
    }

    /// Screen that must never be called
    pub fn unused() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SafetyScreen for ScriptedScreen {
    async fn classify(&self, images: &[Image]) -> Result<Vec<bool>, GateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            // Unscripted calls pass everything
            None => Ok(vec![false; images.len()]),
        }
    }
}

/// Seed source that always returns the same value
pub struct FixedSeedSource(pub u64);

impl SeedSource for FixedSeedSource {
    fn next_seed(&self) -> u64 {
        self.0
    }
}
