// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Command-line interface for the image miner node
//!
//! Precedence: CLI flag > environment variable > config file > built-in default.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::config::MinerConfig;

/// Image Miner Node
#[derive(Parser, Debug, Default)]
#[command(name = "image-miner-node")]
#[command(version)]
#[command(about = "Image generation miner with request admission and output safety", long_about = None)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "MINER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address the HTTP server listens on
    #[arg(long, env = "MINER_LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Allow NSFW output for requests that ask for it (true/false)
    #[arg(long, env = "MINER_ALLOW_NSFW")]
    pub allow_nsfw: Option<bool>,

    /// Seed for the process-wide seed source
    #[arg(long, env = "MINER_SEED")]
    pub seed: Option<u64>,

    #[arg(long, env = "MINER_HEIGHT_MIN")]
    pub height_min: Option<u32>,

    #[arg(long, env = "MINER_HEIGHT_MAX")]
    pub height_max: Option<u32>,

    #[arg(long, env = "MINER_WIDTH_MIN")]
    pub width_min: Option<u32>,

    #[arg(long, env = "MINER_WIDTH_MAX")]
    pub width_max: Option<u32>,

    /// Maximum images per request
    #[arg(long, env = "MINER_MAX_IMAGES")]
    pub max_images: Option<u32>,

    /// Maximum height * width * images per request
    #[arg(long, env = "MINER_MAX_PIXELS")]
    pub max_pixels: Option<u64>,

    /// Diffusion sidecar base URL
    #[arg(long, env = "DIFFUSION_ENDPOINT")]
    pub diffusion_endpoint: Option<String>,

    /// Diffusion model name
    #[arg(long, env = "DIFFUSION_MODEL")]
    pub model: Option<String>,

    /// Safety checker sidecar base URL
    #[arg(long, env = "SAFETY_CHECKER_ENDPOINT")]
    pub safety_endpoint: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "MINER_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,
}

impl Cli {
    /// Apply every flag that was set on top of `config`
    pub fn apply_overrides(&self, config: &mut MinerConfig) {
        if let Some(ref addr) = self.listen_addr {
            config.server.listen_addr = addr.clone();
        }
        if let Some(allow) = self.allow_nsfw {
            config.miner.allow_nsfw = allow;
        }
        if let Some(seed) = self.seed {
            config.miner.seed = Some(seed);
        }
        if self.height_min.is_some() {
            config.limits.height_min = self.height_min;
        }
        if self.height_max.is_some() {
            config.limits.height_max = self.height_max;
        }
        if self.width_min.is_some() {
            config.limits.width_min = self.width_min;
        }
        if self.width_max.is_some() {
            config.limits.width_max = self.width_max;
        }
        if self.max_images.is_some() {
            config.limits.max_images = self.max_images;
        }
        if self.max_pixels.is_some() {
            config.limits.max_pixels = self.max_pixels;
        }
        if let Some(ref endpoint) = self.diffusion_endpoint {
            config.backend.endpoint = endpoint.clone();
        }
        if let Some(ref model) = self.model {
            config.backend.model = model.clone();
        }
        if let Some(ref endpoint) = self.safety_endpoint {
            config.safety.endpoint = endpoint.clone();
        }
        if let Some(secs) = self.request_timeout_secs {
            config.server.request_timeout_secs = secs;
        }
    }

    /// Load the config file (if any), apply overrides and validate
    pub fn load_config(&self) -> Result<MinerConfig> {
        let mut config = match self.config {
            Some(ref path) => MinerConfig::from_file(path)?,
            None => MinerConfig::default(),
        };
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }
}
