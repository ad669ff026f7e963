// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process-wide miner configuration, loaded once at startup

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::diffusion::limits::ResourceLimits;

fn default_backend_endpoint() -> String {
    "http://127.0.0.1:30000".to_string()
}

fn default_model() -> String {
    "stable-diffusion".to_string()
}

fn default_safety_endpoint() -> String {
    "http://127.0.0.1:30001".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:8091".to_string()
}

fn default_backend_timeout_secs() -> u64 {
    120
}

fn default_safety_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    300
}

/// Miner policy switches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinerSection {
    /// Process default for skipping the safety screen
    #[serde(default)]
    pub allow_nsfw: bool,
    /// Seed for the process-wide seed source; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Diffusion sidecar settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSection {
    #[serde(default = "default_backend_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            endpoint: default_backend_endpoint(),
            model: default_model(),
            timeout_secs: default_backend_timeout_secs(),
        }
    }
}

/// Safety checker sidecar settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetySection {
    #[serde(default = "default_safety_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_safety_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SafetySection {
    fn default() -> Self {
        Self {
            endpoint: default_safety_endpoint(),
            timeout_secs: default_safety_timeout_secs(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Upper bound on one request, generation attempts included
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Full miner configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinerConfig {
    #[serde(default)]
    pub limits: ResourceLimits,
    #[serde(default)]
    pub miner: MinerSection,
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub safety: SafetySection,
    #[serde(default)]
    pub server: ServerSection,
}

impl MinerConfig {
    /// Load configuration from a TOML file. Missing sections use defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config {}: {}", path.display(), e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: MinerConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Check startup preconditions
    pub fn validate(&self) -> Result<()> {
        self.limits.validate().map_err(|e| anyhow!(e))?;
        if self.server.request_timeout_secs == 0 {
            return Err(anyhow!("server.request_timeout_secs must be > 0"));
        }
        Ok(())
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    pub fn safety_timeout(&self) -> Duration {
        Duration::from_secs(self.safety.timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}
