// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Output safety screening for generated images

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::error::GateError;
use super::image::Image;

/// Batch classifier for generated images.
///
/// Returns one flag per input image, in input order; `true` means the image
/// contains disallowed content.
#[async_trait]
pub trait SafetyScreen: Send + Sync {
    async fn classify(&self, images: &[Image]) -> Result<Vec<bool>, GateError>;

    /// Check if the classifier is reachable
    async fn health_check(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
struct SafetyCheckRequest<'a> {
    images: &'a [String],
}

/// Reply from the safety checker sidecar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyCheckResponse {
    pub has_nsfw_concept: Vec<bool>,
}

/// Client for a safety checker sidecar (`POST /v1/safety/check`).
pub struct SafetyCheckerClient {
    client: Client,
    endpoint: String,
}

impl SafetyCheckerClient {
    pub fn new(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!("Safety checker configured: endpoint={}", endpoint);
        Ok(Self { client, endpoint })
    }

    /// Parse the checker reply. Anything malformed, or a flag count that
    /// doesn't match the batch, is an error.
    pub fn parse_checker_response(body: &str, expected: usize) -> Result<Vec<bool>, GateError> {
        let parsed: SafetyCheckResponse = serde_json::from_str(body)
            .map_err(|e| GateError::Classifier(format!("malformed checker response: {}", e)))?;
        if parsed.has_nsfw_concept.len() != expected {
            return Err(GateError::Classifier(format!(
                "checker returned {} flags for {} images",
                parsed.has_nsfw_concept.len(),
                expected
            )));
        }
        Ok(parsed.has_nsfw_concept)
    }
}

#[async_trait]
impl SafetyScreen for SafetyCheckerClient {
    async fn classify(&self, images: &[Image]) -> Result<Vec<bool>, GateError> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let encoded = images
            .iter()
            .map(|img| img.to_png_base64())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| GateError::Classifier(e.to_string()))?;

        let url = format!("{}/v1/safety/check", self.endpoint);
        debug!("Safety check POST {} ({} images)", url, images.len());

        let response = self
            .client
            .post(&url)
            .json(&SafetyCheckRequest { images: &encoded })
            .send()
            .await
            .map_err(|e| GateError::Classifier(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GateError::Classifier(format!(
                "safety checker returned {}: {}",
                status, text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GateError::Classifier(format!("failed to read response: {}", e)))?;
        Self::parse_checker_response(&body, images.len())
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.endpoint))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Safety checker health check failed: {}", e);
                false
            }
        }
    }
}
