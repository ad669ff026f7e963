// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Diffusion sidecar client for image generation via OpenAI-compatible API

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::backend::GenerationInvoker;
use super::error::GateError;
use super::image::Image;
use super::request::{GenerationMode, GenerationResult, ValidatedRequest};
use super::seed::NoiseGenerator;

pub const DEFAULT_STEPS: u32 = 4;
pub const DEFAULT_GUIDANCE_SCALE: f32 = 3.5;
pub const DEFAULT_STRENGTH: f32 = 0.75;

/// Client for calling a diffusion sidecar via OpenAI-compatible API
pub struct DiffusionClient {
    client: Client,
    endpoint: String,
    model_name: String,
}

// --- OpenAI-compatible response types ---

#[derive(Debug, Deserialize)]
pub struct OpenAIImageResponse {
    pub data: Vec<OpenAIImageData>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIImageData {
    pub b64_json: Option<String>,
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIModelList {
    data: Vec<OpenAIModelEntry>,
}

#[derive(Debug, Deserialize)]
struct OpenAIModelEntry {
    id: String,
}

impl DiffusionClient {
    /// Create a new DiffusionClient
    pub fn new(endpoint: &str, model_name: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "Diffusion client configured: endpoint={}, model={}",
            endpoint, model_name
        );

        Ok(Self {
            client,
            endpoint,
            model_name: model_name.to_string(),
        })
    }

    /// Get the model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Build the JSON body for one generation call
    pub fn build_request_body(
        &self,
        request: &ValidatedRequest,
        seed: u64,
    ) -> Result<serde_json::Value, GateError> {
        let params = &request.params;
        let mut body = serde_json::json!({
            "prompt": params.prompt,
            "model": self.model_name,
            "size": request.size_string(),
            "n": request.num_images,
            "response_format": "b64_json",
            "guidance_scale": params.guidance_scale.unwrap_or(DEFAULT_GUIDANCE_SCALE),
            "num_inference_steps": params.steps.unwrap_or(DEFAULT_STEPS),
            "seed": seed,
        });
        if let Some(ref neg) = params.negative_prompt {
            body["negative_prompt"] = serde_json::json!(neg);
        }
        if let Some(ref source) = request.source_image {
            let encoded = source
                .to_png_base64()
                .map_err(|e| GateError::Backend(format!("source image: {}", e)))?;
            body["image"] = serde_json::json!(encoded);
            body["strength"] = serde_json::json!(params.strength.unwrap_or(DEFAULT_STRENGTH));
        }
        Ok(body)
    }

    /// Decode every `b64_json` entry of a sidecar response
    pub fn decode_response(response: OpenAIImageResponse) -> Result<GenerationResult, GateError> {
        let mut images = Vec::with_capacity(response.data.len());
        for (i, entry) in response.data.into_iter().enumerate() {
            let b64 = entry
                .b64_json
                .ok_or_else(|| GateError::Backend(format!("no b64_json in response item {}", i)))?;
            let image = Image::from_base64(&b64)
                .map_err(|e| GateError::Backend(format!("response item {}: {}", i, e)))?;
            images.push(image);
        }
        Ok(GenerationResult::new(images))
    }

    /// List available models from the diffusion sidecar
    pub async fn list_models(&self) -> anyhow::Result<Vec<String>> {
        let url = format!("{}/v1/models", self.endpoint);
        debug!("Diffusion list_models GET {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "diffusion sidecar returned {}: {}",
                status,
                text
            ));
        }

        let model_list: OpenAIModelList = response.json().await?;
        Ok(model_list.data.into_iter().map(|m| m.id).collect())
    }
}

#[async_trait]
impl GenerationInvoker for DiffusionClient {
    async fn generate(
        &self,
        request: &ValidatedRequest,
        generator: &mut NoiseGenerator,
    ) -> Result<GenerationResult, GateError> {
        let seed = generator.next_seed();
        let body = self.build_request_body(request, seed)?;

        let url = format!("{}/v1/images/generations", self.endpoint);
        match request.mode() {
            GenerationMode::TextToImage => debug!("Text to image POST {} seed={}", url, seed),
            GenerationMode::ImageToImage => debug!("Image to image POST {} seed={}", url, seed),
        }

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GateError::Backend(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GateError::Backend(format!(
                "diffusion sidecar returned {}: {}",
                status, text
            )));
        }

        let api_response: OpenAIImageResponse = response
            .json()
            .await
            .map_err(|e| GateError::Backend(format!("invalid response body: {}", e)))?;

        Self::decode_response(api_response)
    }

    fn name(&self) -> &str {
        &self.model_name
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
                debug!("Diffusion health check failed: {}", e);
                false
            }
        }
    }
}
