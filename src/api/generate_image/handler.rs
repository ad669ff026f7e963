// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image generation endpoint handlers

use axum::{extract::State, Json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::request::GenerateImageRequest;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::diffusion::request::GenerationMode;
use crate::diffusion::response::GenerationResponse;

/// Shared pipeline for every generation endpoint:
///
/// 1. Validate the body
/// 2. Convert to a `GenerationRequest` (mode follows the presence of `image`)
/// 3. Run the gate under the server's request timeout
async fn run_generation(
    state: &AppState,
    request: GenerateImageRequest,
    expected_mode: Option<GenerationMode>,
) -> Result<GenerationResponse, ApiError> {
    debug!(
        "Image generation request received: prompt_len={}, {}x{}, n={}",
        request.prompt.len(),
        request.width,
        request.height,
        request.num_images
    );

    if let Err(e) = request.validate() {
        warn!("Image generation validation failed: {}", e);
        return Err(ApiError::InvalidRequest(e));
    }

    let request = request.into_generation_request()?;

    if let Some(expected) = expected_mode {
        if request.mode() != expected {
            let msg = match expected {
                GenerationMode::TextToImage => {
                    "source image not accepted here; use /v1/image-to-image"
                }
                GenerationMode::ImageToImage => "image-to-image requires a source image",
            };
            return Err(ApiError::InvalidRequest(msg.to_string()));
        }
    }

    let cancel = CancellationToken::new();
    let timer = {
        let cancel = cancel.clone();
        let timeout = state.request_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            cancel.cancel();
        })
    };

    let result = state.gate.handle(&request, &cancel).await;
    timer.abort();

    result.map_err(|e| {
        warn!("Image generation failed [{}]: {}", e.error_code(), e);
        ApiError::from(e)
    })
}

/// POST /v1/images/generate - mode chosen by the presence of `image`
pub async fn generate_image_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerateImageRequest>,
) -> Result<Json<GenerationResponse>, ApiError> {
    run_generation(&state, request, None).await.map(Json)
}

/// POST /v1/text-to-image
pub async fn text_to_image_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerateImageRequest>,
) -> Result<Json<GenerationResponse>, ApiError> {
    run_generation(&state, request, Some(GenerationMode::TextToImage))
        .await
        .map(Json)
}

/// POST /v1/image-to-image
pub async fn image_to_image_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerateImageRequest>,
) -> Result<Json<GenerationResponse>, ApiError> {
    run_generation(&state, request, Some(GenerationMode::ImageToImage))
        .await
        .map(Json)
}
