// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::generate_image::{
    generate_image_handler, image_to_image_handler, text_to_image_handler,
};
use crate::diffusion::{ImageGate, ResourceLimits};

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<ImageGate>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(gate: Arc<ImageGate>, request_timeout: Duration) -> Self {
        Self {
            gate,
            request_timeout,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: serde_json::Value,
    pub limits: ResourceLimits,
    pub backend_healthy: bool,
    pub safety_checker_healthy: bool,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Generation endpoints
        .route("/v1/images/generate", post(generate_image_handler))
        .route("/v1/text-to-image", post(text_to_image_handler))
        .route("/v1/image-to-image", post(image_to_image_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let orchestrator = state.gate.orchestrator();
    let backend_healthy = orchestrator.invoker().health_check().await;
    let safety_checker_healthy = orchestrator.screen().health_check().await;

    let status = if backend_healthy && safety_checker_healthy {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: crate::version::get_version_info(),
        limits: *state.gate.limits(),
        backend_healthy,
        safety_checker_healthy,
    })
}
