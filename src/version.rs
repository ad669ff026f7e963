// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Image Miner Node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-safety-retry-gate";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "text-to-image",
    "image-to-image",
    "aspect-preserving-clamp",
    "pixel-budget",
    "output-safety-screen",
    "single-retry",
];

/// Get version information as a formatted string
pub fn get_version_string() -> String {
    format!("Image Miner Node {}", VERSION)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "features": FEATURES,
    })
}
