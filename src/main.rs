// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use image_miner_node::{
    api::{start_server, AppState},
    cli::Cli,
    diffusion::{DiffusionClient, ImageGate, RandomSeedSource, SafetyCheckerClient, SeedSource},
};
use std::{env, net::SocketAddr, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    info!("{}", image_miner_node::version::get_version_string());
    info!("Resource limits: {:?}", config.limits);

    let seeds: Arc<dyn SeedSource> = match config.miner.seed {
        Some(seed) => Arc::new(RandomSeedSource::with_seed(seed)),
        None => Arc::new(RandomSeedSource::new()),
    };

    let invoker = Arc::new(DiffusionClient::new(
        &config.backend.endpoint,
        &config.backend.model,
        config.backend_timeout(),
    )?);

    let screen = Arc::new(SafetyCheckerClient::new(
        &config.safety.endpoint,
        config.safety_timeout(),
    )?);

    let gate = Arc::new(ImageGate::new(
        config.limits,
        config.miner.allow_nsfw,
        seeds,
        invoker,
        screen,
    ));

    let addr: SocketAddr = config
        .server
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen address '{}'", config.server.listen_addr))?;

    start_server(AppState::new(gate, config.request_timeout()), addr).await?;

    info!("Miner stopped");
    Ok(())
}
