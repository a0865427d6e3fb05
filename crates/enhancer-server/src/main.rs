// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// image-enhancer — Runs the enhancement service until Ctrl+C.
//
// Configuration comes from the JSON file named by `ENHANCER_CONFIG` (optional)
// and `ENHANCER_PORT`; log verbosity from `RUST_LOG`.

use enhancer_imaging::Enhancer;
use enhancer_server::{EnhanceServer, settings};

#[tokio::main]
async fn main() {
    // Initialise tracing for structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Image enhancer starting");

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Image enhancer failed");
        std::process::exit(1);
    }
}

async fn run() -> enhancer_core::error::Result<()> {
    let config = settings::from_env()?;
    let mut server = EnhanceServer::new(config, Enhancer::new());
    let addr = server.start().await?;
    tracing::info!(%addr, "Press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;
    server.stop().await
}
