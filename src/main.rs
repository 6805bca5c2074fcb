//! # Wristmap Bridge Entry Point
//!
//! Wires the pieces together: load configuration, build the HTTP tile
//! source and the shared server state, then run the device-facing loopback
//! server until interrupted. All the interesting logic lives in the
//! library; this binary owns only lifecycle.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use wristmap_lib::colour::ColourPalette;
use wristmap_lib::config::Config;
use wristmap_lib::pipeline::HttpTileSource;
use wristmap_lib::server::{self, AppState};

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::load();

    // An unknown palette id is a config mistake, not a reason to refuse
    // to serve tiles; fall back to the device default.
    let palette = ColourPalette::builtin(config.tiles.palette_id).unwrap_or_else(|| {
        warn!(
            palette_id = config.tiles.palette_id,
            "unknown palette id in config, using device default"
        );
        ColourPalette::device64()
    });

    let source = HttpTileSource::new(
        config.tiles.source_url.clone(),
        config.tiles.auth_token.clone(),
        Duration::from_secs(config.tiles.fetch_timeout_secs),
    )
    .context("build tile fetcher")?;

    let state = Arc::new(AppState {
        source,
        encoding: config.tiles.encoding,
        palette,
    });

    // Create Tokio runtime for the server and tile fetches
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let shutdown = async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                warn!(%error, "ctrl-c handler failed, shutting down");
            }
        };
        server::serve(state, config.server.port, shutdown).await
    })
    .context("device tile server")?;

    Ok(())
}
