//! Telemetry upload pipeline for AR sessions.
//!
//! Identity and session bookkeeping, point-cloud and plane batching, and
//! retry-until-delivered HTTP upload. Location, plane and point-cloud data come
//! from host-supplied collaborators; see [`scheduler::Pipeline`].

pub mod ar;
pub mod buffers;
pub mod config;
pub mod identity;
pub mod location;
pub mod models;
pub mod scheduler;
pub mod transport;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};

pub use config::{FlushSchedule, PipelineConfig};
pub use scheduler::{Collaborators, Pipeline};

use ar::NoPlanes;
use config::data_dir;
use identity::JsonFileStore;
use location::FixedLocation;
use transport::HttpTransport;

/// Standalone host: announces a session from this machine and keeps the
/// flush loops running until Ctrl-C. Real AR hosts embed [`Pipeline`] directly
/// with their own providers.
pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    log::info!("mapbuffers starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async {
        let config = PipelineConfig::from_env()?;
        let store = JsonFileStore::new(data_dir()?.join("identity.json"))?;
        let transport = HttpTransport::new(config.request_timeout)?;

        let mut pipeline = Pipeline::new(
            config,
            Collaborators {
                store: Arc::new(store),
                location: Arc::new(FixedLocation::unavailable()),
                planes: Arc::new(NoPlanes),
                transport: Arc::new(transport),
            },
        );

        pipeline.start().await?;
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl-C")?;
        log::info!("Shutdown requested");
        pipeline.stop().await
    })
}
