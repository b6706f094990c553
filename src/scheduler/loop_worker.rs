use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    ar::{PlaneAnchor, PlaneAnchorProvider},
    buffers::PointCloudBuffer,
    config::FlushSchedule,
    location::{LocationProvider, LocationSnapshot},
    models::{EnvelopeTemplate, PlaneGeometryBatch, PlaneSnapshot, PointCloudBatch},
    transport::Uploader,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

/// Everything a flush needs to turn samples into an upload.
#[derive(Clone)]
pub(crate) struct FlushContext {
    pub template: EnvelopeTemplate,
    pub uploader: Uploader,
    pub location: Arc<dyn LocationProvider>,
}

impl FlushContext {
    fn enqueue<T: serde::Serialize>(&self, payload: &T) -> Result<usize> {
        let serialized = serde_json::to_string(payload).context("failed to serialize payload")?;
        let len = serialized.len();
        self.uploader.upload(&self.template.endpoint, serialized);
        Ok(len)
    }
}

fn ticker(schedule: FlushSchedule) -> time::Interval {
    let mut ticker = time::interval_at(Instant::now() + schedule.initial_delay, schedule.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

pub(crate) async fn plane_flush_loop(
    ctx: FlushContext,
    planes: Arc<dyn PlaneAnchorProvider>,
    schedule: FlushSchedule,
    cancel_token: CancellationToken,
) {
    let mut ticker = ticker(schedule);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = flush_planes(&ctx, planes.as_ref()) {
                    log_error!("plane flush failed for session {}: {err:?}", ctx.template.session_id);
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("plane flush loop shutting down");
                break;
            }
        }
    }
}

pub(crate) async fn point_cloud_flush_loop(
    ctx: FlushContext,
    buffer: PointCloudBuffer,
    schedule: FlushSchedule,
    cancel_token: CancellationToken,
) {
    let mut ticker = ticker(schedule);
    let mut seq: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match flush_point_cloud(&ctx, &buffer, seq) {
                    Ok(count) => log_debug!("point cloud batch {} flushed with {} points", seq, count),
                    Err(err) => log_error!("point cloud flush failed for session {}: {err:?}", ctx.template.session_id),
                }
                seq += 1;
            }
            _ = cancel_token.cancelled() => {
                log_info!("point cloud flush loop shutting down");
                break;
            }
        }
    }
}

/// Snapshot the current planes and enqueue them. Returns `false` when no
/// planes are tracked and nothing was sent.
pub(crate) fn flush_planes(ctx: &FlushContext, planes: &dyn PlaneAnchorProvider) -> Result<bool> {
    let anchors = planes.current_plane_anchors();
    let Some(batch) = build_plane_batch(&ctx.template, anchors) else {
        log_info!("No planes detected at this time");
        return Ok(false);
    };

    let plane_count = batch.planes.len();
    let bytes = ctx.enqueue(&batch)?;
    log_info!("queued plane batch: {} planes, {} bytes", plane_count, bytes);
    Ok(true)
}

/// `None` when the provider reports no anchors. Anchors without a mesh yet are
/// left out of the batch.
pub(crate) fn build_plane_batch(
    template: &EnvelopeTemplate,
    anchors: Vec<PlaneAnchor>,
) -> Option<PlaneGeometryBatch> {
    if anchors.is_empty() {
        return None;
    }

    let mut batch = PlaneGeometryBatch::new(template);
    for anchor in anchors {
        let Some(geometry) = anchor.geometry else {
            log_debug!("No plane geometry for plane {}", anchor.identifier);
            continue;
        };

        batch.planes.push(PlaneSnapshot {
            plane_id: anchor.identifier,
            position: anchor.center,
            rotation: anchor.world_rotation,
            local_position: anchor.local_position,
            local_rotation: anchor.local_rotation,
            alignment: anchor.alignment,
            boundary_vertices: geometry.boundary_vertices,
            texture_coords: geometry.texture_coordinates,
            triangle_indices: geometry.triangle_indices,
            vertices: geometry.vertices,
        });
    }
    Some(batch)
}

/// Swap the buffer out and enqueue its contents, even when empty. Returns the
/// number of points sent.
pub(crate) fn flush_point_cloud(
    ctx: &FlushContext,
    buffer: &PointCloudBuffer,
    seq: u64,
) -> Result<usize> {
    let points = buffer.take();
    let count = points.len();
    let geo = LocationSnapshot::read(ctx.location.as_ref()).into();

    let batch = PointCloudBatch::new(&ctx.template, seq, points, geo);
    ctx.enqueue(&batch)?;
    Ok(count)
}
