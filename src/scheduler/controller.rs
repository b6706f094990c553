use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::{error, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    ar::PlaneAnchorProvider,
    buffers::{PointCloudBuffer, PointCloudSink},
    config::PipelineConfig,
    identity::{get_or_create_client_id, KeyValueStore, Session},
    location::{acquire_fix, LocationProvider},
    models::{DeviceInfo, EnvelopeTemplate, SessionStartPayload},
    transport::{Transport, Uploader},
};

use super::loop_worker::{plane_flush_loop, point_cloud_flush_loop, FlushContext};

/// External pieces the pipeline reads from and writes to.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn KeyValueStore>,
    pub location: Arc<dyn LocationProvider>,
    pub planes: Arc<dyn PlaneAnchorProvider>,
    pub transport: Arc<dyn Transport>,
}

struct ActiveSession {
    session: Session,
    uploader: Uploader,
    cancel_token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

/// Owns one telemetry session: announces it, runs the flush loops and tears
/// everything down again, including uploads still retrying.
pub struct Pipeline {
    config: PipelineConfig,
    collaborators: Collaborators,
    device: DeviceInfo,
    point_cloud: Option<PointCloudBuffer>,
    active: Option<ActiveSession>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, collaborators: Collaborators) -> Self {
        let point_cloud = config.capture_point_cloud.then(PointCloudBuffer::new);
        Self {
            config,
            collaborators,
            device: DeviceInfo::detect(),
            point_cloud,
            active: None,
        }
    }

    pub fn with_device(mut self, device: DeviceInfo) -> Self {
        self.device = device;
        self
    }

    /// Handle for the AR frame callback. `None` when point-cloud capture is off.
    pub fn point_cloud_sink(&self) -> Option<PointCloudSink> {
        self.point_cloud.clone().map(PointCloudSink::new)
    }

    pub fn session(&self) -> Option<&Session> {
        self.active.as_ref().map(|active| &active.session)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Resolve identity, wait for a location fix, announce the session and
    /// start the flush loops. Fails only when identity cannot be established
    /// or the configuration is unusable.
    pub async fn start(&mut self) -> Result<Session> {
        if self.active.is_some() {
            bail!("telemetry pipeline already active");
        }
        self.config.validate()?;

        let identity = get_or_create_client_id(self.collaborators.store.as_ref())
            .context("cannot start telemetry without a client id")?;
        let session = Session::begin(identity);
        info!(
            "Starting telemetry session {} for client {}",
            session.id, session.client_id
        );

        let snapshot = acquire_fix(
            self.collaborators.location.as_ref(),
            self.config.location_poll_interval,
            self.config.location_max_attempts,
        )
        .await;

        let uploader = Uploader::new(self.collaborators.transport.clone(), self.config.retry);
        let template = EnvelopeTemplate {
            map_version: self.config.map_version.clone(),
            endpoint: self.config.endpoint.clone(),
            session_id: session.id,
        };

        let start_payload = SessionStartPayload::new(
            &template,
            session.client_id,
            &self.config.app_key,
            snapshot.into(),
            &self.device,
        );
        let serialized = serde_json::to_string(&start_payload)
            .context("failed to serialize session start payload")?;
        uploader.upload(&template.endpoint, serialized);

        let ctx = FlushContext {
            template,
            uploader: uploader.clone(),
            location: self.collaborators.location.clone(),
        };
        let cancel_token = CancellationToken::new();
        let mut handles = Vec::with_capacity(2);

        handles.push(tokio::spawn(plane_flush_loop(
            ctx.clone(),
            self.collaborators.planes.clone(),
            self.config.plane_flush,
            cancel_token.clone(),
        )));

        if let Some(buffer) = &self.point_cloud {
            buffer.open();
            handles.push(tokio::spawn(point_cloud_flush_loop(
                ctx,
                buffer.clone(),
                self.config.point_cloud_flush,
                cancel_token.clone(),
            )));
        }

        self.active = Some(ActiveSession {
            session: session.clone(),
            uploader,
            cancel_token,
            handles,
        });
        Ok(session)
    }

    /// Wait for every upload queued so far to finish. Never returns while an
    /// unbounded retry is still failing.
    pub async fn drain_uploads(&self) {
        if let Some(active) = &self.active {
            active.uploader.drain().await;
        }
    }

    /// Stop scheduling, cancel in-flight retries and forget the session.
    ///
    /// Teardown always runs to completion; a flush loop that panicked is
    /// reported only after every retry loop has exited.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };

        active.cancel_token.cancel();
        active.uploader.cancel();
        if let Some(buffer) = &self.point_cloud {
            let dropped = buffer.close().len();
            if dropped > 0 {
                warn!("Discarding {dropped} unflushed point cloud samples");
            }
        }

        let mut join_error = None;
        for handle in active.handles {
            if let Err(err) = handle.await {
                error!("flush loop for session {} ended abnormally: {err}", active.session.id);
                join_error.get_or_insert(err);
            }
        }

        let pending = active.uploader.in_flight();
        if pending > 0 {
            warn!("Cancelling {pending} uploads still in flight");
        }
        active.uploader.shutdown().await;

        info!("Telemetry session {} stopped", active.session.id);
        match join_error {
            Some(err) => Err(err).context("flush loop task failed to join"),
            None => Ok(()),
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.cancel_token.cancel();
            active.uploader.cancel();
        }
        if let Some(buffer) = &self.point_cloud {
            buffer.close();
        }
    }
}
