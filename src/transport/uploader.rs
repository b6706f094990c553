use std::sync::Arc;

use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{RetryPolicy, Transport, UPLOAD_FORM_FIELD};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Fire-and-forget delivery of serialized payloads.
///
/// Each [`upload`](Uploader::upload) becomes its own background task that
/// re-sends the identical payload until it is accepted. Callers never see the
/// outcome. All tasks are tracked so the owning pipeline can cancel them on
/// teardown instead of leaving retry loops behind.
#[derive(Clone)]
pub struct Uploader {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    cancel_token: CancellationToken,
    tracker: TaskTracker,
}

impl Uploader {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            cancel_token: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Queue `payload` for delivery to `endpoint` and return immediately.
    pub fn upload(&self, endpoint: &str, payload: String) {
        if self.cancel_token.is_cancelled() {
            log_warn!("uploader shut down; dropping {} byte payload", payload.len());
            return;
        }

        self.tracker.spawn(deliver(
            self.transport.clone(),
            self.policy,
            self.cancel_token.clone(),
            endpoint.to_string(),
            payload,
        ));
    }

    /// Number of deliveries still in flight.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every delivery queued so far has finished.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Signal every retry loop to stop without waiting for it.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Cancel all retry loops and wait for them to exit. Later uploads are dropped.
    pub async fn shutdown(&self) {
        self.cancel_token.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        log_info!("uploader shut down");
    }
}

async fn deliver(
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    cancel_token: CancellationToken,
    endpoint: String,
    payload: String,
) {
    let mut attempt: u32 = 0;

    loop {
        if cancel_token.is_cancelled() {
            log_info!("upload to {} cancelled after {} attempts", endpoint, attempt);
            return;
        }
        attempt = attempt.saturating_add(1);

        let result = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("upload to {} cancelled during attempt {}", endpoint, attempt);
                return;
            }
            result = transport.post_form(&endpoint, UPLOAD_FORM_FIELD, &payload) => result,
        };

        let err = match result {
            Ok(()) => {
                log_info!("MAP: Upload complete! ({} bytes, attempt {})", payload.len(), attempt);
                return;
            }
            Err(err) => err,
        };

        let Some(delay) = policy.next_delay(attempt) else {
            log_error!("giving up on upload to {} after {} attempts: {err:#}", endpoint, attempt);
            return;
        };
        log_warn!("upload attempt {} to {} failed: {err:#}; retrying", attempt, endpoint);

        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::select! {
                _ = cancel_token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
