pub mod http;
pub mod retry;
pub mod uploader;

use anyhow::Result;
use async_trait::async_trait;

pub use http::HttpTransport;
pub use retry::{Backoff, RetryPolicy};
pub use uploader::Uploader;

/// Name of the single form field every payload travels in.
pub const UPLOAD_FORM_FIELD: &str = "points";

/// One delivery attempt. Any network error or non-success status is an `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_form(&self, endpoint: &str, field: &str, payload: &str) -> Result<()>;
}
