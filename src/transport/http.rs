use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::Transport;

/// Form-encoded POST over a shared reqwest client.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(&self, endpoint: &str, field: &str, payload: &str) -> Result<()> {
        self.client
            .post(endpoint)
            .form(&[(field, payload)])
            .send()
            .await
            .with_context(|| format!("request to {endpoint} failed"))?
            .error_for_status()?;
        Ok(())
    }
}
