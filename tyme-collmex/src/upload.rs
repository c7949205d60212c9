#![doc = "Uploader integration for the CLI: implements the core `Uploader` trait against the Collmex data-exchange endpoint."]
//
//! # Uploader Integration (CLI <-> Core)
//!
//! The core crate defines the [`Uploader`] contract and how a Collmex
//! response is read ([`UploadReceipt::parse`]). This module supplies the real
//! HTTPS client used by the CLI.
//!
//! ## Client Usage
//!
//! - Construct [`CollmexClient`] from the loaded [`CollmexSettings`].
//! - The payload must already start with the `LOGIN` line; see
//!   `tyme_collmex_core::publish::build_payload`.
//! - Transport failures and non-2xx answers become [`UploadError`]s; Collmex
//!   `MESSAGE` lines are left for the caller to judge.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tyme_collmex_core::contract::{UploadError, UploadReceipt, Uploader};

use crate::load_config::CollmexSettings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct CollmexClient {
    http: reqwest::Client,
    endpoint: String,
}

impl CollmexClient {
    pub fn new(settings: &CollmexSettings) -> Result<Self, UploadError> {
        let endpoint = settings.endpoint();
        if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
            tracing::error!(endpoint = %endpoint, "Collmex base_url must be an http(s) URL");
            return Err(UploadError::Config(format!(
                "base_url must be an http(s) URL, got {:?}",
                settings.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build HTTP client");
                UploadError::Config(e.to_string())
            })?;

        tracing::info!(
            endpoint = %endpoint,
            customer_id = %settings.customer_id,
            "Initialized CollmexClient"
        );
        Ok(CollmexClient { http, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Uploader for CollmexClient {
    async fn upload(&self, payload: &str) -> Result<UploadReceipt, UploadError> {
        tracing::info!(
            endpoint = %self.endpoint,
            bytes = payload.len(),
            "Uploading payload to Collmex"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/csv")
            .body(payload.to_owned())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "HTTP request to Collmex failed");
                UploadError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(error = ?e, status = %status, "Failed to read Collmex response body");
            UploadError::Transport(e.to_string())
        })?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Collmex answered with an error status");
            return Err(UploadError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let receipt = UploadReceipt::parse(status.as_u16(), &body);
        tracing::info!(
            status = receipt.status,
            messages = receipt.messages.len(),
            new_objects = receipt.new_object_ids.len(),
            "Collmex accepted the request"
        );
        Ok(receipt)
    }
}
