#![allow(unused)]

//! # contract: upload interface for Collmex import payloads
//!
//! This module defines the [`Uploader`] trait and the plain data types that
//! describe what Collmex answered to an upload.
//!
//! ## Interface & Extensibility
//! - Implement [`Uploader`] to send a payload somewhere: the CLI crate ships
//!   the HTTPS client, tests use the generated `MockUploader`.
//! - Collmex answers with delimited lines as well. [`UploadReceipt::parse`]
//!   turns such a response body into structured messages so every
//!   implementor reports results the same way.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, so dependents get `MockUploader`
//!   behind the `test-export-mocks` feature (enabled by default).

use async_trait::async_trait;
use mockall::{automock, predicate::*};
use thiserror::Error;

use crate::serialize::DELIMITER;

/// Severity letter of a Collmex `MESSAGE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "S" => Some(Severity::Success),
            "W" => Some(Severity::Warning),
            "E" => Some(Severity::Error),
            _ => None,
        }
    }
}

/// One `MESSAGE;<severity>;<code>;<text>[;<line>]` line of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiMessage {
    pub severity: Severity,
    pub code: String,
    pub text: String,
    /// Payload line the message refers to, when Collmex names one.
    pub line: Option<u32>,
}

/// What came back from an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReceipt {
    pub status: u16,
    pub messages: Vec<ApiMessage>,
    pub new_object_ids: Vec<String>,
}

impl UploadReceipt {
    /// Parse a Collmex response body. Lines other than `MESSAGE` and
    /// `NEW_OBJECT_ID` are ignored.
    pub fn parse(status: u16, body: &str) -> Self {
        let mut receipt = UploadReceipt {
            status,
            ..Default::default()
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .flexible(true)
            .from_reader(body.as_bytes());

        for row in reader.records() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!(error = %e, "Unreadable line in Collmex response");
                    continue;
                }
            };
            match row.get(0).map(str::trim) {
                Some("MESSAGE") => {
                    let Some(severity) = row.get(1).and_then(Severity::from_code) else {
                        tracing::warn!(?row, "MESSAGE line without a known severity");
                        continue;
                    };
                    receipt.messages.push(ApiMessage {
                        severity,
                        code: row.get(2).unwrap_or_default().trim().to_string(),
                        text: row.get(3).unwrap_or_default().trim().to_string(),
                        line: row.get(4).and_then(|line| line.trim().parse().ok()),
                    });
                }
                Some("NEW_OBJECT_ID") => {
                    if let Some(id) = row.get(1).map(str::trim).filter(|id| !id.is_empty()) {
                        receipt.new_object_ids.push(id.to_string());
                    }
                }
                _ => {}
            }
        }
        receipt
    }

    pub fn errors(&self) -> impl Iterator<Item = &ApiMessage> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ApiMessage> {
        self.with_severity(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &ApiMessage> {
        self.messages
            .iter()
            .filter(move |message| message.severity == severity)
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload transport failed: {0}")]
    Transport(String),
    #[error("Collmex answered with HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("uploader misconfigured: {0}")]
    Config(String),
}

/// Trait for sending a serialized import payload to Collmex.
///
/// The implementor owns endpoint, credentials transport and TLS; the payload
/// already contains the `LOGIN` line.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload one payload and return the parsed response.
    async fn upload(&self, payload: &str) -> Result<UploadReceipt, UploadError>;
}
