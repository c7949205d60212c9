//! Upload orchestration: login line + records → payload → [`Uploader`] → report.
//!
//! # Responsibilities
//! - Validate the `LOGIN` record up front; a payload without a valid login is
//!   rejected by Collmex as a whole, so it is never sent.
//! - Serialize `LOGIN` first, then every record set of the data.
//! - Fail when Collmex reports any error message; warnings are passed on in
//!   the report.
//!
//! # Callable From
//! - The CLI crate after writing the converted file, and integration tests
//!   with `MockUploader`.

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::contract::{ApiMessage, UploadError, Uploader};
use crate::record::{CollmexRecord, LoginRecord};
use crate::schema::{SchemaRegistry, Violation};
use crate::serialize::{serialize_counted, DataSet, SerializeError};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("nothing to upload: no record passed validation")]
    Empty,
    #[error("login record is invalid: {}", join(.0))]
    InvalidLogin(Vec<Violation>),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("Collmex rejected the upload: {}", summarise(.messages))]
    Rejected { messages: Vec<ApiMessage> },
}

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn summarise(messages: &[ApiMessage]) -> String {
    messages
        .iter()
        .map(|m| match m.line {
            Some(line) => format!("[{}] {} (line {line})", m.code, m.text),
            None => format!("[{}] {}", m.code, m.text),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug)]
pub struct PublishReport {
    pub status: u16,
    pub records_sent: usize,
    pub warnings: Vec<ApiMessage>,
    pub messages: Vec<ApiMessage>,
    pub new_object_ids: Vec<String>,
}

/// Upload body and the number of data lines in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub text: String,
    /// Lines after `LOGIN`, i.e. records that passed validation.
    pub records: usize,
}

/// Serialize `data` behind a `LOGIN` line. The payload ends with a newline.
///
/// Fails with [`PublishError::Empty`] when no record of `data` survives
/// validation, so a login-only request is never built.
pub fn build_payload(
    data: &DataSet,
    login: &LoginRecord,
    registry: &SchemaRegistry,
) -> Result<Payload, PublishError> {
    if data.is_empty() {
        return Err(PublishError::Empty);
    }

    let login_record = login.to_record();
    if let Some(schema) = registry.get(LoginRecord::SET) {
        schema
            .validate(&login_record)
            .map_err(PublishError::InvalidLogin)?;
    }

    let mut payload = DataSet::new();
    payload.set_single(LoginRecord::SET, login_record);
    payload.extend_from(data);

    let serialized = serialize_counted(&payload, registry)?;
    let records = serialized.total_written() - serialized.written_for(LoginRecord::SET);
    if records == 0 {
        warn!(skipped = serialized.skipped, "[PUBLISH] No record passed validation");
        return Err(PublishError::Empty);
    }

    let mut text = serialized.text;
    text.push('\n');
    Ok(Payload { text, records })
}

pub async fn publish<U>(
    uploader: &U,
    data: &DataSet,
    login: &LoginRecord,
    registry: &SchemaRegistry,
) -> Result<PublishReport, PublishError>
where
    U: Uploader + ?Sized,
{
    info!(records = data.record_count(), "[PUBLISH] Building Collmex payload");
    let payload = build_payload(data, login, registry)?;
    debug!(bytes = payload.text.len(), records = payload.records, "[PUBLISH] Payload ready");

    let receipt = match uploader.upload(&payload.text).await {
        Ok(receipt) => {
            info!(status = receipt.status, messages = receipt.messages.len(), "[PUBLISH] Upload answered");
            receipt
        }
        Err(e) => {
            error!(error = %e, "[PUBLISH][ERROR] Upload failed");
            return Err(e.into());
        }
    };

    if receipt.has_errors() {
        let messages: Vec<ApiMessage> = receipt.errors().cloned().collect();
        error!(errors = messages.len(), "[PUBLISH][ERROR] Collmex reported errors");
        return Err(PublishError::Rejected { messages });
    }

    let warnings: Vec<ApiMessage> = receipt.warnings().cloned().collect();
    for warning in &warnings {
        warn!(code = %warning.code, text = %warning.text, line = ?warning.line, "[PUBLISH] Collmex warning");
    }

    Ok(PublishReport {
        status: receipt.status,
        records_sent: payload.records,
        warnings,
        messages: receipt.messages,
        new_object_ids: receipt.new_object_ids,
    })
}
