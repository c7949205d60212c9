//! Conversion pipeline: Tyme export in, Collmex activity records out.

use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::ConversionSettings;
use crate::marker::MarkerError;
use crate::record::{assemble, ActivityRecord, AssembleError};
use crate::schema::{is_time, SchemaRegistry};
use crate::serialize::{serialize, DataSet, SerializeError};
use crate::source::{parse_export, SourceError, TymeExport};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("export has no usable time entries (expected a non-empty `data` or `timed` list whose first entry names a project and a task)")]
    InvalidExport,
    #[error("break time `{0}` is not an HH:MM time")]
    BreakTime(String),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Marker(#[from] MarkerError),
    #[error("entry #{index}: {source}")]
    Entry {
        index: usize,
        #[source]
        source: AssembleError,
    },
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

/// An entry left out of a lenient conversion.
#[derive(Debug)]
pub struct SkippedEntry {
    pub index: usize,
    pub error: AssembleError,
}

#[derive(Debug, Default)]
pub struct Conversion {
    pub records: Vec<ActivityRecord>,
    pub skipped: Vec<SkippedEntry>,
    pub entry_count: usize,
}

impl Conversion {
    pub fn into_data_set(self) -> DataSet {
        let mut data = DataSet::new();
        data.add(&self.records);
        data
    }
}

/// Convert every entry of `export` into per-day activity records.
///
/// In strict mode the first failing entry aborts the conversion; otherwise it
/// is logged, recorded in [`Conversion::skipped`] and the rest continue.
pub fn convert(
    export: &TymeExport,
    settings: &ConversionSettings,
) -> Result<Conversion, ConvertError> {
    if !export.is_valid() {
        error!("Tyme export is empty or lacks project/task names");
        return Err(ConvertError::InvalidExport);
    }
    if !settings.break_time.is_empty() && !is_time(&settings.break_time) {
        error!(break_time = %settings.break_time, "Break time is not an HH:MM time");
        return Err(ConvertError::BreakTime(settings.break_time.clone()));
    }

    let matcher = settings.markers.matcher()?;
    let entries = export.entries();
    let mut conversion = Conversion {
        entry_count: entries.len(),
        ..Conversion::default()
    };

    for (index, entry) in entries.iter().enumerate() {
        match assemble(entry, settings, &matcher) {
            Ok(records) => conversion.records.extend(records),
            Err(e) if settings.strict => {
                error!(index, project = entry.project(), task = entry.task(), error = %e, "Entry could not be converted");
                return Err(ConvertError::Entry { index, source: e });
            }
            Err(e) => {
                warn!(index, project = entry.project(), task = entry.task(), error = %e, "Skipping entry that could not be converted");
                conversion.skipped.push(SkippedEntry { index, error: e });
            }
        }
    }

    info!(
        entries = conversion.entry_count,
        records = conversion.records.len(),
        skipped = conversion.skipped.len(),
        "Converted Tyme export"
    );
    Ok(conversion)
}

/// Parse, convert and serialize an export in one go.
pub fn render_export(json: &str, settings: &ConversionSettings) -> Result<String, ConvertError> {
    let export = parse_export(json)?;
    let data = convert(&export, settings)?.into_data_set();
    Ok(serialize(&data, &SchemaRegistry::collmex())?)
}
