//! Tyme export model.
//!
//! Tyme writes its JSON export with the entries under `timed` (older
//! releases) or `data` (Tyme 3). Entry field names drifted between releases
//! as well, so both spellings are accepted.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to parse Tyme export JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("entry is missing its `{0}` field")]
    MissingField(&'static str),
    #[error("unrecognised timestamp `{value}`")]
    Timestamp { value: String },
}

/// Top-level export document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TymeExport {
    #[serde(default)]
    pub data: Option<Vec<TymeEntry>>,
    #[serde(default)]
    pub timed: Option<Vec<TymeEntry>>,
}

/// A single tracked time entry. Fields the converter does not use are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TymeEntry {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default, alias = "timeStart")]
    pub start: Option<String>,
    #[serde(default, alias = "timeEnd")]
    pub end: Option<String>,
    #[serde(default, alias = "notes")]
    pub note: Option<String>,
}

impl TymeExport {
    /// Entries of the export, preferring `data` over `timed`.
    pub fn entries(&self) -> &[TymeEntry] {
        match (&self.data, &self.timed) {
            (Some(data), _) if !data.is_empty() => data.as_slice(),
            (_, Some(timed)) => timed.as_slice(),
            (Some(data), None) => data.as_slice(),
            (None, None) => &[],
        }
    }

    /// An export is usable when one of its entry lists is non-empty and the
    /// first entry names both a project and a task.
    pub fn is_valid(&self) -> bool {
        fn usable(list: &Option<Vec<TymeEntry>>) -> bool {
            match list.as_deref().and_then(|entries| entries.first()) {
                Some(first) => !first.project().is_empty() && !first.task().is_empty(),
                None => false,
            }
        }
        usable(&self.data) || usable(&self.timed)
    }
}

impl TymeEntry {
    pub fn project(&self) -> &str {
        self.project.as_deref().unwrap_or_default()
    }

    pub fn task(&self) -> &str {
        self.task.as_deref().unwrap_or_default()
    }

    pub fn note(&self) -> &str {
        self.note.as_deref().unwrap_or_default()
    }

    pub fn starts_at(&self) -> Result<NaiveDateTime, SourceError> {
        let raw = self.start.as_deref().ok_or(SourceError::MissingField("start"))?;
        parse_timestamp(raw)
    }

    pub fn ends_at(&self) -> Result<NaiveDateTime, SourceError> {
        let raw = self.end.as_deref().ok_or(SourceError::MissingField("end"))?;
        parse_timestamp(raw)
    }
}

pub fn parse_export(json: &str) -> Result<TymeExport, SourceError> {
    let export: TymeExport = serde_json::from_str(json)?;
    tracing::debug!(entries = export.entries().len(), "Parsed Tyme export");
    Ok(export)
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an export timestamp into wall-clock time.
///
/// Timestamps carrying an offset keep the local time they were recorded in;
/// the offset itself is dropped.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, SourceError> {
    let value = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| SourceError::Timestamp {
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn keeps_wall_clock_time_of_offset_timestamps() {
        assert_eq!(
            parse_timestamp("2016-10-11T09:08:00+02:00").unwrap(),
            at(2016, 10, 11, 9, 8)
        );
        assert_eq!(
            parse_timestamp("2016-10-11T23:30:00Z").unwrap(),
            at(2016, 10, 11, 23, 30)
        );
        assert_eq!(
            parse_timestamp("2016-10-11T09:08:00+0200").unwrap(),
            at(2016, 10, 11, 9, 8)
        );
    }

    #[test]
    fn accepts_naive_timestamps() {
        assert_eq!(
            parse_timestamp("2016-10-11T09:08:30").unwrap(),
            at(2016, 10, 11, 9, 8) + chrono::Duration::seconds(30)
        );
        assert_eq!(
            parse_timestamp("2016-10-11 09:08").unwrap(),
            at(2016, 10, 11, 9, 8)
        );
    }

    #[test]
    fn rejects_garbage_timestamps() {
        let err = parse_timestamp("yesterday").unwrap_err();
        assert!(matches!(err, SourceError::Timestamp { .. }));
    }

    #[test]
    fn reads_both_field_spellings() {
        let export = parse_export(
            r#"{"data":[{"project":"P [1]","task":"T [2]","timeStart":"2016-10-11T09:00:00",
                "timeEnd":"2016-10-11T10:00:00","notes":"hello","billing":"UNBILLED"}]}"#,
        )
        .unwrap();
        let entry = &export.entries()[0];
        assert_eq!(entry.note(), "hello");
        assert_eq!(entry.starts_at().unwrap(), at(2016, 10, 11, 9, 0));
        assert_eq!(entry.ends_at().unwrap(), at(2016, 10, 11, 10, 0));
    }

    #[test]
    fn validity_requires_project_and_task_on_first_entry() {
        let valid = parse_export(r#"{"timed":[{"project":"P","task":"T"}]}"#).unwrap();
        assert!(valid.is_valid());

        let no_task = parse_export(r#"{"timed":[{"project":"P","task":""}]}"#).unwrap();
        assert!(!no_task.is_valid());

        let empty = parse_export(r#"{"data":[],"timed":[]}"#).unwrap();
        assert!(!empty.is_valid());

        let nothing = parse_export("{}").unwrap();
        assert!(!nothing.is_valid());
        assert!(nothing.entries().is_empty());
    }

    #[test]
    fn prefers_data_over_timed() {
        let export = parse_export(
            r#"{"data":[{"project":"A","task":"T"}],"timed":[{"project":"B","task":"T"}]}"#,
        )
        .unwrap();
        assert_eq!(export.entries()[0].project(), "A");

        let fallback = parse_export(
            r#"{"data":[],"timed":[{"project":"B","task":"T"}]}"#,
        )
        .unwrap();
        assert_eq!(fallback.entries()[0].project(), "B");
    }

    #[test]
    fn missing_start_is_reported() {
        let entry = TymeEntry::default();
        assert!(matches!(
            entry.starts_at().unwrap_err(),
            SourceError::MissingField("start")
        ));
    }
}
