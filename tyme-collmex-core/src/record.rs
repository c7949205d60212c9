//! Collmex record types and the assembler turning Tyme entries into them.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::config::ConversionSettings;
use crate::marker::{MarkerError, MarkerMatcher};
use crate::source::{SourceError, TymeEntry};
use crate::span::{split_into_days, SpanError};

pub const ACTIVITY_SET: &str = "CMXACT";
pub const LOGIN_SET: &str = "LOGIN";

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("project id: {0}")]
    ProjectId(#[source] MarkerError),
    #[error("rate id: {0}")]
    RateId(#[source] MarkerError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Span(#[from] SpanError),
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    /// Positional placeholder for an optional field left blank.
    Empty,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Empty => Ok(()),
        }
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Integer(n.into())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// An ordered list of named fields. Collmex reads lines positionally, so the
/// field order is the column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.fields.iter().map(|(_, value)| value)
    }
}

/// A typed Collmex record that knows its set name and column layout.
pub trait CollmexRecord {
    const SET: &'static str;

    fn to_record(&self) -> Record;
}

/// `CMXACT`: one activity (time entry) on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    pub project_id: u32,
    pub employee_id: u32,
    pub company_id: u32,
    pub rate_id: u32,
    pub description: String,
    pub date: NaiveDate,
    pub from_time: NaiveTime,
    pub to_time: NaiveTime,
    pub break_time: String,
}

impl CollmexRecord for ActivityRecord {
    const SET: &'static str = ACTIVITY_SET;

    fn to_record(&self) -> Record {
        Record::new()
            .with("project_id", self.project_id)
            .with("employee_id", self.employee_id)
            .with("company_id", self.company_id)
            .with("rate_id", self.rate_id)
            .with("description", self.description.as_str())
            .with("date", format_date(self.date))
            .with("from_time", format_time(self.from_time))
            .with("to_time", format_time(self.to_time))
            .with("break_time", self.break_time.as_str())
    }
}

/// `LOGIN`: credentials line that must open every upload.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginRecord {
    pub user: String,
    pub password: String,
}

impl LoginRecord {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRecord")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl CollmexRecord for LoginRecord {
    const SET: &'static str = LOGIN_SET;

    fn to_record(&self) -> Record {
        Record::new()
            .with("user", self.user.as_str())
            .with("password", self.password.as_str())
    }
}

/// `YYYYMMDD`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// `HH:MM`, seconds dropped.
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

fn single_line(note: &str) -> String {
    note.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Build the per-day activity records for one Tyme entry.
pub fn assemble(
    entry: &TymeEntry,
    settings: &ConversionSettings,
    matcher: &MarkerMatcher,
) -> Result<Vec<ActivityRecord>, AssembleError> {
    let project_id = matcher
        .extract(entry.project())
        .map_err(AssembleError::ProjectId)?;
    let rate_id = matcher.extract(entry.task()).map_err(AssembleError::RateId)?;
    let start = entry.starts_at()?;
    let end = entry.ends_at()?;
    let description = single_line(entry.note());

    let records = split_into_days(start, end, settings.midnight_end)?
        .into_iter()
        .map(|span| ActivityRecord {
            project_id,
            employee_id: settings.employee_id,
            company_id: settings.company_id,
            rate_id,
            description: description.clone(),
            date: span.date,
            from_time: span.from,
            to_time: span.to,
            break_time: settings.break_time.clone(),
        })
        .collect();
    Ok(records)
}
