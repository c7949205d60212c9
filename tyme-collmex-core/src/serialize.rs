//! Serializes named record sets into Collmex import lines.
//!
//! Every line starts with its set name followed by the record's fields,
//! separated by `;`. Short records are padded with empty cells so all lines
//! carry the same number of cells.

use std::string::FromUtf8Error;

use thiserror::Error;
use tracing::{debug, warn};

use crate::record::{CollmexRecord, Record};
use crate::schema::SchemaRegistry;

pub const DELIMITER: u8 = b';';

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("no schema registered for record set `{0}`")]
    UnknownSet(String),
    #[error("failed to write delimited output: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush delimited output: {0}")]
    Io(#[from] std::io::Error),
    #[error("delimited output is not valid UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),
}

/// A record set is either one object (e.g. `LOGIN`) or a list of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSet {
    Single(Record),
    Many(Vec<Record>),
}

impl RecordSet {
    pub fn records(&self) -> &[Record] {
        match self {
            RecordSet::Single(record) => std::slice::from_ref(record),
            RecordSet::Many(records) => records,
        }
    }

    fn push_all(&mut self, more: impl IntoIterator<Item = Record>) {
        match self {
            RecordSet::Many(records) => records.extend(more),
            RecordSet::Single(single) => {
                let mut records = vec![std::mem::take(single)];
                records.extend(more);
                *self = RecordSet::Many(records);
            }
        }
    }
}

/// Record sets keyed by set name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSet {
    sets: Vec<(String, RecordSet)>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records to `set`, creating it when absent.
    pub fn add_records(&mut self, set: &str, records: impl IntoIterator<Item = Record>) {
        match self.sets.iter_mut().find(|(name, _)| name == set) {
            Some((_, existing)) => existing.push_all(records),
            None => self
                .sets
                .push((set.to_string(), RecordSet::Many(records.into_iter().collect()))),
        }
    }

    /// Append typed records to their own set.
    pub fn add<R: CollmexRecord>(&mut self, records: &[R]) {
        self.add_records(R::SET, records.iter().map(CollmexRecord::to_record));
    }

    /// Store `record` as the single object of `set`, replacing what was there.
    pub fn set_single(&mut self, set: &str, record: Record) {
        match self.sets.iter_mut().find(|(name, _)| name == set) {
            Some((_, existing)) => *existing = RecordSet::Single(record),
            None => self.sets.push((set.to_string(), RecordSet::Single(record))),
        }
    }

    /// Append every set of `other`, merging sets that already exist.
    pub fn extend_from(&mut self, other: &DataSet) {
        for (name, set) in &other.sets {
            self.add_records(name, set.records().iter().cloned());
        }
    }

    pub fn get(&self, set: &str) -> Option<&RecordSet> {
        self.sets
            .iter()
            .find(|(name, _)| name == set)
            .map(|(_, records)| records)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordSet)> {
        self.sets.iter().map(|(name, set)| (name.as_str(), set))
    }

    pub fn record_count(&self) -> usize {
        self.sets.iter().map(|(_, set)| set.records().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// Field count of the widest record.
    pub fn column_count(&self) -> usize {
        self.sets
            .iter()
            .flat_map(|(_, set)| set.records())
            .map(Record::len)
            .max()
            .unwrap_or(0)
    }
}

/// Serialized text plus how many lines each set contributed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Serialized {
    pub text: String,
    /// Lines written per set, in set order. Sets whose records were all
    /// skipped are listed with zero.
    pub written: Vec<(String, usize)>,
    pub skipped: usize,
}

impl Serialized {
    pub fn written_for(&self, set: &str) -> usize {
        self.written
            .iter()
            .find(|(name, _)| name == set)
            .map_or(0, |(_, count)| *count)
    }

    pub fn total_written(&self) -> usize {
        self.written.iter().map(|(_, count)| count).sum()
    }
}

/// Validate and serialize every set of `data`.
///
/// Records failing their schema are logged and left out. Fields containing
/// the delimiter, quotes or line breaks are quoted. Lines are separated by
/// `\n` without a trailing newline.
pub fn serialize(data: &DataSet, registry: &SchemaRegistry) -> Result<String, SerializeError> {
    serialize_counted(data, registry).map(|serialized| serialized.text)
}

/// Like [`serialize`], but also reports what was written and skipped.
pub fn serialize_counted(
    data: &DataSet,
    registry: &SchemaRegistry,
) -> Result<Serialized, SerializeError> {
    let columns = data.column_count();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut written = Vec::new();
    let mut skipped = 0usize;
    for (set, records) in data.iter() {
        let schema = registry
            .get(set)
            .ok_or_else(|| SerializeError::UnknownSet(set.to_string()))?;

        let mut lines = 0usize;
        for (index, record) in records.records().iter().enumerate() {
            if let Err(violations) = schema.validate(record) {
                let reasons: Vec<String> = violations.iter().map(ToString::to_string).collect();
                warn!(set, index, violations = ?reasons, "Skipping record that fails its schema");
                skipped += 1;
                continue;
            }

            let mut cells: Vec<String> = Vec::with_capacity(columns + 1);
            cells.push(set.to_string());
            cells.extend(record.values().map(ToString::to_string));
            cells.resize(columns + 1, String::new());
            writer.write_record(&cells)?;
            lines += 1;
        }
        written.push((set.to_string(), lines));
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    let mut text = String::from_utf8(bytes)?;
    if text.ends_with('\n') {
        text.pop();
    }
    let serialized = Serialized {
        text,
        written,
        skipped,
    };
    debug!(
        written = serialized.total_written(),
        skipped,
        columns,
        "Serialized record sets"
    );
    Ok(serialized)
}
