//! Declarative per-field schemas for the Collmex record sets this tool writes.
//!
//! Collmex reads lines positionally, so a record must carry every field of
//! its schema, in schema order. `required` means the value may not be blank.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::record::{FieldValue, Record, ACTIVITY_SET, LOGIN_SET};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer { min: i64 },
    Text { max_len: usize },
    /// `YYYYMMDD`, must name a real calendar day.
    Date,
    /// `HH:MM`, 24-hour clock.
    Time,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSchema {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("field `{field}` is missing")]
    Absent { field: &'static str },
    #[error("required field `{field}` is blank")]
    Blank { field: &'static str },
    #[error("field `{field}` is not part of the schema")]
    Unknown { field: String },
    #[error("field `{field}` is out of order")]
    OutOfOrder { field: String },
    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field `{field}` is {value}, minimum is {min}")]
    BelowMinimum {
        field: &'static str,
        min: i64,
        value: i64,
    },
    #[error("field `{field}` has {len} characters, maximum is {max_len}")]
    TooLong {
        field: &'static str,
        max_len: usize,
        len: usize,
    },
    #[error("field `{field}` is not a YYYYMMDD date: `{value}`")]
    BadDate { field: &'static str, value: String },
    #[error("field `{field}` is not an HH:MM time: `{value}`")]
    BadTime { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    pub set: &'static str,
    pub fields: Vec<FieldSchema>,
}

impl RecordSchema {
    pub fn new(set: &'static str, fields: Vec<FieldSchema>) -> Self {
        Self { set, fields }
    }

    /// Check a record, collecting every violation rather than stopping at the first.
    pub fn validate(&self, record: &Record) -> Result<(), Vec<Violation>> {
        let mut violations = Vec::new();
        let mut last_position = None;

        for (name, _) in record.fields() {
            match self.fields.iter().position(|field| field.name == name) {
                None => violations.push(Violation::Unknown {
                    field: name.to_string(),
                }),
                Some(position) => {
                    if last_position.is_some_and(|last| position <= last) {
                        violations.push(Violation::OutOfOrder {
                            field: name.to_string(),
                        });
                    }
                    last_position = Some(position);
                }
            }
        }

        for field in &self.fields {
            match record.get(field.name) {
                None => violations.push(Violation::Absent { field: field.name }),
                Some(value) => {
                    if let Err(violation) = check_value(field, value) {
                        violations.push(violation);
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn check_value(field: &FieldSchema, value: &FieldValue) -> Result<(), Violation> {
    let blank = match value {
        FieldValue::Empty => true,
        FieldValue::Text(text) => text.is_empty(),
        FieldValue::Integer(_) => false,
    };
    if blank {
        return if field.required {
            Err(Violation::Blank { field: field.name })
        } else {
            Ok(())
        };
    }

    match (field.kind, value) {
        (FieldKind::Integer { min }, FieldValue::Integer(n)) => {
            if *n < min {
                Err(Violation::BelowMinimum {
                    field: field.name,
                    min,
                    value: *n,
                })
            } else {
                Ok(())
            }
        }
        (FieldKind::Integer { .. }, _) => Err(Violation::WrongType {
            field: field.name,
            expected: "an integer",
        }),
        (FieldKind::Text { max_len }, FieldValue::Text(text)) => {
            let len = text.chars().count();
            if len > max_len {
                Err(Violation::TooLong {
                    field: field.name,
                    max_len,
                    len,
                })
            } else {
                Ok(())
            }
        }
        (FieldKind::Date, FieldValue::Text(text)) => {
            if is_date(text) {
                Ok(())
            } else {
                Err(Violation::BadDate {
                    field: field.name,
                    value: text.clone(),
                })
            }
        }
        (FieldKind::Time, FieldValue::Text(text)) => {
            if is_time(text) {
                Ok(())
            } else {
                Err(Violation::BadTime {
                    field: field.name,
                    value: text.clone(),
                })
            }
        }
        (_, _) => Err(Violation::WrongType {
            field: field.name,
            expected: "text",
        }),
    }
}

/// `YYYYMMDD` naming a real calendar day.
pub fn is_date(text: &str) -> bool {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let (Ok(year), Ok(month), Ok(day)) = (
        text[0..4].parse::<i32>(),
        text[4..6].parse::<u32>(),
        text[6..8].parse::<u32>(),
    ) else {
        return false;
    };
    NaiveDate::from_ymd_opt(year, month, day).is_some()
}

/// `HH:MM` on a 24-hour clock.
pub fn is_time(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }
    if ![0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit()) {
        return false;
    }
    let (Ok(hours), Ok(minutes)) = (text[0..2].parse::<u32>(), text[3..5].parse::<u32>()) else {
        return false;
    };
    NaiveTime::from_hms_opt(hours, minutes, 0).is_some()
}

/// Schemas by set name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<&'static str, RecordSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sets written by this tool: `LOGIN` and `CMXACT`.
    pub fn collmex() -> Self {
        let mut registry = Self::new();
        registry.register(login_schema());
        registry.register(activity_schema());
        registry
    }

    pub fn register(&mut self, schema: RecordSchema) {
        self.schemas.insert(schema.set, schema);
    }

    pub fn get(&self, set: &str) -> Option<&RecordSchema> {
        self.schemas.get(set)
    }
}

pub fn login_schema() -> RecordSchema {
    RecordSchema::new(
        LOGIN_SET,
        vec![
            FieldSchema::required("user", FieldKind::Text { max_len: 64 }),
            FieldSchema::required("password", FieldKind::Text { max_len: 64 }),
        ],
    )
}

pub fn activity_schema() -> RecordSchema {
    let id = FieldKind::Integer { min: 1 };
    RecordSchema::new(
        ACTIVITY_SET,
        vec![
            FieldSchema::required("project_id", id),
            FieldSchema::required("employee_id", id),
            FieldSchema::required("company_id", id),
            FieldSchema::required("rate_id", id),
            FieldSchema::optional("description", FieldKind::Text { max_len: 1024 }),
            FieldSchema::required("date", FieldKind::Date),
            FieldSchema::required("from_time", FieldKind::Time),
            FieldSchema::required("to_time", FieldKind::Time),
            FieldSchema::optional("break_time", FieldKind::Time),
        ],
    )
}
