#![doc = "tyme-collmex-core: core conversion logic for tyme-collmex."]

//! This crate turns Tyme time-tracking exports into Collmex `CMXACT` import
//! lines. It contains the data models, the per-day span splitting, the marker
//! id extraction, schema validation and the delimited serializer, plus the
//! upload contract used by the CLI crate.
//!
//! No file or network I/O happens here: the CLI crate reads the export,
//! writes the resulting text and implements [`contract::Uploader`].
//!
//! # Usage
//! ```
//! use tyme_collmex_core::config::ConversionSettings;
//! use tyme_collmex_core::convert::render_export;
//!
//! let json = r#"{"timed":[{"project":"Website [12]","task":"Development [3]",
//!     "start":"2016-10-11T09:08:00+02:00","end":"2016-10-11T17:30:00+02:00","note":"Login"}]}"#;
//! let text = render_export(json, &ConversionSettings::new(7, 1)).unwrap();
//! assert_eq!(text, "CMXACT;12;7;1;3;Login;20161011;09:08;17:30;00:00");
//! ```

pub mod config;
pub mod contract;
pub mod convert;
pub mod marker;
pub mod publish;
pub mod record;
pub mod schema;
pub mod serialize;
pub mod source;
pub mod span;
