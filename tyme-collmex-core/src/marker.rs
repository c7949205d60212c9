//! Marker id extraction.
//!
//! Collmex ids are embedded in Tyme project and task names between a pair of
//! marker characters, e.g. `Website relaunch [12]`. When a name carries more
//! than one marked number, the last one wins.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("no marked id found in `{text}`")]
    NotFound { text: String },
    #[error("invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// The start/end characters enclosing an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMarkers {
    pub start: char,
    pub end: char,
}

impl Default for IdMarkers {
    fn default() -> Self {
        Self {
            start: '[',
            end: ']',
        }
    }
}

impl IdMarkers {
    pub fn new(start: char, end: char) -> Self {
        Self { start, end }
    }

    pub fn matcher(&self) -> Result<MarkerMatcher, MarkerError> {
        MarkerMatcher::new(*self)
    }
}

/// Compiled matcher for one marker pair. Build once, reuse per entry.
#[derive(Debug, Clone)]
pub struct MarkerMatcher {
    pattern: Regex,
}

impl MarkerMatcher {
    pub fn new(markers: IdMarkers) -> Result<Self, MarkerError> {
        let pattern = format!(
            r"{}\s*([0-9]+)\s*{}",
            regex::escape(&markers.start.to_string()),
            regex::escape(&markers.end.to_string()),
        );
        Ok(Self {
            pattern: Regex::new(&pattern)?,
        })
    }

    /// Last marked number in `text` that fits a `u32`, if any.
    pub fn find(&self, text: &str) -> Option<u32> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
            .last()
    }

    pub fn extract(&self, text: &str) -> Result<u32, MarkerError> {
        self.find(text).ok_or_else(|| MarkerError::NotFound {
            text: text.to_string(),
        })
    }
}

pub fn find_marked_id(text: &str, markers: IdMarkers) -> Option<u32> {
    MarkerMatcher::new(markers).ok()?.find(text)
}

pub fn extract_marked_id(text: &str, markers: IdMarkers) -> Result<u32, MarkerError> {
    MarkerMatcher::new(markers)?.extract(text)
}
