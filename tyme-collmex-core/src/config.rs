use crate::marker::IdMarkers;
use crate::span::MidnightEnd;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_BREAK_TIME: &str = "00:00";

/// Everything the converter needs besides the export itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSettings {
    pub employee_id: u32,
    pub company_id: u32,
    pub markers: IdMarkers,
    /// Break duration written to every record, as `HH:MM`.
    pub break_time: String,
    /// Abort on the first entry that cannot be converted instead of skipping it.
    pub strict: bool,
    pub midnight_end: MidnightEnd,
}

impl ConversionSettings {
    pub fn new(employee_id: u32, company_id: u32) -> Self {
        Self {
            employee_id,
            company_id,
            markers: IdMarkers::default(),
            break_time: DEFAULT_BREAK_TIME.to_string(),
            strict: true,
            midnight_end: MidnightEnd::default(),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            employee_id = self.employee_id,
            company_id = self.company_id,
            marker_start = %self.markers.start,
            marker_end = %self.markers.end,
            strict = self.strict,
            midnight_end = ?self.midnight_end,
            "Loaded conversion settings"
        );
        debug!(?self, "Conversion settings loaded (full debug)");
    }
}
