use serde::{Deserialize, Serialize};

use crate::models::{LabResult, StatusLevel};

/// Counts per clinical status. Results with an unrecognized status count
/// towards `total` only, so the three buckets may sum to less than it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabSummary {
    #[serde(rename = "total_tests")]
    pub total: usize,
    pub normal: usize,
    pub slightly_abnormal: usize,
    pub critical: usize,
}

impl LabSummary {
    /// One-line form used in exports.
    pub fn headline(&self) -> String {
        format!(
            "Total Tests: {} | Normal: {} | Slightly Abnormal: {} | Critical: {}",
            self.total, self.normal, self.slightly_abnormal, self.critical
        )
    }
}

pub fn summarize(results: &[LabResult]) -> LabSummary {
    results.iter().fold(
        LabSummary {
            total: results.len(),
            ..LabSummary::default()
        },
        |mut summary, result| {
            match result.status.level() {
                Some(StatusLevel::Normal) => summary.normal += 1,
                Some(StatusLevel::SlightlyAbnormal) => summary.slightly_abnormal += 1,
                Some(StatusLevel::Critical) => summary.critical += 1,
                None => {}
            }
            summary
        },
    )
}
