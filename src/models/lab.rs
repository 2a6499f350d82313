use serde::{Deserialize, Serialize};

use super::enums::LabStatus;

/// One laboratory measurement extracted from a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    pub test: String,
    pub value: f64,
    pub unit: String,
    pub range: String,
    pub status: LabStatus,
    #[serde(default)]
    pub explanation: String,
}
