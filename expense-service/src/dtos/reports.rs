use serde::Serialize;

use crate::services::SpendingSummary;

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub success: bool,
    pub summary: SpendingSummary,
}

impl From<SpendingSummary> for SummaryResponse {
    fn from(summary: SpendingSummary) -> Self {
        Self {
            success: true,
            summary,
        }
    }
}
