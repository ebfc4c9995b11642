pub mod auth;
pub mod budgets;
pub mod expenses;
pub mod reports;

use serde::Serialize;

/// Body for operations that return nothing but an outcome.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
