use axum::{extract::State, Json};
use chrono::Utc;
use service_core::error::AppError;

use crate::dtos::reports::SummaryResponse;
use crate::middleware::CurrentUser;
use crate::services::SpendingSummary;
use crate::startup::AppState;

pub async fn spending_summary(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<SummaryResponse>, AppError> {
    let expenses = state.expenses.get_user_expenses(&user.user_id, None).await?;
    let summary = SpendingSummary::compute(&expenses, Utc::now().date_naive());

    tracing::debug!(
        expense_count = summary.expense_count,
        monthly_total = summary.monthly_total,
        "Spending summary computed"
    );

    Ok(Json(summary.into()))
}
