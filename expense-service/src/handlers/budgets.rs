use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use service_core::error::AppError;

use crate::dtos::budgets::{
    BudgetEnvelope, BudgetListResponse, BudgetStatusResponse, SetBudgetRequest,
    UpdateBudgetRequest,
};
use crate::dtos::SuccessResponse;
use crate::middleware::CurrentUser;
use crate::services::BudgetStatus;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

pub async fn list_budgets(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<BudgetListResponse>, AppError> {
    let budgets = state.budgets.get_user_budgets(&user.user_id).await?;
    Ok(Json(budgets.into()))
}

/// Create the caller's budget for a category, or overwrite the existing one.
pub async fn set_budget(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<SetBudgetRequest>,
) -> Result<Json<BudgetEnvelope>, AppError> {
    let budget = state
        .budgets
        .set_budget(
            &user.user_id,
            payload.category.trim(),
            payload.amount,
            payload.period,
        )
        .await?;

    metrics::counter!("budgets_upserted_total").increment(1);
    tracing::info!(budget_id = %budget.id, category = %budget.category, "Budget set");

    Ok(Json(budget.into()))
}

pub async fn get_budget(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(budget_id): Path<String>,
) -> Result<Json<BudgetEnvelope>, AppError> {
    let budget = state
        .budgets
        .get_budget_by_id(&budget_id, &user.user_id)
        .await?;
    Ok(Json(budget.into()))
}

pub async fn update_budget(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(budget_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateBudgetRequest>,
) -> Result<Json<BudgetEnvelope>, AppError> {
    let budget = state
        .budgets
        .update_budget(&budget_id, &user.user_id, payload.into())
        .await?;

    tracing::info!(budget_id = %budget.id, "Budget updated");
    Ok(Json(budget.into()))
}

pub async fn delete_budget(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(budget_id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .budgets
        .delete_budget(&budget_id, &user.user_id)
        .await?;

    tracing::info!(budget_id = %budget_id, "Budget deleted");
    Ok(Json(SuccessResponse::ok()))
}

pub async fn budget_status(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<BudgetStatusResponse>, AppError> {
    let today = Utc::now().date_naive();

    let budgets = state.budgets.get_user_budgets(&user.user_id).await?;
    let expenses = if budgets.is_empty() {
        Vec::new()
    } else {
        state.expenses.get_user_expenses(&user.user_id, None).await?
    };

    Ok(Json(BudgetStatusResponse {
        success: true,
        as_of: today,
        budgets: BudgetStatus::for_budgets(&budgets, &expenses, today),
    }))
}
