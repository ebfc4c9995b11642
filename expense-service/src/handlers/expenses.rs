use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::dtos::expenses::{
    CreateExpenseRequest, CreatedExpenseResponse, ExpenseEnvelope, ExpenseListResponse,
    ListExpensesQuery, UpdateExpenseRequest,
};
use crate::dtos::SuccessResponse;
use crate::middleware::CurrentUser;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

/// List the caller's expenses.
///
/// With `start_date` and `end_date` the result is that inclusive range ordered
/// by date; otherwise it is ordered newest-created first. `category` narrows
/// either form and `limit` truncates the final list.
pub async fn list_expenses(
    State(state): State<AppState>,
    user: CurrentUser,
    query: Result<Query<ListExpensesQuery>, QueryRejection>,
) -> Result<Json<ExpenseListResponse>, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;

    if let Some(limit) = query.limit {
        if limit < 1 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "limit must be at least 1"
            )));
        }
    }

    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let mut expenses = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => {
            if start > end {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "start_date must not be after end_date"
                )));
            }
            let mut in_range = state
                .expenses
                .get_expenses_by_date_range(&user.user_id, start, end)
                .await?;
            if let Some(category) = category {
                in_range.retain(|e| e.category == category);
            }
            in_range
        }
        (None, None) => match category {
            Some(category) => {
                state
                    .expenses
                    .get_expenses_by_category(&user.user_id, category)
                    .await?
            }
            None => {
                state
                    .expenses
                    .get_user_expenses(&user.user_id, query.limit)
                    .await?
            }
        },
        _ => {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "start_date and end_date must be given together"
            )));
        }
    };

    if let Some(limit) = query.limit {
        expenses.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    }

    Ok(Json(expenses.into()))
}

pub async fn create_expense(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<CreatedExpenseResponse>), AppError> {
    let expense = state
        .expenses
        .add_expense(&user.user_id, payload.into())
        .await?;

    metrics::counter!("expenses_created_total").increment(1);
    tracing::info!(expense_id = %expense.id, category = %expense.category, "Expense created");

    Ok((StatusCode::CREATED, Json(expense.into())))
}

pub async fn get_expense(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(expense_id): Path<String>,
) -> Result<Json<ExpenseEnvelope>, AppError> {
    let expense = state
        .expenses
        .get_expense_by_id(&expense_id, &user.user_id)
        .await?;

    Ok(Json(expense.into()))
}

pub async fn update_expense(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(expense_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateExpenseRequest>,
) -> Result<Json<ExpenseEnvelope>, AppError> {
    let expense = state
        .expenses
        .update_expense(&expense_id, &user.user_id, payload.into())
        .await?;

    tracing::info!(expense_id = %expense.id, "Expense updated");
    Ok(Json(expense.into()))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(expense_id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .expenses
        .delete_expense(&expense_id, &user.user_id)
        .await?;

    tracing::info!(expense_id = %expense_id, "Expense deleted");
    Ok(Json(SuccessResponse::ok()))
}
