use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Budget, BudgetPatch, BudgetPeriod};
use crate::services::BudgetStatus;
use crate::utils::non_blank;

#[derive(Debug, Deserialize, Validate)]
pub struct SetBudgetRequest {
    #[validate(custom(function = "non_blank", message = "Category is required"))]
    pub category: String,

    #[validate(range(min = 0.0, message = "Amount must not be negative"))]
    pub amount: f64,

    #[serde(default)]
    pub period: BudgetPeriod,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBudgetRequest {
    #[validate(custom(function = "non_blank", message = "Category must not be blank"))]
    pub category: Option<String>,

    #[validate(range(min = 0.0, message = "Amount must not be negative"))]
    pub amount: Option<f64>,

    pub period: Option<BudgetPeriod>,
}

impl From<UpdateBudgetRequest> for BudgetPatch {
    fn from(req: UpdateBudgetRequest) -> Self {
        BudgetPatch {
            category: req.category.map(|c| c.trim().to_string()),
            amount: req.amount,
            period: req.period,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub amount: f64,
    pub period: BudgetPeriod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Budget> for BudgetResponse {
    fn from(b: Budget) -> Self {
        Self {
            id: b.id,
            user_id: b.user_id,
            category: b.category,
            amount: b.amount,
            period: b.period,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BudgetListResponse {
    pub success: bool,
    pub budgets: Vec<BudgetResponse>,
}

impl From<Vec<Budget>> for BudgetListResponse {
    fn from(budgets: Vec<Budget>) -> Self {
        Self {
            success: true,
            budgets: budgets.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BudgetEnvelope {
    pub success: bool,
    pub budget: BudgetResponse,
}

impl From<Budget> for BudgetEnvelope {
    fn from(budget: Budget) -> Self {
        Self {
            success: true,
            budget: budget.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BudgetStatusResponse {
    pub success: bool,
    pub as_of: NaiveDate,
    pub budgets: Vec<BudgetStatus>,
}
