use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Expense, ExpensePatch, NewExpense};
use crate::utils::non_blank;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExpenseRequest {
    #[validate(range(min = 0.0, message = "Amount must not be negative"))]
    pub amount: f64,

    pub date: NaiveDate,

    #[validate(custom(function = "non_blank", message = "Category is required"))]
    pub category: String,

    #[validate(custom(function = "non_blank", message = "Payment method is required"))]
    pub payment_method: String,

    #[serde(default)]
    pub notes: Option<String>,
}

impl From<CreateExpenseRequest> for NewExpense {
    fn from(req: CreateExpenseRequest) -> Self {
        NewExpense {
            amount: req.amount,
            date: req.date,
            category: req.category.trim().to_string(),
            payment_method: req.payment_method.trim().to_string(),
            notes: req.notes.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateExpenseRequest {
    #[validate(range(min = 0.0, message = "Amount must not be negative"))]
    pub amount: Option<f64>,

    pub date: Option<NaiveDate>,

    #[validate(custom(function = "non_blank", message = "Category must not be blank"))]
    pub category: Option<String>,

    #[validate(custom(function = "non_blank", message = "Payment method must not be blank"))]
    pub payment_method: Option<String>,

    pub notes: Option<String>,
}

impl From<UpdateExpenseRequest> for ExpensePatch {
    fn from(req: UpdateExpenseRequest) -> Self {
        ExpensePatch {
            amount: req.amount,
            date: req.date,
            category: req.category.map(|c| c.trim().to_string()),
            payment_method: req.payment_method.map(|m| m.trim().to_string()),
            notes: req.notes,
        }
    }
}

/// Filters for `GET /api/expenses`. `start_date` and `end_date` go together.
#[derive(Debug, Default, Deserialize)]
pub struct ListExpensesQuery {
    pub limit: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    pub id: String,
    pub user_id: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub category: String,
    pub payment_method: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseResponse {
    fn from(e: Expense) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            amount: e.amount,
            date: e.date,
            category: e.category,
            payment_method: e.payment_method,
            notes: e.notes,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExpenseListResponse {
    pub success: bool,
    pub expenses: Vec<ExpenseResponse>,
}

impl From<Vec<Expense>> for ExpenseListResponse {
    fn from(expenses: Vec<Expense>) -> Self {
        Self {
            success: true,
            expenses: expenses.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExpenseEnvelope {
    pub success: bool,
    pub expense: ExpenseResponse,
}

impl From<Expense> for ExpenseEnvelope {
    fn from(expense: Expense) -> Self {
        Self {
            success: true,
            expense: expense.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedExpenseResponse {
    pub success: bool,
    pub id: String,
    pub expense: ExpenseResponse,
}

impl From<Expense> for CreatedExpenseResponse {
    fn from(expense: Expense) -> Self {
        Self {
            success: true,
            id: expense.id.clone(),
            expense: expense.into(),
        }
    }
}
