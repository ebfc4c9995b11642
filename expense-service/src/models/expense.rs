use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single spending record, owned by `user_id`.
///
/// `date` is the calendar day the money was spent and is stored as an ISO
/// `YYYY-MM-DD` string, so lexicographic range filters match date order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub category: String,
    pub payment_method: String,
    #[serde(default)]
    pub notes: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields of a new expense.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub amount: f64,
    pub date: NaiveDate,
    pub category: String,
    pub payment_method: String,
    pub notes: String,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

impl Expense {
    pub fn new(user_id: &str, new: NewExpense) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            amount: new.amount,
            date: new.date,
            category: new.category,
            payment_method: new.payment_method,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply `patch` in place and stamp `updated_at`.
    pub fn apply(&mut self, patch: ExpensePatch, now: DateTime<Utc>) {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(payment_method) = patch.payment_method {
            self.payment_method = payment_method;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        self.updated_at = now;
    }
}
