use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Budget category that spans every expense category.
pub const OVERALL_CATEGORY: &str = "Overall";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    /// First day of the period containing `today`. Weeks start on Monday.
    pub fn start_containing(self, today: NaiveDate) -> NaiveDate {
        match self {
            BudgetPeriod::Weekly => {
                today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
            }
            BudgetPeriod::Monthly => today.with_day(1).unwrap_or(today),
            BudgetPeriod::Yearly => today.with_ordinal(1).unwrap_or(today),
        }
    }

    /// Last day of the period containing `today`. Weeks end on Sunday.
    pub fn end_containing(self, today: NaiveDate) -> NaiveDate {
        match self {
            BudgetPeriod::Weekly => self.start_containing(today) + Duration::days(6),
            BudgetPeriod::Monthly => {
                let (year, month) = if today.month() == 12 {
                    (today.year() + 1, 1)
                } else {
                    (today.year(), today.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1)
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(today)
            }
            BudgetPeriod::Yearly => NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today),
        }
    }
}

impl std::fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        };
        f.write_str(s)
    }
}

/// Spending limit for one category. `(user_id, category)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub period: BudgetPeriod,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetPatch {
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub period: Option<BudgetPeriod>,
}

impl Budget {
    pub fn new(user_id: &str, category: &str, amount: f64, period: BudgetPeriod) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            category: category.to_string(),
            amount,
            period,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_overall(&self) -> bool {
        self.category == OVERALL_CATEGORY
    }

    pub fn apply(&mut self, patch: BudgetPatch, now: DateTime<Utc>) {
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(period) = patch.period {
            self.period = period;
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekly_period_starts_on_monday() {
        // 2026-10-18 is a Sunday.
        assert_eq!(
            BudgetPeriod::Weekly.start_containing(day(2026, 10, 18)),
            day(2026, 10, 12)
        );
        assert_eq!(
            BudgetPeriod::Weekly.start_containing(day(2026, 10, 12)),
            day(2026, 10, 12)
        );
    }

    #[test]
    fn monthly_and_yearly_periods() {
        assert_eq!(
            BudgetPeriod::Monthly.start_containing(day(2026, 2, 28)),
            day(2026, 2, 1)
        );
        assert_eq!(
            BudgetPeriod::Yearly.start_containing(day(2026, 7, 4)),
            day(2026, 1, 1)
        );
    }

    #[test]
    fn period_ends_cover_the_whole_window() {
        // 2026-10-14 is a Wednesday.
        assert_eq!(
            BudgetPeriod::Weekly.end_containing(day(2026, 10, 14)),
            day(2026, 10, 18)
        );
        assert_eq!(
            BudgetPeriod::Monthly.end_containing(day(2026, 2, 3)),
            day(2026, 2, 28)
        );
        assert_eq!(
            BudgetPeriod::Monthly.end_containing(day(2026, 12, 31)),
            day(2026, 12, 31)
        );
        assert_eq!(
            BudgetPeriod::Yearly.end_containing(day(2026, 7, 4)),
            day(2026, 12, 31)
        );
    }

    #[test]
    fn period_defaults_to_monthly_when_missing() {
        let now = mongodb::bson::DateTime::now();
        let doc = mongodb::bson::doc! {
            "_id": "b1",
            "user_id": "u1",
            "category": "Food",
            "amount": 300.0,
            "created_at": now,
            "updated_at": now,
        };
        let budget: Budget = mongodb::bson::from_document(doc).unwrap();

        assert_eq!(budget.period, BudgetPeriod::Monthly);
    }

    #[test]
    fn overall_budget_is_recognised() {
        let budget = Budget::new("u1", OVERALL_CATEGORY, 1000.0, BudgetPeriod::Monthly);
        assert!(budget.is_overall());
    }
}
