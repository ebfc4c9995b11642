//! Spending aggregation over a user's full expense list.
//!
//! Everything here is a linear scan over already-fetched records; the stores
//! do no aggregation of their own.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Budget, BudgetPeriod, Expense};

/// Bucket for expenses recorded without a payment method.
pub const UNKNOWN_PAYMENT_METHOD: &str = "Unknown";

/// Share of a budget at which spending is flagged as a warning.
const WARNING_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpendingSummary {
    pub total_expenses: f64,
    pub monthly_total: f64,
    pub category_breakdown: BTreeMap<String, f64>,
    pub payment_method_breakdown: BTreeMap<String, f64>,
    pub expense_count: usize,
    pub daily_average: f64,
}

impl SpendingSummary {
    /// `monthly_total` covers every expense dated in `today`'s calendar month,
    /// including later-dated entries; `daily_average` divides it by the number
    /// of days elapsed so far.
    pub fn compute(expenses: &[Expense], today: NaiveDate) -> Self {
        let month_start = BudgetPeriod::Monthly.start_containing(today);
        let month_end = BudgetPeriod::Monthly.end_containing(today);

        let mut summary = SpendingSummary {
            total_expenses: 0.0,
            monthly_total: 0.0,
            category_breakdown: BTreeMap::new(),
            payment_method_breakdown: BTreeMap::new(),
            expense_count: expenses.len(),
            daily_average: 0.0,
        };

        for expense in expenses {
            summary.total_expenses += expense.amount;

            *summary
                .category_breakdown
                .entry(expense.category.clone())
                .or_insert(0.0) += expense.amount;

            let method = if expense.payment_method.trim().is_empty() {
                UNKNOWN_PAYMENT_METHOD
            } else {
                expense.payment_method.as_str()
            };
            *summary
                .payment_method_breakdown
                .entry(method.to_string())
                .or_insert(0.0) += expense.amount;

            if expense.date >= month_start && expense.date <= month_end {
                summary.monthly_total += expense.amount;
            }
        }

        let days_elapsed = f64::from(today.day());
        summary.daily_average = summary.monthly_total / days_elapsed;
        summary
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BudgetLevel {
    OnTrack,
    Warning,
    Exceeded,
}

/// How much of one budget has been used in its current period.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BudgetStatus {
    pub budget_id: String,
    pub category: String,
    pub period: BudgetPeriod,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub budget_amount: f64,
    pub spent: f64,
    pub remaining: f64,
    /// `None` for a zero budget.
    pub percent_used: Option<f64>,
    pub level: BudgetLevel,
}

impl BudgetStatus {
    pub fn compute(budget: &Budget, expenses: &[Expense], today: NaiveDate) -> Self {
        let period_start = budget.period.start_containing(today);
        let period_end = budget.period.end_containing(today);

        let spent: f64 = expenses
            .iter()
            .filter(|e| e.date >= period_start && e.date <= period_end)
            .filter(|e| budget.is_overall() || e.category == budget.category)
            .map(|e| e.amount)
            .sum();

        let percent_used = (budget.amount > 0.0).then(|| spent * 100.0 / budget.amount);

        let level = if spent > budget.amount {
            BudgetLevel::Exceeded
        } else if budget.amount > 0.0 && spent >= budget.amount * WARNING_RATIO {
            BudgetLevel::Warning
        } else {
            BudgetLevel::OnTrack
        };

        BudgetStatus {
            budget_id: budget.id.clone(),
            category: budget.category.clone(),
            period: budget.period,
            period_start,
            period_end,
            budget_amount: budget.amount,
            spent,
            remaining: budget.amount - spent,
            percent_used,
            level,
        }
    }

    pub fn for_budgets(budgets: &[Budget], expenses: &[Expense], today: NaiveDate) -> Vec<Self> {
        budgets
            .iter()
            .map(|budget| Self::compute(budget, expenses, today))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewExpense, OVERALL_CATEGORY};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn spend(amount: f64, date: NaiveDate, category: &str, method: &str) -> Expense {
        Expense::new(
            "alice",
            NewExpense {
                amount,
                date,
                category: category.to_string(),
                payment_method: method.to_string(),
                notes: String::new(),
            },
        )
    }

    #[test]
    fn summary_of_nothing_is_all_zero() {
        let summary = SpendingSummary::compute(&[], day(2026, 10, 1));

        assert_eq!(summary.total_expenses, 0.0);
        assert_eq!(summary.expense_count, 0);
        assert_eq!(summary.daily_average, 0.0);
        assert!(summary.category_breakdown.is_empty());
    }

    #[test]
    fn summary_breaks_down_by_category_and_payment_method() {
        let today = day(2026, 10, 10);
        let expenses = vec![
            spend(10.0, day(2026, 10, 2), "Food", "Card"),
            spend(5.0, day(2026, 10, 9), "Food", "Cash"),
            spend(100.0, day(2026, 9, 30), "Rent", "Card"),
            spend(1.0, day(2026, 10, 3), "Misc", ""),
        ];

        let summary = SpendingSummary::compute(&expenses, today);

        assert_eq!(summary.total_expenses, 116.0);
        assert_eq!(summary.expense_count, 4);
        assert_eq!(summary.category_breakdown["Food"], 15.0);
        assert_eq!(summary.category_breakdown["Rent"], 100.0);
        assert_eq!(summary.payment_method_breakdown["Card"], 110.0);
        assert_eq!(summary.payment_method_breakdown["Cash"], 5.0);
        assert_eq!(summary.payment_method_breakdown[UNKNOWN_PAYMENT_METHOD], 1.0);
    }

    #[test]
    fn monthly_total_and_daily_average_use_days_elapsed() {
        let today = day(2026, 10, 10);
        let expenses = vec![
            spend(30.0, day(2026, 10, 1), "Food", "Card"),
            spend(20.0, day(2026, 10, 10), "Food", "Card"),
            // Later this month still counts; the previous and next months do not.
            spend(70.0, day(2026, 10, 25), "Food", "Card"),
            spend(500.0, day(2026, 9, 30), "Food", "Card"),
            spend(9.0, day(2026, 11, 1), "Food", "Card"),
        ];

        let summary = SpendingSummary::compute(&expenses, today);

        assert_eq!(summary.monthly_total, 120.0);
        assert_eq!(summary.daily_average, 12.0);
        assert_eq!(summary.total_expenses, 629.0);
    }

    #[test]
    fn first_of_month_divides_by_one() {
        let today = day(2026, 11, 1);
        let expenses = vec![spend(42.0, today, "Food", "Card")];

        let summary = SpendingSummary::compute(&expenses, today);

        assert_eq!(summary.daily_average, 42.0);
    }

    #[test]
    fn category_budget_counts_only_its_category_in_period() {
        let today = day(2026, 10, 15);
        let budget = Budget::new("alice", "Food", 100.0, BudgetPeriod::Monthly);
        let expenses = vec![
            spend(50.0, day(2026, 10, 1), "Food", "Card"),
            spend(35.0, day(2026, 10, 14), "Food", "Card"),
            spend(999.0, day(2026, 10, 14), "Rent", "Card"),
            spend(999.0, day(2026, 9, 30), "Food", "Card"),
        ];

        let status = BudgetStatus::compute(&budget, &expenses, today);

        assert_eq!(status.spent, 85.0);
        assert_eq!(status.remaining, 15.0);
        assert_eq!(status.percent_used, Some(85.0));
        assert_eq!(status.level, BudgetLevel::Warning);
        assert_eq!(status.period_start, day(2026, 10, 1));
        assert_eq!(status.period_end, day(2026, 10, 31));
    }

    #[test]
    fn later_dated_spending_in_the_period_counts_against_the_budget() {
        let today = day(2026, 10, 10);
        let budget = Budget::new("alice", OVERALL_CATEGORY, 80.0, BudgetPeriod::Monthly);
        let expenses = vec![
            spend(30.0, day(2026, 10, 1), "Food", "Card"),
            spend(70.0, day(2026, 10, 25), "Rent", "Card"),
        ];

        let status = BudgetStatus::compute(&budget, &expenses, today);
        let summary = SpendingSummary::compute(&expenses, today);

        assert_eq!(status.spent, 100.0);
        assert_eq!(status.level, BudgetLevel::Exceeded);
        assert_eq!(summary.monthly_total, 100.0);
        assert_eq!(summary.daily_average, 10.0);
    }

    #[test]
    fn overall_budget_counts_every_category() {
        let today = day(2026, 10, 15);
        let budget = Budget::new("alice", OVERALL_CATEGORY, 100.0, BudgetPeriod::Monthly);
        let expenses = vec![
            spend(60.0, day(2026, 10, 2), "Food", "Card"),
            spend(60.0, day(2026, 10, 3), "Rent", "Card"),
        ];

        let status = BudgetStatus::compute(&budget, &expenses, today);

        assert_eq!(status.spent, 120.0);
        assert_eq!(status.remaining, -20.0);
        assert_eq!(status.level, BudgetLevel::Exceeded);
    }

    #[test]
    fn weekly_budget_window_starts_monday() {
        // 2026-10-15 is a Thursday; the week began on Monday 2026-10-12.
        let today = day(2026, 10, 15);
        let budget = Budget::new("alice", "Food", 50.0, BudgetPeriod::Weekly);
        let expenses = vec![
            spend(10.0, day(2026, 10, 11), "Food", "Card"),
            spend(10.0, day(2026, 10, 12), "Food", "Card"),
        ];

        let status = BudgetStatus::compute(&budget, &expenses, today);

        assert_eq!(status.spent, 10.0);
        assert_eq!(status.level, BudgetLevel::OnTrack);
    }

    #[test]
    fn zero_budget_has_no_percentage() {
        let today = day(2026, 10, 15);
        let budget = Budget::new("alice", "Food", 0.0, BudgetPeriod::Monthly);

        let untouched = BudgetStatus::compute(&budget, &[], today);
        assert_eq!(untouched.percent_used, None);
        assert_eq!(untouched.level, BudgetLevel::OnTrack);

        let spent = BudgetStatus::compute(
            &budget,
            &[spend(1.0, today, "Food", "Card")],
            today,
        );
        assert_eq!(spent.level, BudgetLevel::Exceeded);
    }
}
