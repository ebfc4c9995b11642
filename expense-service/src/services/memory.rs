//! In-process stores for local development (`STORE_BACKEND=memory`) and tests.
//!
//! Ordering, ownership and upsert rules match the MongoDB stores.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::budgets::{category_conflict, KIND as BUDGET};
use super::expenses::KIND as EXPENSE;
use super::{ensure_owner, not_found, BudgetStore, ExpenseStore};
use crate::models::{Budget, BudgetPatch, BudgetPeriod, Expense, ExpensePatch, NewExpense};

#[derive(Clone, Default)]
pub struct MemoryExpenseStore {
    expenses: Arc<RwLock<HashMap<String, Expense>>>,
}

impl MemoryExpenseStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn owned(&self, expense_id: &str, user_id: &str) -> Result<Expense, AppError> {
        let expenses = self.expenses.read().await;
        let expense = expenses.get(expense_id).ok_or_else(|| not_found(EXPENSE))?;
        ensure_owner(EXPENSE, expense_id, &expense.user_id, user_id)?;
        Ok(expense.clone())
    }

    async fn filtered<F>(&self, keep: F) -> Vec<Expense>
    where
        F: Fn(&Expense) -> bool,
    {
        self.expenses
            .read()
            .await
            .values()
            .filter(|e| keep(*e))
            .cloned()
            .collect()
    }
}

fn newest_created_first(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl ExpenseStore for MemoryExpenseStore {
    async fn add_expense(&self, user_id: &str, expense: NewExpense) -> Result<Expense, AppError> {
        let expense = Expense::new(user_id, expense);
        self.expenses
            .write()
            .await
            .insert(expense.id.clone(), expense.clone());
        Ok(expense)
    }

    async fn get_user_expenses(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Expense>, AppError> {
        let mut expenses = self.filtered(|e| e.user_id == user_id).await;
        newest_created_first(&mut expenses);
        if let Some(limit) = limit {
            expenses.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(expenses)
    }

    async fn get_expense_by_id(
        &self,
        expense_id: &str,
        user_id: &str,
    ) -> Result<Expense, AppError> {
        self.owned(expense_id, user_id).await
    }

    async fn update_expense(
        &self,
        expense_id: &str,
        user_id: &str,
        patch: ExpensePatch,
    ) -> Result<Expense, AppError> {
        let mut expenses = self.expenses.write().await;
        let expense = expenses
            .get_mut(expense_id)
            .ok_or_else(|| not_found(EXPENSE))?;
        ensure_owner(EXPENSE, expense_id, &expense.user_id, user_id)?;

        expense.apply(patch, Utc::now());
        Ok(expense.clone())
    }

    async fn delete_expense(&self, expense_id: &str, user_id: &str) -> Result<(), AppError> {
        self.owned(expense_id, user_id).await?;
        self.expenses.write().await.remove(expense_id);
        Ok(())
    }

    async fn get_expenses_by_date_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Expense>, AppError> {
        let mut expenses = self
            .filtered(|e| e.user_id == user_id && e.date >= start && e.date <= end)
            .await;
        expenses.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(expenses)
    }

    async fn get_expenses_by_category(
        &self,
        user_id: &str,
        category: &str,
    ) -> Result<Vec<Expense>, AppError> {
        let mut expenses = self
            .filtered(|e| e.user_id == user_id && e.category == category)
            .await;
        newest_created_first(&mut expenses);
        Ok(expenses)
    }
}

#[derive(Clone, Default)]
pub struct MemoryBudgetStore {
    budgets: Arc<RwLock<HashMap<String, Budget>>>,
}

impl MemoryBudgetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BudgetStore for MemoryBudgetStore {
    async fn set_budget(
        &self,
        user_id: &str,
        category: &str,
        amount: f64,
        period: BudgetPeriod,
    ) -> Result<Budget, AppError> {
        let mut budgets = self.budgets.write().await;

        let existing = budgets
            .values_mut()
            .find(|b| b.user_id == user_id && b.category == category);

        if let Some(budget) = existing {
            budget.apply(
                BudgetPatch {
                    category: None,
                    amount: Some(amount),
                    period: Some(period),
                },
                Utc::now(),
            );
            return Ok(budget.clone());
        }

        let budget = Budget::new(user_id, category, amount, period);
        budgets.insert(budget.id.clone(), budget.clone());
        Ok(budget)
    }

    async fn get_user_budgets(&self, user_id: &str) -> Result<Vec<Budget>, AppError> {
        let mut budgets: Vec<Budget> = self
            .budgets
            .read()
            .await
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        budgets.sort_by(|a, b| a.category.cmp(&b.category));
        Ok(budgets)
    }

    async fn get_budget_by_id(&self, budget_id: &str, user_id: &str) -> Result<Budget, AppError> {
        let budgets = self.budgets.read().await;
        let budget = budgets.get(budget_id).ok_or_else(|| not_found(BUDGET))?;
        ensure_owner(BUDGET, budget_id, &budget.user_id, user_id)?;
        Ok(budget.clone())
    }

    async fn update_budget(
        &self,
        budget_id: &str,
        user_id: &str,
        patch: BudgetPatch,
    ) -> Result<Budget, AppError> {
        let mut budgets = self.budgets.write().await;

        let current = budgets.get(budget_id).ok_or_else(|| not_found(BUDGET))?;
        ensure_owner(BUDGET, budget_id, &current.user_id, user_id)?;

        if let Some(category) = patch.category.as_deref() {
            let taken = budgets
                .values()
                .any(|b| b.id != budget_id && b.user_id == user_id && b.category == category);
            if taken {
                return Err(category_conflict(category));
            }
        }

        let budget = budgets
            .get_mut(budget_id)
            .ok_or_else(|| not_found(BUDGET))?;
        budget.apply(patch, Utc::now());
        Ok(budget.clone())
    }

    async fn delete_budget(&self, budget_id: &str, user_id: &str) -> Result<(), AppError> {
        let mut budgets = self.budgets.write().await;
        let budget = budgets.get(budget_id).ok_or_else(|| not_found(BUDGET))?;
        ensure_owner(BUDGET, budget_id, &budget.user_id, user_id)?;
        budgets.remove(budget_id);
        Ok(())
    }
}
