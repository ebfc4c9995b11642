//! Expense data access.
//!
//! Every lookup by id verifies ownership before returning or mutating the
//! record: a missing record is `NotFound`, a record owned by someone else is
//! `Forbidden`.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, DateTime as BsonDateTime, Document},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Collection,
};
use service_core::error::AppError;

use super::{ensure_owner, not_found, MongoDb};
use crate::models::{Expense, ExpensePatch, NewExpense};

pub(crate) const KIND: &str = "Expense";

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn add_expense(&self, user_id: &str, expense: NewExpense) -> Result<Expense, AppError>;

    /// Newest first by creation time, truncated to `limit` when given.
    async fn get_user_expenses(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Expense>, AppError>;

    async fn get_expense_by_id(&self, expense_id: &str, user_id: &str)
        -> Result<Expense, AppError>;

    async fn update_expense(
        &self,
        expense_id: &str,
        user_id: &str,
        patch: ExpensePatch,
    ) -> Result<Expense, AppError>;

    async fn delete_expense(&self, expense_id: &str, user_id: &str) -> Result<(), AppError>;

    /// Expenses dated within `start..=end`, newest date first.
    async fn get_expenses_by_date_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Expense>, AppError>;

    async fn get_expenses_by_category(
        &self,
        user_id: &str,
        category: &str,
    ) -> Result<Vec<Expense>, AppError>;
}

#[derive(Clone)]
pub struct MongoExpenseStore {
    collection: Collection<Expense>,
}

impl MongoExpenseStore {
    pub fn new(db: &MongoDb) -> Self {
        Self {
            collection: db.expenses(),
        }
    }

    async fn find_owned(&self, expense_id: &str, user_id: &str) -> Result<Expense, AppError> {
        let expense = self
            .collection
            .find_one(doc! { "_id": expense_id }, None)
            .await?
            .ok_or_else(|| not_found(KIND))?;

        ensure_owner(KIND, expense_id, &expense.user_id, user_id)?;
        Ok(expense)
    }

    async fn find_sorted(
        &self,
        filter: Document,
        sort: Document,
        limit: Option<i64>,
    ) -> Result<Vec<Expense>, AppError> {
        let options = FindOptions::builder().sort(sort).limit(limit).build();
        let cursor = self.collection.find(filter, options).await?;
        let expenses: Vec<Expense> = cursor.try_collect().await?;
        Ok(expenses)
    }
}

fn patch_to_set(patch: ExpensePatch) -> Document {
    let mut set = Document::new();
    if let Some(amount) = patch.amount {
        set.insert("amount", Bson::Double(amount));
    }
    if let Some(date) = patch.date {
        set.insert("date", date.to_string());
    }
    if let Some(category) = patch.category {
        set.insert("category", category);
    }
    if let Some(payment_method) = patch.payment_method {
        set.insert("payment_method", payment_method);
    }
    if let Some(notes) = patch.notes {
        set.insert("notes", notes);
    }
    set.insert("updated_at", BsonDateTime::from_chrono(Utc::now()));
    set
}

#[async_trait]
impl ExpenseStore for MongoExpenseStore {
    async fn add_expense(&self, user_id: &str, expense: NewExpense) -> Result<Expense, AppError> {
        let expense = Expense::new(user_id, expense);
        self.collection.insert_one(&expense, None).await?;

        tracing::info!(
            expense_id = %expense.id,
            user_id = %user_id,
            category = %expense.category,
            "Expense stored"
        );
        Ok(expense)
    }

    async fn get_user_expenses(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Expense>, AppError> {
        self.find_sorted(
            doc! { "user_id": user_id },
            doc! { "created_at": -1 },
            limit,
        )
        .await
    }

    async fn get_expense_by_id(
        &self,
        expense_id: &str,
        user_id: &str,
    ) -> Result<Expense, AppError> {
        self.find_owned(expense_id, user_id).await
    }

    async fn update_expense(
        &self,
        expense_id: &str,
        user_id: &str,
        patch: ExpensePatch,
    ) -> Result<Expense, AppError> {
        self.find_owned(expense_id, user_id).await?;

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection
            .find_one_and_update(
                doc! { "_id": expense_id, "user_id": user_id },
                doc! { "$set": patch_to_set(patch) },
                options,
            )
            .await?
            .ok_or_else(|| not_found(KIND))
    }

    async fn delete_expense(&self, expense_id: &str, user_id: &str) -> Result<(), AppError> {
        self.find_owned(expense_id, user_id).await?;

        let result = self
            .collection
            .delete_one(doc! { "_id": expense_id, "user_id": user_id }, None)
            .await?;

        if result.deleted_count == 0 {
            return Err(not_found(KIND));
        }
        Ok(())
    }

    async fn get_expenses_by_date_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Expense>, AppError> {
        self.find_sorted(
            doc! {
                "user_id": user_id,
                "date": { "$gte": start.to_string(), "$lte": end.to_string() },
            },
            doc! { "date": -1, "created_at": -1 },
            None,
        )
        .await
    }

    async fn get_expenses_by_category(
        &self,
        user_id: &str,
        category: &str,
    ) -> Result<Vec<Expense>, AppError> {
        self.find_sorted(
            doc! { "user_id": user_id, "category": category },
            doc! { "created_at": -1 },
            None,
        )
        .await
    }
}
