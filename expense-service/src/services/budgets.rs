//! Budget data access. Budgets are upserted by `(user_id, category)`.

use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, DateTime as BsonDateTime, Document},
    error::{CommandError, Error as MongoError, ErrorKind, WriteError, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Collection,
};
use service_core::error::AppError;
use uuid::Uuid;

use super::{ensure_owner, not_found, MongoDb};
use crate::models::{Budget, BudgetPatch, BudgetPeriod};

pub(crate) const KIND: &str = "Budget";

pub(crate) fn category_conflict(category: &str) -> AppError {
    AppError::Conflict(anyhow::anyhow!(
        "A budget for category '{}' already exists",
        category
    ))
}

const DUPLICATE_KEY: i32 = 11000;

/// True when the server rejected a write on a unique index.
fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Command(CommandError { code, .. }) => *code == DUPLICATE_KEY,
        ErrorKind::Write(WriteFailure::WriteError(WriteError { code, .. })) => {
            *code == DUPLICATE_KEY
        }
        _ => false,
    }
}

/// The `(user_id, category)` index is the final word on collisions.
fn category_write_error(err: MongoError, category: &str) -> AppError {
    if is_duplicate_key(&err) {
        category_conflict(category)
    } else {
        err.into()
    }
}

#[async_trait]
pub trait BudgetStore: Send + Sync {
    /// Create or overwrite the caller's budget for `category`.
    ///
    /// An existing budget keeps its id and `created_at`.
    async fn set_budget(
        &self,
        user_id: &str,
        category: &str,
        amount: f64,
        period: BudgetPeriod,
    ) -> Result<Budget, AppError>;

    /// All of the caller's budgets, ordered by category.
    async fn get_user_budgets(&self, user_id: &str) -> Result<Vec<Budget>, AppError>;

    async fn get_budget_by_id(&self, budget_id: &str, user_id: &str) -> Result<Budget, AppError>;

    async fn update_budget(
        &self,
        budget_id: &str,
        user_id: &str,
        patch: BudgetPatch,
    ) -> Result<Budget, AppError>;

    async fn delete_budget(&self, budget_id: &str, user_id: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct MongoBudgetStore {
    collection: Collection<Budget>,
}

impl MongoBudgetStore {
    pub fn new(db: &MongoDb) -> Self {
        Self {
            collection: db.budgets(),
        }
    }

    async fn find_owned(&self, budget_id: &str, user_id: &str) -> Result<Budget, AppError> {
        let budget = self
            .collection
            .find_one(doc! { "_id": budget_id }, None)
            .await?
            .ok_or_else(|| not_found(KIND))?;

        ensure_owner(KIND, budget_id, &budget.user_id, user_id)?;
        Ok(budget)
    }
}

fn after_update() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

#[async_trait]
impl BudgetStore for MongoBudgetStore {
    async fn set_budget(
        &self,
        user_id: &str,
        category: &str,
        amount: f64,
        period: BudgetPeriod,
    ) -> Result<Budget, AppError> {
        let now = BsonDateTime::from_chrono(Utc::now());
        let update = doc! {
            "$set": {
                "amount": amount,
                "period": to_bson(&period)?,
                "updated_at": now,
            },
            "$setOnInsert": {
                "_id": Uuid::new_v4().to_string(),
                "created_at": now,
            },
        };

        let mut options = after_update();
        options.upsert = Some(true);

        let budget = self
            .collection
            .find_one_and_update(doc! { "user_id": user_id, "category": category }, update, options)
            .await
            .map_err(|e| category_write_error(e, category))?
            .ok_or_else(|| {
                AppError::DatabaseError(anyhow::anyhow!("Budget upsert returned no document"))
            })?;

        tracing::info!(
            budget_id = %budget.id,
            user_id = %user_id,
            category = %category,
            amount,
            "Budget upserted"
        );
        Ok(budget)
    }

    async fn get_user_budgets(&self, user_id: &str) -> Result<Vec<Budget>, AppError> {
        let options = FindOptions::builder().sort(doc! { "category": 1 }).build();
        let cursor = self
            .collection
            .find(doc! { "user_id": user_id }, options)
            .await?;
        let budgets: Vec<Budget> = cursor.try_collect().await?;
        Ok(budgets)
    }

    async fn get_budget_by_id(&self, budget_id: &str, user_id: &str) -> Result<Budget, AppError> {
        self.find_owned(budget_id, user_id).await
    }

    async fn update_budget(
        &self,
        budget_id: &str,
        user_id: &str,
        patch: BudgetPatch,
    ) -> Result<Budget, AppError> {
        let current = self.find_owned(budget_id, user_id).await?;

        let category = patch.category.clone().unwrap_or(current.category);

        let mut set = Document::new();
        if patch.category.is_some() {
            set.insert("category", category.as_str());
        }
        if let Some(amount) = patch.amount {
            set.insert("amount", amount);
        }
        if let Some(period) = patch.period {
            set.insert("period", to_bson(&period)?);
        }
        set.insert("updated_at", BsonDateTime::from_chrono(Utc::now()));

        self.collection
            .find_one_and_update(
                doc! { "_id": budget_id, "user_id": user_id },
                doc! { "$set": set },
                after_update(),
            )
            .await
            .map_err(|e| category_write_error(e, &category))?
            .ok_or_else(|| not_found(KIND))
    }

    async fn delete_budget(&self, budget_id: &str, user_id: &str) -> Result<(), AppError> {
        self.find_owned(budget_id, user_id).await?;

        let result = self
            .collection
            .delete_one(doc! { "_id": budget_id, "user_id": user_id }, None)
            .await?;

        if result.deleted_count == 0 {
            return Err(not_found(KIND));
        }
        Ok(())
    }
}
