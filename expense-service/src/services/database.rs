use crate::models::{Budget, Expense};
use mongodb::{
    bson::doc, options::IndexOptions, Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

pub const EXPENSES_COLLECTION: &str = "expenses";
pub const BUDGETS_COLLECTION: &str = "budgets";

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for expense-service");

        let by_created = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_created_lookup".to_string())
                    .build(),
            )
            .build();

        let by_date = IndexModel::builder()
            .keys(doc! { "user_id": 1, "date": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_date_lookup".to_string())
                    .build(),
            )
            .build();

        let by_category = IndexModel::builder()
            .keys(doc! { "user_id": 1, "category": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_category_lookup".to_string())
                    .build(),
            )
            .build();

        self.expenses()
            .create_indexes([by_created, by_date, by_category], None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create indexes on expenses collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created indexes on expenses.(user_id, created_at|date|category)");

        // One budget per (user, category); upserts rely on it.
        let budget_key = IndexModel::builder()
            .keys(doc! { "user_id": 1, "category": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_category_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.budgets()
            .create_index(budget_key, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create unique index on budgets collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created unique index on budgets.(user_id, category)");

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn expenses(&self) -> Collection<Expense> {
        self.db.collection(EXPENSES_COLLECTION)
    }

    pub fn budgets(&self) -> Collection<Budget> {
        self.db.collection(BUDGETS_COLLECTION)
    }
}
