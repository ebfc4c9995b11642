pub mod budgets;
pub mod database;
pub mod expenses;
pub mod identity;
pub mod memory;
pub mod metrics;
pub mod reports;

pub use budgets::{BudgetStore, MongoBudgetStore};
pub use database::MongoDb;
pub use expenses::{ExpenseStore, MongoExpenseStore};
pub use identity::{IdentityVerifier, JwtIdentityVerifier, VerifiedIdentity};
pub use memory::{MemoryBudgetStore, MemoryExpenseStore};
pub use metrics::{get_metrics, init_metrics};
pub use reports::{BudgetLevel, BudgetStatus, SpendingSummary};

use service_core::error::AppError;

/// Fail with `Forbidden` unless `caller` owns the record.
pub(crate) fn ensure_owner(
    kind: &'static str,
    record_id: &str,
    owner: &str,
    caller: &str,
) -> Result<(), AppError> {
    if owner == caller {
        return Ok(());
    }

    tracing::warn!(
        kind,
        record_id = %record_id,
        caller = %caller,
        "Rejected access to record owned by another user"
    );
    ::metrics::counter!("authorization_denied_total", "kind" => kind).increment(1);

    Err(AppError::Forbidden(anyhow::anyhow!(
        "{} not found or unauthorized",
        kind
    )))
}

pub(crate) fn not_found(kind: &'static str) -> AppError {
    AppError::NotFound(anyhow::anyhow!("{} not found", kind))
}
