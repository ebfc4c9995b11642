//! Store behaviour against a live MongoDB.
//!
//! Run with `cargo test -- --ignored` while a server listens on `MONGODB_URI`.

mod common;

use chrono::NaiveDate;
use common::{MongoTestDb, ALICE, BOB};
use expense_service::models::{BudgetPatch, BudgetPeriod, NewExpense};
use expense_service::services::{BudgetStore, ExpenseStore};
use service_core::error::AppError;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn spend(amount: f64, date: NaiveDate) -> NewExpense {
    NewExpense {
        amount,
        date,
        category: "Food".to_string(),
        payment_method: "Card".to_string(),
        notes: String::new(),
    }
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn set_budget_upsert_keeps_id_and_created_at() {
    let mongo = MongoTestDb::create().await;
    let store = mongo.budgets();

    let first = store
        .set_budget(ALICE, "Food", 300.0, BudgetPeriod::Monthly)
        .await
        .unwrap();
    let second = store
        .set_budget(ALICE, "Food", 450.0, BudgetPeriod::Weekly)
        .await
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.amount, 450.0);
    assert_eq!(second.period, BudgetPeriod::Weekly);
    assert!(second.updated_at >= first.updated_at);

    // Same category for another user is a separate budget.
    let other = store
        .set_budget(BOB, "Food", 10.0, BudgetPeriod::Monthly)
        .await
        .unwrap();
    assert_ne!(other.id, first.id);

    assert_eq!(store.get_user_budgets(ALICE).await.unwrap().len(), 1);

    mongo.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn renaming_a_budget_onto_a_taken_category_conflicts() {
    let mongo = MongoTestDb::create().await;
    let store = mongo.budgets();

    store
        .set_budget(ALICE, "Food", 300.0, BudgetPeriod::Monthly)
        .await
        .unwrap();
    let rent = store
        .set_budget(ALICE, "Rent", 900.0, BudgetPeriod::Monthly)
        .await
        .unwrap();

    let clash = store
        .update_budget(
            &rent.id,
            ALICE,
            BudgetPatch {
                category: Some("Food".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(clash, Err(AppError::Conflict(_))));

    // Keeping its own category is not a clash.
    let same = store
        .update_budget(
            &rent.id,
            ALICE,
            BudgetPatch {
                category: Some("Rent".to_string()),
                amount: Some(950.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(same.amount, 950.0);

    let foreign = store
        .update_budget(&rent.id, BOB, BudgetPatch::default())
        .await;
    assert!(matches!(foreign, Err(AppError::Forbidden(_))));

    mongo.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn date_range_is_inclusive_and_newest_date_first() {
    let mongo = MongoTestDb::create().await;
    let store = mongo.expenses();

    for (amount, date) in [
        (1.0, day(2026, 2, 28)),
        (2.0, day(2026, 3, 1)),
        (3.0, day(2026, 3, 15)),
        (4.0, day(2026, 3, 31)),
        (5.0, day(2026, 4, 1)),
    ] {
        store.add_expense(ALICE, spend(amount, date)).await.unwrap();
    }
    store
        .add_expense(BOB, spend(99.0, day(2026, 3, 10)))
        .await
        .unwrap();

    let march = store
        .get_expenses_by_date_range(ALICE, day(2026, 3, 1), day(2026, 3, 31))
        .await
        .unwrap();

    let dates: Vec<NaiveDate> = march.iter().map(|e| e.date).collect();
    assert_eq!(
        dates,
        vec![day(2026, 3, 31), day(2026, 3, 15), day(2026, 3, 1)]
    );
    assert!(march.iter().all(|e| e.user_id == ALICE));

    mongo.cleanup().await;
}
