pub mod budget;
pub mod expense;

pub use budget::{Budget, BudgetPatch, BudgetPeriod, OVERALL_CATEGORY};
pub use expense::{Expense, ExpensePatch, NewExpense};
