pub mod validation;

pub use validation::{non_blank, ValidatedJson};
