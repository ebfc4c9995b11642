pub mod session;

pub use session::{require_user, CurrentUser, SESSION_EMAIL_KEY, SESSION_USER_ID_KEY};
