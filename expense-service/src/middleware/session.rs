use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;
use tower_sessions::Session;

pub const SESSION_USER_ID_KEY: &str = "user_id";
pub const SESSION_EMAIL_KEY: &str = "email";

/// The authenticated caller, established from the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: String,
    pub email: Option<String>,
}

/// Reject requests without a logged-in session, otherwise expose the caller
/// to handlers as a [`CurrentUser`] extension.
pub async fn require_user(
    session: Session,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id: Option<String> = session.get(SESSION_USER_ID_KEY).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to read session");
        AppError::InternalError(anyhow::anyhow!("Failed to read session"))
    })?;

    let Some(user_id) = user_id else {
        return Err(AppError::Unauthorized(anyhow::anyhow!("Not authenticated")));
    };

    let email: Option<String> = session.get(SESSION_EMAIL_KEY).await.unwrap_or(None);

    tracing::Span::current().record("user_id", user_id.as_str());
    req.extensions_mut().insert(CurrentUser { user_id, email });

    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Not authenticated")))
    }
}
