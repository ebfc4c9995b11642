use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use service_core::error::AppError;
use tower_sessions::Session;

use crate::dtos::auth::{LoginRequest, LoginResponse, MeResponse};
use crate::dtos::SuccessResponse;
use crate::middleware::{CurrentUser, SESSION_EMAIL_KEY, SESSION_USER_ID_KEY};
use crate::startup::AppState;

const DASHBOARD_PATH: &str = "/dashboard";

fn session_error(e: impl std::fmt::Display) -> AppError {
    tracing::error!(error = %e, "Session store failure");
    AppError::InternalError(anyhow::anyhow!("Session store failure"))
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(payload) =
        payload.map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;

    let id_token = payload
        .id_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No token provided")))?;

    let identity = state.identity.verify(&id_token).await.map_err(|e| {
        tracing::warn!(error = %e, "Login rejected");
        AppError::Unauthorized(anyhow::anyhow!("Invalid token"))
    })?;

    // New session id on privilege change.
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(SESSION_USER_ID_KEY, &identity.user_id)
        .await
        .map_err(session_error)?;
    if let Some(email) = identity.email.as_ref() {
        session
            .insert(SESSION_EMAIL_KEY, email)
            .await
            .map_err(session_error)?;
    }

    tracing::info!(user_id = %identity.user_id, "User logged in");

    Ok(Json(LoginResponse {
        success: true,
        redirect: DASHBOARD_PATH.to_string(),
    }))
}

pub async fn logout(session: Session) -> Result<Json<SuccessResponse>, AppError> {
    if let Ok(Some(user_id)) = session.get::<String>(SESSION_USER_ID_KEY).await {
        tracing::info!(user_id = %user_id, "User logged out");
    }
    session.flush().await.map_err(session_error)?;

    Ok(Json(SuccessResponse::ok()))
}

pub async fn me(user: CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        user_id: user.user_id,
        email: user.email,
    })
}
