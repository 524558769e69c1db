use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tower_sessions::Session;

use aspira_core::{AppError, AuthError};

use crate::dto::{GenericMessageResponse, LoginRequest, LoginResponse, RegisterRequest};
use crate::engines::{EngineRegistry, client_key};
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /auth/login - Authenticate with email+password.
pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let client_key = client_key(&session).await?;
    let engine = state.engines.engine_for(client_key).await;

    if let Err(error) = engine
        .session
        .sign_in(&payload.email, &payload.password)
        .await
    {
        return Err(map_auth_error(error).into());
    }

    engine.session.process_pending().await;

    // OWASP Session Management: regenerate session ID on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    EngineRegistry::sync_idle(&engine).await;

    let snapshot = engine.session.snapshot().await;
    let mfa_pending = snapshot.mfa_required && !snapshot.mfa_verified;
    Ok(Json(LoginResponse {
        status: if mfa_pending {
            "mfa_required".to_owned()
        } else {
            "authenticated".to_owned()
        },
        mfa_pending,
    }))
}

/// POST /auth/register - Create a provider account with email+password.
///
/// Registration never grants administrator standing; the invitation flow
/// creates the directory profile out-of-band.
pub async fn register_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<GenericMessageResponse>> {
    let client_key = client_key(&session).await?;
    let engine = state.engines.engine_for(client_key).await;

    engine
        .session
        .sign_up(&payload.email, &payload.password)
        .await
        .map_err(map_auth_error)?;

    engine.session.process_pending().await;
    EngineRegistry::sync_idle(&engine).await;

    // Generic response to prevent account enumeration.
    Ok(Json(GenericMessageResponse {
        message: "check your inbox to finish setting up your account".to_owned(),
    }))
}

/// POST /auth/logout - End the session and drop the client engine.
pub async fn logout_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<StatusCode> {
    let client_key = client_key(&session).await?;

    if let Some(engine) = state.engines.existing(client_key).await {
        engine.session.sign_out().await;
    }
    state.engines.remove(client_key).await;

    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Maps provider rejections onto HTTP error categories. Credential and
/// challenge failures stay deliberately generic.
pub(super) fn map_auth_error(error: AuthError) -> AppError {
    match error {
        AuthError::Provider(detail) => {
            AppError::Internal(format!("identity provider error: {detail}"))
        }
        other => AppError::Unauthorized(other.to_string()),
    }
}
