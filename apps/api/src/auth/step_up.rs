use axum::Json;
use axum::extract::State;
use tower_sessions::Session;

use aspira_core::AppError;

use crate::dto::{MfaVerifyRequest, SessionStateResponse};
use crate::engines::{EngineRegistry, client_key};
use crate::error::ApiResult;
use crate::state::AppState;

use super::sign_in::map_auth_error;

/// POST /auth/login/mfa - Complete the step-up challenge for this session.
pub async fn mfa_verify_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<MfaVerifyRequest>,
) -> ApiResult<Json<SessionStateResponse>> {
    let client_key = client_key(&session).await?;
    let engine = state.engines.engine_for(client_key).await;

    engine
        .session
        .verify_mfa_challenge(&payload.factor_id, &payload.code)
        .await
        .map_err(map_auth_error)?;

    // OWASP Session Management: regenerate session ID on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    EngineRegistry::sync_idle(&engine).await;

    let snapshot = engine.session.snapshot().await;
    Ok(Json(SessionStateResponse::from_snapshot(&snapshot)))
}
