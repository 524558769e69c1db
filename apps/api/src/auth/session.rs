use axum::Json;
use axum::extract::State;
use tower_sessions::Session;

use crate::dto::SessionStateResponse;
use crate::engines::client_key;
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /auth/session - Current session snapshot for the SPA shell.
pub async fn session_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<SessionStateResponse>> {
    let client_key = client_key(&session).await?;
    let engine = state.engines.engine_for(client_key).await;

    let snapshot = engine.session.snapshot().await;
    Ok(Json(SessionStateResponse::from_snapshot(&snapshot)))
}
