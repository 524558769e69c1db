use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use tower_sessions::Session;

use aspira_application::ViewRequest;
use aspira_domain::ModuleKey;

use crate::dto::DecisionResponse;
use crate::engines::client_key;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DecisionQuery {
    /// The protected location the SPA wants to render.
    pub return_to: String,
    /// Module key for module-tagged views.
    pub module: Option<String>,
}

/// GET /gate/decision - Evaluate the access gate for a protected view.
///
/// The SPA router calls this on every navigation into the back office and
/// renders the view, the sign-in screen, or a denial screen accordingly.
pub async fn decision_handler(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<DecisionQuery>,
) -> ApiResult<Json<DecisionResponse>> {
    let view = match query.module {
        Some(module) => ViewRequest::with_module(query.return_to, ModuleKey::new(module)?),
        None => ViewRequest::new(query.return_to),
    };

    let client_key = client_key(&session).await?;
    let engine = state.engines.engine_for(client_key).await;

    let snapshot = engine.session.snapshot().await;
    let decision = state.gate.evaluate(&snapshot, &view).await;

    Ok(Json(decision.into()))
}
