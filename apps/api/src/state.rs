use std::sync::Arc;

use aspira_application::AccessGate;

use crate::engines::EngineRegistry;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub engines: Arc<EngineRegistry>,
    pub gate: AccessGate,
    pub frontend_url: String,
}
