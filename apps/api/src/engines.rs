//! Per-client session engine registry.
//!
//! Each connected admin client gets its own engine: a session state
//! controller bound to that client's provider tokens, plus the idle
//! monitor watching its activity. The browser's cookie session carries
//! only the opaque client key used to find the engine again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tower_sessions::Session;
use uuid::Uuid;

use aspira_application::{
    AdminProfileRepository, AuditService, IdleMonitor, IdleTimeoutHandler, MfaResolution,
    SecurityEvent, SessionService,
};
use aspira_core::AppError;
use aspira_domain::SecurityAction;
use aspira_infrastructure::HttpIdentityProvider;

/// Session key holding the opaque per-client engine key.
pub const SESSION_CLIENT_KEY: &str = "client_key";

/// One connected client's session engine.
pub struct ClientEngine {
    /// Session state controller for this client.
    pub session: Arc<SessionService>,
    /// Idle timeout monitor for this client.
    pub idle: Arc<IdleMonitor>,
}

/// Registry of live client engines, keyed by the cookie-borne client key.
pub struct EngineRegistry {
    engines: RwLock<HashMap<Uuid, Arc<ClientEngine>>>,
    http_client: reqwest::Client,
    provider_url: String,
    provider_key: String,
    admin_profiles: Arc<dyn AdminProfileRepository>,
    audit_service: AuditService,
    mfa_resolution: MfaResolution,
    idle_timeout: Duration,
}

impl EngineRegistry {
    /// Creates an empty registry with the shared engine dependencies.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        provider_url: String,
        provider_key: String,
        admin_profiles: Arc<dyn AdminProfileRepository>,
        audit_service: AuditService,
        mfa_resolution: MfaResolution,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            engines: RwLock::new(HashMap::new()),
            http_client,
            provider_url,
            provider_key,
            admin_profiles,
            audit_service,
            mfa_resolution,
            idle_timeout,
        }
    }

    /// Returns the engine for a client key, creating one on first contact.
    pub async fn engine_for(&self, client_key: Uuid) -> Arc<ClientEngine> {
        if let Some(engine) = self.engines.read().await.get(&client_key) {
            return engine.clone();
        }

        let mut engines = self.engines.write().await;
        if let Some(engine) = engines.get(&client_key) {
            return engine.clone();
        }

        let provider = Arc::new(HttpIdentityProvider::new(
            self.http_client.clone(),
            self.provider_url.clone(),
            self.provider_key.clone(),
        ));
        let session = Arc::new(SessionService::new(
            provider,
            self.admin_profiles.clone(),
            self.audit_service.clone(),
            self.mfa_resolution,
        ));
        // A fresh engine holds no provider token; bootstrap settles it into
        // the signed-out shape immediately.
        session.bootstrap().await;

        let handler = Arc::new(IdleSignOut {
            client_key,
            session: session.clone(),
            audit_service: self.audit_service.clone(),
        });
        let idle = Arc::new(IdleMonitor::new(self.idle_timeout, handler));

        let engine = Arc::new(ClientEngine { session, idle });
        engines.insert(client_key, engine.clone());
        engine
    }

    /// Returns the engine for a client key only if one already exists.
    pub async fn existing(&self, client_key: Uuid) -> Option<Arc<ClientEngine>> {
        self.engines.read().await.get(&client_key).cloned()
    }

    /// Drops a client's engine and cancels its idle deadline.
    pub async fn remove(&self, client_key: Uuid) {
        if let Some(engine) = self.engines.write().await.remove(&client_key) {
            engine.idle.disable().await;
        }
    }

    /// Syncs idle-monitor enablement with the session-ready condition.
    pub async fn sync_idle(engine: &ClientEngine) {
        engine
            .idle
            .set_enabled(engine.session.session_ready().await)
            .await;
    }
}

/// Forces a client out when its idle window elapses.
///
/// The monitor has already disabled itself; the engine stays registered in
/// its signed-out shape until the client logs in again or logs out.
struct IdleSignOut {
    client_key: Uuid,
    session: Arc<SessionService>,
    audit_service: AuditService,
}

#[async_trait]
impl IdleTimeoutHandler for IdleSignOut {
    async fn on_idle_timeout(&self) {
        let actor = self
            .session
            .current_identity()
            .await
            .map(|identity| identity.id().to_string());

        tracing::info!(client = %self.client_key, "idle window elapsed; forcing sign-out");
        self.session.sign_out().await;

        self.audit_service
            .record(SecurityEvent {
                actor,
                action: SecurityAction::SessionExpiredIdle,
                detail: None,
            })
            .await;
    }
}

/// Reads the client key from the cookie session, minting one on first use.
pub async fn client_key(session: &Session) -> Result<Uuid, AppError> {
    let existing = session
        .get::<Uuid>(SESSION_CLIENT_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read client key: {error}")))?;

    if let Some(key) = existing {
        return Ok(key);
    }

    let key = Uuid::new_v4();
    session
        .insert(SESSION_CLIENT_KEY, key)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist client key: {error}")))?;

    Ok(key)
}
