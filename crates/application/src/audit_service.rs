use std::sync::Arc;

use async_trait::async_trait;

use aspira_core::AppResult;
use aspira_domain::SecurityAction;

/// Security-relevant event payload delivered to the audit notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityEvent {
    /// Acting identity, if known.
    pub actor: Option<String>,
    /// Stable action identifier.
    pub action: SecurityAction,
    /// Free-form context for reviewers.
    pub detail: Option<String>,
}

/// Repository port for security audit persistence.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Appends an audit event entry.
    async fn append_event(&self, event: SecurityEvent) -> AppResult<()>;
}

/// Application service for security audit notification.
#[derive(Clone)]
pub struct AuditService {
    repository: Arc<dyn AuditLogRepository>,
}

impl AuditService {
    /// Creates a service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditLogRepository>) -> Self {
        Self { repository }
    }

    /// Records a security event.
    ///
    /// Persistence failures are logged and swallowed; audit transport must
    /// never fail an authentication flow.
    pub async fn record(&self, event: SecurityEvent) {
        let action = event.action;
        if let Err(error) = self.repository.append_event(event).await {
            tracing::warn!(%error, action = action.as_str(), "failed to append security audit event");
        }
    }
}
