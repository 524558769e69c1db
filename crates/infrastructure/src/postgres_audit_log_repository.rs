use async_trait::async_trait;
use sqlx::PgPool;

use aspira_application::{AuditLogRepository, SecurityEvent};
use aspira_core::{AppError, AppResult};

/// PostgreSQL-backed sink for security audit events.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn append_event(&self, event: SecurityEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO security_audit_log (actor, action, detail)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(event.actor)
        .bind(event.action.as_str())
        .bind(event.detail)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to append security audit event: {error}"))
        })?;

        Ok(())
    }
}
