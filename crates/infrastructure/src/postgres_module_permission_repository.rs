use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use aspira_application::ModulePermissionRepository;
use aspira_core::{AppError, AppResult};
use aspira_domain::{AdminRole, ModuleKey, ModulePermission};

/// PostgreSQL-backed repository for module allow-list lookups.
#[derive(Clone)]
pub struct PostgresModulePermissionRepository {
    pool: PgPool,
}

impl PostgresModulePermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ModulePermissionRow {
    module_key: String,
    allowed_roles: Vec<String>,
}

impl ModulePermissionRow {
    fn into_permission(self) -> AppResult<ModulePermission> {
        let module_key = ModuleKey::new(self.module_key.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "stored module key '{}' is malformed: {error}",
                self.module_key
            ))
        })?;

        let allowed_roles = self
            .allowed_roles
            .iter()
            .map(|value| {
                AdminRole::from_str(value.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode role '{value}' for module '{module_key}': {error}"
                    ))
                })
            })
            .collect::<AppResult<BTreeSet<AdminRole>>>()?;

        Ok(ModulePermission {
            module_key,
            allowed_roles,
        })
    }
}

#[async_trait]
impl ModulePermissionRepository for PostgresModulePermissionRepository {
    async fn find_allowed_roles(
        &self,
        module_key: &ModuleKey,
    ) -> AppResult<Option<ModulePermission>> {
        let row = sqlx::query_as::<_, ModulePermissionRow>(
            r#"
            SELECT module_key, allowed_roles
            FROM module_permissions
            WHERE module_key = $1
            "#,
        )
        .bind(module_key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load module permission: {error}"))
        })?;

        row.map(ModulePermissionRow::into_permission).transpose()
    }
}
