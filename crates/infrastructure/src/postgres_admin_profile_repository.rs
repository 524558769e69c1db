use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use aspira_application::AdminProfileRepository;
use aspira_core::{AppError, AppResult, IdentityId};
use aspira_domain::{AdminProfile, AdminProfileId, AdminRole, EmailAddress};

/// PostgreSQL-backed repository for administrator profile lookups.
#[derive(Clone)]
pub struct PostgresAdminProfileRepository {
    pool: PgPool,
}

impl PostgresAdminProfileRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AdminProfileRow {
    id: uuid::Uuid,
    identity_id: uuid::Uuid,
    email: String,
    role: String,
    full_name: Option<String>,
    country: Option<String>,
    province: Option<String>,
}

impl AdminProfileRow {
    fn into_profile(self) -> AppResult<AdminProfile> {
        let role = AdminRole::from_str(self.role.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode role '{}' for identity '{}': {error}",
                self.role, self.identity_id
            ))
        })?;
        let email = EmailAddress::new(self.email.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "stored email for identity '{}' is malformed: {error}",
                self.identity_id
            ))
        })?;

        Ok(AdminProfile {
            id: AdminProfileId::from_uuid(self.id),
            identity_id: IdentityId::from_uuid(self.identity_id),
            email,
            role,
            full_name: self.full_name,
            country: self.country,
            province: self.province,
        })
    }
}

#[async_trait]
impl AdminProfileRepository for PostgresAdminProfileRepository {
    async fn find_by_identity(&self, identity_id: IdentityId) -> AppResult<Option<AdminProfile>> {
        let row = sqlx::query_as::<_, AdminProfileRow>(
            r#"
            SELECT id, identity_id, email, role, full_name, country, province
            FROM admin_profiles
            WHERE identity_id = $1
            "#,
        )
        .bind(identity_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load admin profile: {error}")))?;

        row.map(AdminProfileRow::into_profile).transpose()
    }
}
