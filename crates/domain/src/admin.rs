//! Administrator directory types.
//!
//! Profiles are created out-of-band by the invitation flow; this crate only
//! models them for read access. An authenticated identity without a profile
//! is "not an administrator", which is distinct from "not authenticated".

use std::str::FromStr;

use aspira_core::{AppError, AppResult, IdentityId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an administrator profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdminProfileId(Uuid);

impl AdminProfileId {
    /// Creates a new random profile identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a profile identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AdminProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AdminProfileId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one
    /// `@`, local part and domain are non-empty, domain contains at least
    /// one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let parts: Vec<&str> = trimmed.splitn(2, '@').collect();
        if parts.len() != 2 {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        let local = parts[0];
        let domain = parts[1];

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Administrative roles enforced by module policy checks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Read-only access to assigned modules.
    Viewer,
    /// Reviews submitted applications in assigned modules.
    Reviewer,
    /// Full administrative access, including unregistered modules.
    Admin,
}

impl AdminRole {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Reviewer => "reviewer",
            Self::Admin => "admin",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AdminRole] = &[AdminRole::Viewer, AdminRole::Reviewer, AdminRole::Admin];

        ALL
    }
}

impl FromStr for AdminRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "viewer" => Ok(Self::Viewer),
            "reviewer" => Ok(Self::Reviewer),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}

/// Query-time region predicate derived from a profile's assignment.
///
/// The engine exposes this filter; the surrounding data-access layer applies
/// it when listing records. An unset field matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionFilter {
    /// Country the visible records must match, if assigned.
    pub country: Option<String>,
    /// Province the visible records must match, if assigned.
    pub province: Option<String>,
}

impl RegionFilter {
    /// A filter that matches every record.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Returns whether the filter restricts anything at all.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.country.is_none() && self.province.is_none()
    }

    /// Returns whether a record with the given region fields is visible.
    #[must_use]
    pub fn matches(&self, country: Option<&str>, province: Option<&str>) -> bool {
        let country_ok = match self.country.as_deref() {
            Some(assigned) => country == Some(assigned),
            None => true,
        };
        let province_ok = match self.province.as_deref() {
            Some(assigned) => province == Some(assigned),
            None => true,
        };

        country_ok && province_ok
    }
}

/// Administrative profile granting an identity back-office standing.
///
/// One-to-one with a provider identity; read-only to the session engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    /// Unique profile identifier.
    pub id: AdminProfileId,
    /// The provider identity this profile belongs to.
    pub identity_id: IdentityId,
    /// Canonical email address.
    pub email: EmailAddress,
    /// Assigned role.
    pub role: AdminRole,
    /// Optional display name.
    pub full_name: Option<String>,
    /// Optional country assignment for region scoping.
    pub country: Option<String>,
    /// Optional province assignment for region scoping.
    pub province: Option<String>,
}

impl AdminProfile {
    /// Returns the region predicate for this profile.
    ///
    /// The `admin` role is never region-scoped; other roles are restricted
    /// to their assigned country/province when one is set.
    #[must_use]
    pub fn region_filter(&self) -> RegionFilter {
        if self.role == AdminRole::Admin {
            return RegionFilter::unrestricted();
        }

        RegionFilter {
            country: self.country.clone(),
            province: self.province.clone(),
        }
    }
}
