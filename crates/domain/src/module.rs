//! Protected module identifiers and role allow-lists.

use std::collections::BTreeSet;

use aspira_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::AdminRole;

/// Maximum accepted length for a module key.
const MODULE_KEY_MAX_LENGTH: usize = 64;

/// Stable identifier for a protected feature area of the back office.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleKey(String);

impl ModuleKey {
    /// Creates a validated module key.
    ///
    /// Keys are lowercase slugs: letters, digits, `_` and `-`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "module key must not be empty".to_owned(),
            ));
        }

        if trimmed.len() > MODULE_KEY_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "module key must not exceed {MODULE_KEY_MAX_LENGTH} characters"
            )));
        }

        let valid = trimmed
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-');
        if !valid {
            return Err(AppError::Validation(format!(
                "module key '{trimmed}' must contain only lowercase letters, digits, '_' or '-'"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ModuleKey {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Role allow-list stored for one module.
///
/// Absence of a row for a module is a distinct case from an empty
/// allow-list: an unregistered module falls back to admin-only access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePermission {
    /// The module this row governs.
    pub module_key: ModuleKey,
    /// Roles allowed to access the module.
    pub allowed_roles: BTreeSet<AdminRole>,
}

impl ModulePermission {
    /// Returns whether the given role may access the module.
    #[must_use]
    pub fn allows(&self, role: AdminRole) -> bool {
        self.allowed_roles.contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::AdminRole;

    use super::{ModuleKey, ModulePermission};

    #[test]
    fn valid_key_is_accepted() {
        let key = ModuleKey::new("application-review");
        assert!(key.is_ok());
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(ModuleKey::new("   ").is_err());
    }

    #[test]
    fn uppercase_key_is_rejected() {
        assert!(ModuleKey::new("Applications").is_err());
    }

    #[test]
    fn overlong_key_is_rejected() {
        assert!(ModuleKey::new("a".repeat(65)).is_err());
    }

    proptest::proptest! {
        #[test]
        fn any_lowercase_slug_is_accepted_verbatim(key in "[a-z0-9_-]{1,64}") {
            let parsed = ModuleKey::new(key.clone());
            proptest::prop_assert!(parsed.is_ok());
            let parsed = parsed.unwrap_or_else(|_| panic!("slug accepted above"));
            proptest::prop_assert_eq!(parsed.as_str(), key.as_str());
        }
    }

    #[test]
    fn allow_list_admits_only_members() {
        let permission = ModulePermission {
            module_key: ModuleKey::new("certificates").unwrap_or_else(|_| panic!("test key")),
            allowed_roles: BTreeSet::from([AdminRole::Reviewer, AdminRole::Admin]),
        };

        assert!(permission.allows(AdminRole::Reviewer));
        assert!(permission.allows(AdminRole::Admin));
        assert!(!permission.allows(AdminRole::Viewer));
    }
}
