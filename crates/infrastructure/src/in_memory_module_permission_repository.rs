use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use aspira_application::ModulePermissionRepository;
use aspira_core::AppResult;
use aspira_domain::{ModuleKey, ModulePermission};

/// In-memory module allow-list store for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryModulePermissionRepository {
    rows: RwLock<HashMap<ModuleKey, ModulePermission>>,
}

impl InMemoryModulePermissionRepository {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts or replaces the allow-list row for its module.
    pub async fn upsert(&self, permission: ModulePermission) {
        self.rows
            .write()
            .await
            .insert(permission.module_key.clone(), permission);
    }
}

#[async_trait]
impl ModulePermissionRepository for InMemoryModulePermissionRepository {
    async fn find_allowed_roles(
        &self,
        module_key: &ModuleKey,
    ) -> AppResult<Option<ModulePermission>> {
        Ok(self.rows.read().await.get(module_key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use aspira_application::ModulePermissionRepository;
    use aspira_domain::{AdminRole, ModuleKey, ModulePermission};

    use super::InMemoryModulePermissionRepository;

    fn module_key(value: &str) -> ModuleKey {
        ModuleKey::new(value).unwrap_or_else(|_| panic!("test module key"))
    }

    #[tokio::test]
    async fn unregistered_module_resolves_to_no_row() {
        let repository = InMemoryModulePermissionRepository::new();
        let found = repository.find_allowed_roles(&module_key("certificates")).await;
        assert!(matches!(found, Ok(None)));
    }

    #[tokio::test]
    async fn upserted_row_is_found_with_its_roles() {
        let repository = InMemoryModulePermissionRepository::new();
        repository
            .upsert(ModulePermission {
                module_key: module_key("application-review"),
                allowed_roles: BTreeSet::from([AdminRole::Reviewer, AdminRole::Admin]),
            })
            .await;

        let found = repository
            .find_allowed_roles(&module_key("application-review"))
            .await;
        let Ok(Some(permission)) = found else {
            panic!("expected a stored row");
        };
        assert!(permission.allows(AdminRole::Reviewer));
        assert!(!permission.allows(AdminRole::Viewer));
    }
}
