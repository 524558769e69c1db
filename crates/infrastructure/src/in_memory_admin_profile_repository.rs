use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use aspira_application::AdminProfileRepository;
use aspira_core::{AppResult, IdentityId};
use aspira_domain::AdminProfile;

/// In-memory administrator directory for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryAdminProfileRepository {
    profiles: RwLock<HashMap<IdentityId, AdminProfile>>,
}

impl InMemoryAdminProfileRepository {
    /// Creates an empty in-memory directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts or replaces the profile for its identity.
    pub async fn upsert(&self, profile: AdminProfile) {
        self.profiles
            .write()
            .await
            .insert(profile.identity_id, profile);
    }

    /// Removes the profile for an identity, if present.
    pub async fn remove(&self, identity_id: IdentityId) {
        self.profiles.write().await.remove(&identity_id);
    }
}

#[async_trait]
impl AdminProfileRepository for InMemoryAdminProfileRepository {
    async fn find_by_identity(&self, identity_id: IdentityId) -> AppResult<Option<AdminProfile>> {
        Ok(self.profiles.read().await.get(&identity_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use aspira_application::AdminProfileRepository;
    use aspira_core::IdentityId;
    use aspira_domain::{AdminProfile, AdminProfileId, AdminRole, EmailAddress};

    use super::InMemoryAdminProfileRepository;

    fn profile(identity_id: IdentityId) -> AdminProfile {
        AdminProfile {
            id: AdminProfileId::new(),
            identity_id,
            email: EmailAddress::new("reviewer@aspira.org")
                .unwrap_or_else(|_| panic!("test email")),
            role: AdminRole::Reviewer,
            full_name: None,
            country: Some("CA".to_owned()),
            province: None,
        }
    }

    #[tokio::test]
    async fn missing_identity_resolves_to_no_profile() {
        let repository = InMemoryAdminProfileRepository::new();
        let found = repository.find_by_identity(IdentityId::new()).await;
        assert!(matches!(found, Ok(None)));
    }

    #[tokio::test]
    async fn upserted_profile_is_found_by_identity() {
        let repository = InMemoryAdminProfileRepository::new();
        let identity_id = IdentityId::new();
        repository.upsert(profile(identity_id)).await;

        let found = repository.find_by_identity(identity_id).await;
        assert!(matches!(found, Ok(Some(_))));
    }

    #[tokio::test]
    async fn removed_profile_is_gone() {
        let repository = InMemoryAdminProfileRepository::new();
        let identity_id = IdentityId::new();
        repository.upsert(profile(identity_id)).await;
        repository.remove(identity_id).await;

        let found = repository.find_by_identity(identity_id).await;
        assert!(matches!(found, Ok(None)));
    }
}
