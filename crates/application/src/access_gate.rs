//! Per-view authorization decisions.
//!
//! The gate combines the session snapshot with an optional module
//! allow-list lookup into a single terminal decision. Evaluation order is
//! strict: loading, authentication, step-up, standing, then module policy.
//! That order is what keeps the state invariants out of the calling views.

use std::sync::Arc;

use async_trait::async_trait;

use aspira_core::AppResult;
use aspira_domain::{AdminRole, ModuleKey, ModulePermission};

use crate::SessionState;

/// Repository port for module allow-list lookups.
#[async_trait]
pub trait ModulePermissionRepository: Send + Sync {
    /// Finds the allow-list row for a module, if one is registered.
    ///
    /// `Ok(None)` (no row) is distinct from an empty allow-list: an
    /// unregistered module falls back to admin-only access.
    async fn find_allowed_roles(
        &self,
        module_key: &ModuleKey,
    ) -> AppResult<Option<ModulePermission>>;
}

/// What a protected view requires before it may render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRequest {
    /// Location to return to after authentication completes.
    pub return_to: String,
    /// Module allow-list to consult, for module-tagged views.
    pub module_key: Option<ModuleKey>,
}

impl ViewRequest {
    /// A view protected by authentication and admin standing only.
    #[must_use]
    pub fn new(return_to: impl Into<String>) -> Self {
        Self {
            return_to: return_to.into(),
            module_key: None,
        }
    }

    /// A view additionally gated by a module allow-list.
    #[must_use]
    pub fn with_module(return_to: impl Into<String>, module_key: ModuleKey) -> Self {
        Self {
            return_to: return_to.into(),
            module_key: Some(module_key),
        }
    }
}

/// Outcome of evaluating a protected view against the session snapshot.
///
/// Denials and redirects are terminal for the current render pass; the only
/// recovery path is a fresh navigation after the user authenticates or an
/// administrator changes the module policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Session resolution is still in flight; render a placeholder.
    Loading,
    /// No usable session; send the caller to the sign-in view.
    RedirectToSignIn {
        /// The originally requested location, restored after sign-in.
        return_to: String,
        /// True when an identity exists but its step-up is outstanding, so
        /// the sign-in view renders the challenge form instead of the
        /// credential form.
        pending_mfa: bool,
    },
    /// Authenticated but not a recognized administrator.
    DeniedNotAdmin,
    /// Recognized administrator without the role the module requires.
    DeniedInsufficientRole,
    /// The view may render.
    Allowed,
}

/// Guard evaluated for every protected view.
#[derive(Clone)]
pub struct AccessGate {
    module_permissions: Arc<dyn ModulePermissionRepository>,
}

impl AccessGate {
    /// Creates a gate over a module permission repository.
    #[must_use]
    pub fn new(module_permissions: Arc<dyn ModulePermissionRepository>) -> Self {
        Self { module_permissions }
    }

    /// Decides whether the requested view renders, redirects, or denies.
    ///
    /// First matching rule wins. The module lookup only runs once the
    /// caller is a known administrator, so unauthenticated probes cannot
    /// enumerate module keys and no backend call is wasted on them.
    pub async fn evaluate(&self, snapshot: &SessionState, view: &ViewRequest) -> Decision {
        if snapshot.is_loading {
            return Decision::Loading;
        }

        if snapshot.identity.is_none() {
            return Decision::RedirectToSignIn {
                return_to: view.return_to.clone(),
                pending_mfa: false,
            };
        }

        if snapshot.mfa_required && !snapshot.mfa_verified {
            return Decision::RedirectToSignIn {
                return_to: view.return_to.clone(),
                pending_mfa: true,
            };
        }

        let Some(profile) = snapshot.admin_profile.as_ref() else {
            // Terminal: redirecting back to sign-in would loop.
            return Decision::DeniedNotAdmin;
        };

        if let Some(module_key) = view.module_key.as_ref() {
            let row = match self.module_permissions.find_allowed_roles(module_key).await {
                Ok(row) => row,
                Err(error) => {
                    tracing::warn!(
                        %error,
                        module = %module_key,
                        "module permission lookup failed; applying unregistered-module rule"
                    );
                    None
                }
            };

            let allowed = match row {
                Some(permission) => permission.allows(profile.role),
                None => profile.role == AdminRole::Admin,
            };

            if !allowed {
                return Decision::DeniedInsufficientRole;
            }
        }

        Decision::Allowed
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use aspira_core::{AppError, AppResult, Identity, IdentityId};
    use aspira_domain::{
        AdminProfile, AdminProfileId, AdminRole, EmailAddress, ModuleKey, ModulePermission,
    };

    use crate::SessionState;

    use super::{AccessGate, Decision, ModulePermissionRepository, ViewRequest};

    #[derive(Default)]
    struct FakeModulePermissionRepository {
        rows: HashMap<String, ModulePermission>,
        fail: bool,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl ModulePermissionRepository for FakeModulePermissionRepository {
        async fn find_allowed_roles(
            &self,
            module_key: &ModuleKey,
        ) -> AppResult<Option<ModulePermission>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Internal("module store unavailable".to_owned()));
            }
            Ok(self.rows.get(module_key.as_str()).cloned())
        }
    }

    fn module_key(value: &str) -> ModuleKey {
        ModuleKey::new(value).unwrap_or_else(|_| panic!("test module key"))
    }

    fn permission(module: &str, roles: &[AdminRole]) -> ModulePermission {
        ModulePermission {
            module_key: module_key(module),
            allowed_roles: BTreeSet::from_iter(roles.iter().copied()),
        }
    }

    fn profile(role: AdminRole) -> AdminProfile {
        AdminProfile {
            id: AdminProfileId::new(),
            identity_id: IdentityId::new(),
            email: EmailAddress::new("admin@aspira.org").unwrap_or_else(|_| panic!("test email")),
            role,
            full_name: None,
            country: None,
            province: None,
        }
    }

    fn established_snapshot(role: AdminRole) -> SessionState {
        SessionState {
            identity: Some(Identity::new(IdentityId::new(), "admin@aspira.org")),
            admin_profile: Some(profile(role)),
            is_loading: false,
            mfa_required: false,
            mfa_verified: false,
        }
    }

    fn gate_with(rows: Vec<ModulePermission>) -> (AccessGate, Arc<FakeModulePermissionRepository>) {
        let repository = Arc::new(FakeModulePermissionRepository {
            rows: rows
                .into_iter()
                .map(|row| (row.module_key.as_str().to_owned(), row))
                .collect(),
            fail: false,
            lookups: AtomicUsize::new(0),
        });
        (AccessGate::new(repository.clone()), repository)
    }

    #[tokio::test]
    async fn loading_snapshot_defers_the_decision() {
        let (gate, _) = gate_with(Vec::new());
        let snapshot = SessionState {
            identity: None,
            admin_profile: None,
            is_loading: true,
            mfa_required: false,
            mfa_verified: false,
        };

        let decision = gate.evaluate(&snapshot, &ViewRequest::new("/admin")).await;
        assert_eq!(decision, Decision::Loading);
    }

    #[tokio::test]
    async fn missing_identity_redirects_with_return_location() {
        let (gate, _) = gate_with(Vec::new());
        let snapshot = SessionState {
            identity: None,
            admin_profile: None,
            is_loading: false,
            mfa_required: false,
            mfa_verified: false,
        };

        let decision = gate
            .evaluate(&snapshot, &ViewRequest::new("/admin/applications"))
            .await;
        assert_eq!(
            decision,
            Decision::RedirectToSignIn {
                return_to: "/admin/applications".to_owned(),
                pending_mfa: false,
            }
        );
    }

    #[tokio::test]
    async fn outstanding_step_up_redirects_with_pending_flag() {
        let (gate, _) = gate_with(Vec::new());
        let mut snapshot = established_snapshot(AdminRole::Admin);
        snapshot.mfa_required = true;
        snapshot.mfa_verified = false;

        let decision = gate.evaluate(&snapshot, &ViewRequest::new("/admin")).await;
        assert_eq!(
            decision,
            Decision::RedirectToSignIn {
                return_to: "/admin".to_owned(),
                pending_mfa: true,
            }
        );
    }

    #[tokio::test]
    async fn authenticated_non_admin_is_denied_without_module_lookup() {
        let (gate, repository) = gate_with(vec![permission(
            "applications",
            &[AdminRole::Viewer, AdminRole::Reviewer, AdminRole::Admin],
        )]);
        let mut snapshot = established_snapshot(AdminRole::Viewer);
        snapshot.admin_profile = None;

        let decision = gate
            .evaluate(
                &snapshot,
                &ViewRequest::with_module("/admin/applications", module_key("applications")),
            )
            .await;

        assert_eq!(decision, Decision::DeniedNotAdmin);
        assert_eq!(repository.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unregistered_module_admits_only_admins() {
        let (gate, _) = gate_with(Vec::new());
        let view = ViewRequest::with_module("/admin/exports", module_key("exports"));

        for (role, expected) in [
            (AdminRole::Admin, Decision::Allowed),
            (AdminRole::Reviewer, Decision::DeniedInsufficientRole),
            (AdminRole::Viewer, Decision::DeniedInsufficientRole),
        ] {
            let decision = gate.evaluate(&established_snapshot(role), &view).await;
            assert_eq!(decision, expected);
        }
    }

    #[tokio::test]
    async fn registered_module_admits_only_listed_roles() {
        let (gate, _) = gate_with(vec![permission(
            "application-review",
            &[AdminRole::Reviewer, AdminRole::Admin],
        )]);
        let view = ViewRequest::with_module("/admin/review", module_key("application-review"));

        for (role, expected) in [
            (AdminRole::Admin, Decision::Allowed),
            (AdminRole::Reviewer, Decision::Allowed),
            (AdminRole::Viewer, Decision::DeniedInsufficientRole),
        ] {
            let decision = gate.evaluate(&established_snapshot(role), &view).await;
            assert_eq!(decision, expected);
        }
    }

    #[tokio::test]
    async fn viewer_requesting_admin_only_module_is_denied() {
        let (gate, _) = gate_with(vec![permission("settings", &[AdminRole::Admin])]);

        let decision = gate
            .evaluate(
                &established_snapshot(AdminRole::Viewer),
                &ViewRequest::with_module("/admin/settings", module_key("settings")),
            )
            .await;

        assert_eq!(decision, Decision::DeniedInsufficientRole);
    }

    #[tokio::test]
    async fn module_tag_absent_skips_the_lookup() {
        let (gate, repository) = gate_with(Vec::new());

        let decision = gate
            .evaluate(
                &established_snapshot(AdminRole::Viewer),
                &ViewRequest::new("/admin/home"),
            )
            .await;

        assert_eq!(decision, Decision::Allowed);
        assert_eq!(repository.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lookup_failure_applies_unregistered_module_rule() {
        let repository = Arc::new(FakeModulePermissionRepository {
            rows: HashMap::new(),
            fail: true,
            lookups: AtomicUsize::new(0),
        });
        let gate = AccessGate::new(repository);
        let view = ViewRequest::with_module("/admin/stories", module_key("stories"));

        let admin = gate.evaluate(&established_snapshot(AdminRole::Admin), &view).await;
        let reviewer = gate
            .evaluate(&established_snapshot(AdminRole::Reviewer), &view)
            .await;

        assert_eq!(admin, Decision::Allowed);
        assert_eq!(reviewer, Decision::DeniedInsufficientRole);
    }

    proptest::proptest! {
        // Rule 2 dominates: without an identity the gate always redirects,
        // whatever the rest of the snapshot claims.
        #[test]
        fn null_identity_always_redirects(
            has_profile in proptest::bool::ANY,
            mfa_required in proptest::bool::ANY,
            mfa_verified in proptest::bool::ANY,
            with_module in proptest::bool::ANY,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap_or_else(|_| panic!("test runtime"));

            let decision = runtime.block_on(async {
                let (gate, _) = gate_with(Vec::new());
                let snapshot = SessionState {
                    identity: None,
                    admin_profile: has_profile.then(|| profile(AdminRole::Admin)),
                    is_loading: false,
                    mfa_required,
                    mfa_verified,
                };
                let view = if with_module {
                    ViewRequest::with_module("/admin", module_key("applications"))
                } else {
                    ViewRequest::new("/admin")
                };
                gate.evaluate(&snapshot, &view).await
            });

            proptest::prop_assert_eq!(
                decision,
                Decision::RedirectToSignIn {
                    return_to: "/admin".to_owned(),
                    pending_mfa: false,
                }
            );
        }
    }
}
