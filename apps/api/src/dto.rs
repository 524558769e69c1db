//! Request/response types shared with the admin SPA.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use aspira_application::{Decision, SessionState};
use aspira_domain::RegionFilter;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/login-response.ts"
)]
pub struct LoginResponse {
    /// `authenticated` or `mfa_required`.
    pub status: String,
    pub mfa_pending: bool,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/generic-message-response.ts"
)]
pub struct GenericMessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct MfaVerifyRequest {
    pub factor_id: String,
    pub code: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/region-filter.ts"
)]
pub struct RegionFilterResponse {
    pub country: Option<String>,
    pub province: Option<String>,
}

impl From<RegionFilter> for RegionFilterResponse {
    fn from(value: RegionFilter) -> Self {
        Self {
            country: value.country,
            province: value.province,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/session-state-response.ts"
)]
pub struct SessionStateResponse {
    pub authenticated: bool,
    pub email: Option<String>,
    pub is_admin: bool,
    pub role: Option<String>,
    pub full_name: Option<String>,
    pub is_loading: bool,
    pub mfa_required: bool,
    pub mfa_verified: bool,
    /// Query predicate the data layer applies when listing records.
    pub region: Option<RegionFilterResponse>,
}

impl SessionStateResponse {
    /// Projects the engine snapshot into the SPA-facing shape.
    #[must_use]
    pub fn from_snapshot(snapshot: &SessionState) -> Self {
        Self {
            authenticated: snapshot.identity.is_some(),
            email: snapshot
                .identity
                .as_ref()
                .map(|identity| identity.email().to_owned()),
            is_admin: snapshot.admin_profile.is_some(),
            role: snapshot
                .admin_profile
                .as_ref()
                .map(|profile| profile.role.as_str().to_owned()),
            full_name: snapshot
                .admin_profile
                .as_ref()
                .and_then(|profile| profile.full_name.clone()),
            is_loading: snapshot.is_loading,
            mfa_required: snapshot.mfa_required,
            mfa_verified: snapshot.mfa_verified,
            region: snapshot
                .admin_profile
                .as_ref()
                .map(|profile| profile.region_filter().into()),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/decision-response.ts"
)]
pub struct DecisionResponse {
    /// `loading`, `redirect_to_sign_in`, `denied_not_admin`,
    /// `denied_insufficient_role` or `allowed`.
    pub decision: String,
    pub return_to: Option<String>,
    pub pending_mfa: Option<bool>,
}

impl From<Decision> for DecisionResponse {
    fn from(value: Decision) -> Self {
        match value {
            Decision::Loading => Self {
                decision: "loading".to_owned(),
                return_to: None,
                pending_mfa: None,
            },
            Decision::RedirectToSignIn {
                return_to,
                pending_mfa,
            } => Self {
                decision: "redirect_to_sign_in".to_owned(),
                return_to: Some(return_to),
                pending_mfa: Some(pending_mfa),
            },
            Decision::DeniedNotAdmin => Self {
                decision: "denied_not_admin".to_owned(),
                return_to: None,
                pending_mfa: None,
            },
            Decision::DeniedInsufficientRole => Self {
                decision: "denied_insufficient_role".to_owned(),
                return_to: None,
                pending_mfa: None,
            },
            Decision::Allowed => Self {
                decision: "allowed".to_owned(),
                return_to: None,
                pending_mfa: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use aspira_application::Decision;
    use aspira_core::{Identity, IdentityId};

    use super::{DecisionResponse, SessionStateResponse};

    #[test]
    fn redirect_decision_carries_location_and_flag() {
        let response: DecisionResponse = Decision::RedirectToSignIn {
            return_to: "/admin/review".to_owned(),
            pending_mfa: true,
        }
        .into();

        assert_eq!(response.decision, "redirect_to_sign_in");
        assert_eq!(response.return_to.as_deref(), Some("/admin/review"));
        assert_eq!(response.pending_mfa, Some(true));
    }

    #[test]
    fn terminal_decisions_have_no_redirect_payload() {
        for decision in [
            Decision::DeniedNotAdmin,
            Decision::DeniedInsufficientRole,
            Decision::Allowed,
        ] {
            let response: DecisionResponse = decision.into();
            assert!(response.return_to.is_none());
            assert!(response.pending_mfa.is_none());
        }
    }

    #[test]
    fn signed_in_snapshot_without_profile_is_not_admin() {
        let snapshot = aspira_application::SessionState {
            identity: Some(Identity::new(IdentityId::new(), "lead@aspira.org")),
            admin_profile: None,
            is_loading: false,
            mfa_required: false,
            mfa_verified: false,
        };

        let response = SessionStateResponse::from_snapshot(&snapshot);
        assert!(response.authenticated);
        assert!(!response.is_admin);
        assert!(response.role.is_none());
        assert!(response.region.is_none());
    }
}
