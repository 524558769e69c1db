use aspira_domain::{MfaStatus, SecurityAction};

use crate::SecurityEvent;

use super::*;

impl SessionService {
    /// Marks the step-up requirement as satisfied (or not) for this session.
    ///
    /// Also records the "verified this session" flag consulted by later
    /// resolutions so a silent token refresh does not re-prompt. Calling
    /// this twice with the same value leaves state unchanged.
    pub async fn set_mfa_verified(&self, verified: bool) {
        let newly_verified_actor = {
            let mut state = self.state.write().await;
            let was_verified = state.session.mfa_verified;
            state.verified_this_session = verified;
            state.session.mfa_verified = verified;

            (verified && state.session.mfa_required && !was_verified)
                .then(|| state.session.identity.as_ref().map(|i| i.id().to_string()))
        };

        if let Some(actor) = newly_verified_actor {
            self.audit_service
                .record(SecurityEvent {
                    actor,
                    action: SecurityAction::MfaStepUpVerified,
                    detail: None,
                })
                .await;
        }
    }

    /// Relays a step-up challenge code to the provider.
    ///
    /// A successful verification satisfies the session's step-up
    /// requirement; a rejected code leaves state untouched.
    pub async fn verify_mfa_challenge(&self, factor_id: &str, code: &str) -> Result<(), AuthError> {
        self.identity_provider
            .verify_mfa_challenge(factor_id, code)
            .await?;
        self.set_mfa_verified(true).await;
        Ok(())
    }

    /// Recomputes MFA standing from the provider's live factor list.
    ///
    /// Returns `(mfa_required, mfa_verified)`. With no verified factor the
    /// requirement is trivially satisfied. Factor-list errors follow the
    /// configured [`MfaResolution`] policy; assurance-lookup errors degrade
    /// to basic.
    pub(super) async fn resolve_mfa(&self, path: ResolutionPath) -> (bool, bool) {
        let factors = match self.identity_provider.list_mfa_factors().await {
            Ok(factors) => factors,
            Err(error) => match self.mfa_resolution {
                MfaResolution::FailOpen => {
                    tracing::warn!(
                        %error,
                        "factor listing failed; fail-open policy treats the session as factor-free"
                    );
                    Vec::new()
                }
                MfaResolution::FailClosed => {
                    tracing::warn!(
                        %error,
                        "factor listing failed; fail-closed policy requires a step-up"
                    );
                    return (true, false);
                }
            },
        };

        let has_verified_factor = factors.iter().any(MfaFactor::is_verified);

        let assurance = if has_verified_factor && path == ResolutionPath::Existing {
            match self.identity_provider.assurance_level().await {
                Ok(level) => level,
                Err(error) => {
                    tracing::warn!(%error, "assurance lookup failed; treating session as basic");
                    AssuranceLevel::Basic
                }
            }
        } else {
            AssuranceLevel::Basic
        };

        let status = MfaStatus {
            has_verified_factor,
            assurance,
        };

        if !status.has_verified_factor {
            return (false, true);
        }

        let verified_this_session = self.state.read().await.verified_this_session;
        match path {
            ResolutionPath::FreshSignIn => (true, verified_this_session),
            ResolutionPath::Existing => (
                true,
                verified_this_session || status.assurance.is_elevated(),
            ),
        }
    }
}
