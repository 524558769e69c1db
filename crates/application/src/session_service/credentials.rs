use aspira_domain::{EmailAddress, SecurityAction};

use crate::SecurityEvent;

use super::*;

impl SessionService {
    /// Authenticates with the identity provider and establishes the session.
    ///
    /// Rejections are returned as typed [`AuthError`] values so the sign-in
    /// form can show a message; they leave the state signed out. The caller
    /// decides whether to retry.
    pub async fn sign_in(&self, email: &str, secret: &str) -> Result<(), AuthError> {
        // A verification left over from a previous failed attempt must not
        // carry into this one.
        self.state.write().await.verified_this_session = false;

        let email = EmailAddress::new(email).map_err(|_| AuthError::InvalidCredentials)?;

        match self.identity_provider.sign_in(email.as_str(), secret).await {
            Ok(session) => {
                self.audit_service
                    .record(SecurityEvent {
                        actor: Some(session.identity.id().to_string()),
                        action: SecurityAction::SignInSucceeded,
                        detail: None,
                    })
                    .await;
                self.on_session_changed(SessionEventKind::SignedIn, Some(session))
                    .await;
                Ok(())
            }
            Err(error) => {
                self.audit_service
                    .record(SecurityEvent {
                        actor: None,
                        action: SecurityAction::SignInFailed,
                        detail: Some(format!("sign-in rejected for '{}'", email.as_str())),
                    })
                    .await;
                Err(error)
            }
        }
    }

    /// Registers a new account with the identity provider.
    ///
    /// Registration does not grant administrator standing; the invitation
    /// flow creates the directory profile out-of-band. When the provider
    /// auto-confirms the account and returns a session, it is established
    /// like a fresh sign-in.
    pub async fn sign_up(&self, email: &str, secret: &str) -> Result<(), AuthError> {
        let email = EmailAddress::new(email).map_err(|_| AuthError::InvalidCredentials)?;

        let session = self.identity_provider.sign_up(email.as_str(), secret).await?;
        if let Some(session) = session {
            self.on_session_changed(SessionEventKind::SignedIn, Some(session))
                .await;
        }
        Ok(())
    }

    /// Signs out of the provider and resets local state.
    ///
    /// The provider call is attempted once; the local session is cleared
    /// unconditionally so a client-visible "signed out" wins even when the
    /// remote call errors.
    pub async fn sign_out(&self) {
        let actor = {
            let state = self.state.read().await;
            state
                .session
                .identity
                .as_ref()
                .map(|identity| identity.id().to_string())
        };

        if let Err(error) = self.identity_provider.sign_out().await {
            tracing::warn!(%error, "provider sign-out failed; clearing local session anyway");
        }

        self.on_session_changed(SessionEventKind::SignedOut, None)
            .await;

        self.audit_service
            .record(SecurityEvent {
                actor,
                action: SecurityAction::SignedOut,
                detail: None,
            })
            .await;
    }
}
