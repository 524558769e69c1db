use aspira_core::Identity;

use super::*;

impl SessionService {
    /// Reacts to a session-change notification from the identity provider.
    ///
    /// A non-null session stores the identity and queues a follow-up job
    /// that loads the administrator profile and recomputes MFA standing. A
    /// `SignedIn` event additionally discards any cached "verified this
    /// session" flag: a fresh login always requires a fresh challenge, even
    /// when the provider still reports an elevated session from an earlier
    /// browser session. A null session resets to the signed-out shape.
    pub async fn on_session_changed(
        &self,
        kind: SessionEventKind,
        session: Option<ProviderSession>,
    ) {
        match session {
            Some(session) => {
                {
                    let mut state = self.state.write().await;
                    if kind == SessionEventKind::SignedIn {
                        state.verified_this_session = false;
                    }
                    state.session.identity = Some(session.identity.clone());
                    state.session.is_loading = true;
                }

                let path = if kind == SessionEventKind::SignedIn {
                    ResolutionPath::FreshSignIn
                } else {
                    ResolutionPath::Existing
                };
                self.enqueue_resolution(session.identity, path).await;
            }
            None => {
                let mut state = self.state.write().await;
                state.session.reset_signed_out();
                state.verified_this_session = false;
            }
        }
    }

    /// Fetches any already-open provider session once at startup.
    ///
    /// Unlike a fresh sign-in, an elevated assurance level reported by the
    /// provider here is honored as already-verified: returning to an open
    /// session is not a new login. Provider errors leave the client signed
    /// out and are logged, never surfaced to the render path.
    pub async fn bootstrap(&self) {
        match self.identity_provider.current_session().await {
            Ok(Some(session)) => {
                {
                    let mut state = self.state.write().await;
                    state.session.identity = Some(session.identity.clone());
                    state.session.is_loading = true;
                }
                self.enqueue_resolution(session.identity, ResolutionPath::Existing)
                    .await;
                self.process_pending().await;
            }
            Ok(None) => {
                self.state.write().await.session.reset_signed_out();
            }
            Err(error) => {
                tracing::warn!(%error, "session bootstrap failed; starting signed out");
                self.state.write().await.session.reset_signed_out();
            }
        }
    }

    /// Drains queued resolution jobs in FIFO order.
    ///
    /// Embedding runtimes call this after delivering provider events; tests
    /// call it directly to make the deferred work deterministic.
    pub async fn process_pending(&self) {
        loop {
            let job = self.follow_ups.lock().await.pop_front();
            let Some(job) = job else {
                break;
            };
            self.resolve_access(job).await;
        }
    }

    async fn enqueue_resolution(&self, identity: Identity, path: ResolutionPath) {
        self.follow_ups
            .lock()
            .await
            .push_back(AccessResolution { identity, path });
    }

    /// Resolves administrator standing and MFA status for one queued job.
    ///
    /// The profile is loaded before MFA standing so consumers never observe
    /// a "denied" flash for an identity whose standing is still unknown.
    /// Both results land under a single write lock.
    async fn resolve_access(&self, job: AccessResolution) {
        let still_current = {
            let state = self.state.read().await;
            state.session.identity.as_ref().map(Identity::id) == Some(job.identity.id())
        };
        if !still_current {
            // The identity was replaced or cleared while the job was queued.
            return;
        }

        let profile = match self.admin_profiles.find_by_identity(job.identity.id()).await {
            Ok(profile) => profile,
            Err(error) => {
                tracing::warn!(
                    %error,
                    identity = %job.identity.id(),
                    "admin profile lookup failed; treating identity as non-admin"
                );
                None
            }
        };

        let (mfa_required, mfa_verified) = self.resolve_mfa(job.path).await;

        let mut state = self.state.write().await;
        if state.session.identity.as_ref().map(Identity::id) != Some(job.identity.id()) {
            return;
        }
        state.session.admin_profile = profile;
        state.session.mfa_required = mfa_required;
        state.session.mfa_verified = mfa_verified;
        state.session.is_loading = false;
    }
}
