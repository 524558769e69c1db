//! Session state controller: ports and the service owning the single
//! source of truth for "is this client authenticated, as whom, with what
//! assurance".
//!
//! All mutations funnel through the methods here; views and other
//! components only read snapshots. Follow-up work triggered by a session
//! change (profile fetch, MFA recompute) goes through an explicit FIFO
//! queue drained by [`SessionService::process_pending`] so the ordering
//! guarantee is visible and testable rather than an artifact of runtime
//! scheduling.

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use aspira_core::{AppError, AppResult, AuthError, Identity, IdentityId};
use aspira_domain::{AdminProfile, AssuranceLevel, MfaFactor, RegionFilter};

use crate::AuditService;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Session handed out by the identity provider on sign-in or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    /// The authenticated principal.
    pub identity: Identity,
}

/// Kinds of session-change notifications delivered by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEventKind {
    /// A fresh interactive sign-in completed.
    SignedIn,
    /// The session ended.
    SignedOut,
    /// The provider silently refreshed the session token.
    TokenRefreshed,
    /// Provider-side account data changed.
    UserUpdated,
}

/// The narrow contract this engine requires from the hosted identity
/// provider. Credential storage, token formats, and factor enrollment
/// ceremonies all stay on the provider's side of this boundary.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticates with email and secret, returning the new session.
    async fn sign_in(&self, email: &str, secret: &str) -> Result<ProviderSession, AuthError>;

    /// Registers a new account with the provider.
    ///
    /// Returns `None` when the provider requires email confirmation before
    /// issuing a session.
    async fn sign_up(&self, email: &str, secret: &str)
    -> Result<Option<ProviderSession>, AuthError>;

    /// Ends the provider-side session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Returns the already-open session, if one exists.
    async fn current_session(&self) -> AppResult<Option<ProviderSession>>;

    /// Lists the factors enrolled for the current identity.
    async fn list_mfa_factors(&self) -> AppResult<Vec<MfaFactor>>;

    /// Returns the provider's assurance classification for the session.
    async fn assurance_level(&self) -> AppResult<AssuranceLevel>;

    /// Submits a step-up challenge code for one enrolled factor.
    async fn verify_mfa_challenge(&self, factor_id: &str, code: &str) -> Result<(), AuthError>;
}

/// Repository port for administrator profile lookups.
#[async_trait]
pub trait AdminProfileRepository: Send + Sync {
    /// Finds the profile for an identity.
    ///
    /// `Ok(None)` means the identity is authenticated but not an
    /// administrator; `Err` means the lookup itself failed. The controller
    /// degrades both to "no profile" but they stay distinguishable here.
    async fn find_by_identity(&self, identity_id: IdentityId) -> AppResult<Option<AdminProfile>>;
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Snapshot of the client session consumed by the access gate and views.
///
/// Invariants: `mfa_verified` is meaningless unless `mfa_required` is true,
/// and `admin_profile` is only trusted once `is_loading` is false. The
/// gate's evaluation order enforces both for callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Authenticated principal, if any.
    pub identity: Option<Identity>,
    /// Administrator standing for the identity, once resolved.
    pub admin_profile: Option<AdminProfile>,
    /// Whether profile/MFA resolution is still in flight.
    pub is_loading: bool,
    /// Whether the identity has at least one verified factor enrolled.
    pub mfa_required: bool,
    /// Whether the step-up requirement is satisfied for this session.
    pub mfa_verified: bool,
}

impl SessionState {
    fn loading() -> Self {
        Self {
            identity: None,
            admin_profile: None,
            is_loading: true,
            mfa_required: false,
            mfa_verified: false,
        }
    }

    fn reset_signed_out(&mut self) {
        self.identity = None;
        self.admin_profile = None;
        self.is_loading = false;
        self.mfa_required = false;
        self.mfa_verified = false;
    }

    /// Whether the session is fully usable: an identity exists and any
    /// step-up requirement is satisfied. This is the idle-monitor enable
    /// condition.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.identity.is_some() && (!self.mfa_required || self.mfa_verified)
    }
}

/// Policy applied when the provider's factor list cannot be read.
///
/// `FailOpen` treats the session as factor-free so a legitimate non-MFA
/// user is never stranded in a pending-MFA state; `FailClosed` requires a
/// step-up that cannot be passed until the provider recovers. The default
/// is fail-open; the asymmetry against the fail-closed profile lookup is
/// deliberate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MfaResolution {
    /// Factor-list errors resolve to "no step-up needed".
    FailOpen,
    /// Factor-list errors resolve to "step-up required, unverified".
    FailClosed,
}

impl MfaResolution {
    /// Returns the configuration value for this policy.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FailOpen => "fail_open",
            Self::FailClosed => "fail_closed",
        }
    }
}

impl FromStr for MfaResolution {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "fail_open" => Ok(Self::FailOpen),
            "fail_closed" => Ok(Self::FailClosed),
            _ => Err(AppError::Validation(format!(
                "MFA resolution policy must be 'fail_open' or 'fail_closed', got '{value}'"
            ))),
        }
    }
}

/// Which path established the session being resolved. A fresh interactive
/// sign-in never honors provider-reported assurance; returning to an
/// already-open session does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolutionPath {
    FreshSignIn,
    Existing,
}

/// Queued follow-up job: resolve profile and MFA standing for an identity.
struct AccessResolution {
    identity: Identity,
    path: ResolutionPath,
}

struct ControllerState {
    session: SessionState,
    /// Whether a step-up challenge was passed during this client session.
    /// Consulted by later resolutions so a silent token refresh does not
    /// re-prompt; discarded on every fresh sign-in.
    verified_this_session: bool,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Session state controller for one connected client.
pub struct SessionService {
    identity_provider: Arc<dyn IdentityProvider>,
    admin_profiles: Arc<dyn AdminProfileRepository>,
    audit_service: AuditService,
    mfa_resolution: MfaResolution,
    state: RwLock<ControllerState>,
    follow_ups: Mutex<VecDeque<AccessResolution>>,
}

impl SessionService {
    /// Creates a controller in the signed-out, still-loading shape.
    #[must_use]
    pub fn new(
        identity_provider: Arc<dyn IdentityProvider>,
        admin_profiles: Arc<dyn AdminProfileRepository>,
        audit_service: AuditService,
        mfa_resolution: MfaResolution,
    ) -> Self {
        Self {
            identity_provider,
            admin_profiles,
            audit_service,
            mfa_resolution,
            state: RwLock::new(ControllerState {
                session: SessionState::loading(),
                verified_this_session: false,
            }),
            follow_ups: Mutex::new(VecDeque::new()),
        }
    }

    /// Returns a copy of the current session state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.session.clone()
    }

    /// Returns the authenticated identity, if any.
    pub async fn current_identity(&self) -> Option<Identity> {
        self.state.read().await.session.identity.clone()
    }

    /// Returns the resolved administrator profile, if any.
    pub async fn current_admin_profile(&self) -> Option<AdminProfile> {
        self.state.read().await.session.admin_profile.clone()
    }

    /// Returns whether the identity has recognized administrator standing.
    pub async fn is_admin(&self) -> bool {
        self.state.read().await.session.admin_profile.is_some()
    }

    /// Returns whether a step-up is required for this session.
    pub async fn mfa_required(&self) -> bool {
        self.state.read().await.session.mfa_required
    }

    /// Returns whether any required step-up has been satisfied.
    pub async fn mfa_verified(&self) -> bool {
        self.state.read().await.session.mfa_verified
    }

    /// Returns whether the session is fully usable (see
    /// [`SessionState::is_ready`]).
    pub async fn session_ready(&self) -> bool {
        self.state.read().await.session.is_ready()
    }

    /// Returns the region predicate for the signed-in administrator.
    ///
    /// The engine exposes the filter; callers apply it to their queries.
    pub async fn region_filter(&self) -> Option<RegionFilter> {
        self.state
            .read()
            .await
            .session
            .admin_profile
            .as_ref()
            .map(AdminProfile::region_filter)
    }
}

mod credentials;
mod events;
mod mfa;
