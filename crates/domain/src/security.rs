use std::str::FromStr;

use aspira_core::AppError;
use serde::{Deserialize, Serialize};

/// Stable security-relevant actions recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityAction {
    /// A sign-in attempt succeeded.
    SignInSucceeded,
    /// A sign-in attempt was rejected.
    SignInFailed,
    /// A step-up challenge was completed for the current session.
    MfaStepUpVerified,
    /// The administrator signed out.
    SignedOut,
    /// The session was forcibly ended after the idle window elapsed.
    SessionExpiredIdle,
    /// An administrator's role assignment was changed.
    RoleChanged,
    /// Multi-factor enrollment was enabled or disabled for an account.
    MfaToggled,
    /// An administrator profile was removed.
    AdminProfileRemoved,
}

impl SecurityAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignInSucceeded => "auth.sign_in.succeeded",
            Self::SignInFailed => "auth.sign_in.failed",
            Self::MfaStepUpVerified => "auth.mfa.step_up_verified",
            Self::SignedOut => "auth.signed_out",
            Self::SessionExpiredIdle => "auth.session.expired_idle",
            Self::RoleChanged => "admin.role.changed",
            Self::MfaToggled => "admin.mfa.toggled",
            Self::AdminProfileRemoved => "admin.profile.removed",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[SecurityAction] = &[
            SecurityAction::SignInSucceeded,
            SecurityAction::SignInFailed,
            SecurityAction::MfaStepUpVerified,
            SecurityAction::SignedOut,
            SecurityAction::SessionExpiredIdle,
            SecurityAction::RoleChanged,
            SecurityAction::MfaToggled,
            SecurityAction::AdminProfileRemoved,
        ];

        ALL
    }
}

impl FromStr for SecurityAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "auth.sign_in.succeeded" => Ok(Self::SignInSucceeded),
            "auth.sign_in.failed" => Ok(Self::SignInFailed),
            "auth.mfa.step_up_verified" => Ok(Self::MfaStepUpVerified),
            "auth.signed_out" => Ok(Self::SignedOut),
            "auth.session.expired_idle" => Ok(Self::SessionExpiredIdle),
            "admin.role.changed" => Ok(Self::RoleChanged),
            "admin.mfa.toggled" => Ok(Self::MfaToggled),
            "admin.profile.removed" => Ok(Self::AdminProfileRemoved),
            _ => Err(AppError::Validation(format!(
                "unknown security action '{value}'"
            ))),
        }
    }
}
