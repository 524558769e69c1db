//! Multi-factor status types.
//!
//! `MfaStatus` is recomputed from the provider's live factor list on every
//! session establishment, never patched incrementally.

use std::str::FromStr;

use aspira_core::AppError;
use serde::{Deserialize, Serialize};

/// The provider's classification of how strongly a session was verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssuranceLevel {
    /// Single-factor session.
    Basic,
    /// Session elevated by a completed step-up challenge.
    Elevated,
}

impl AssuranceLevel {
    /// Returns the provider wire value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "aal1",
            Self::Elevated => "aal2",
        }
    }

    /// Returns whether the session completed a step-up challenge.
    #[must_use]
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::Elevated)
    }
}

impl FromStr for AssuranceLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "aal1" => Ok(Self::Basic),
            "aal2" => Ok(Self::Elevated),
            _ => Err(AppError::Validation(format!(
                "unknown assurance level '{value}'"
            ))),
        }
    }
}

/// Enrollment state of a single factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorStatus {
    /// Enrollment completed; the factor counts toward step-up requirements.
    Verified,
    /// Enrollment started but never confirmed.
    Unverified,
}

/// One enrolled factor as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MfaFactor {
    /// Provider-issued factor identifier, used for step-up challenges.
    pub id: String,
    /// Enrollment state.
    pub status: FactorStatus,
}

impl MfaFactor {
    /// Returns whether this factor requires a step-up on sign-in.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.status == FactorStatus::Verified
    }
}

/// Derived multi-factor standing for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MfaStatus {
    /// Whether at least one verified factor is enrolled.
    pub has_verified_factor: bool,
    /// Provider-reported assurance for the session.
    pub assurance: AssuranceLevel,
}
