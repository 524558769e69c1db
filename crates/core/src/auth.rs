use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier the identity provider assigns to a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityId(Uuid);

impl IdentityId {
    /// Creates a new random identity identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identity identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// The authenticated principal as known to the identity provider.
///
/// Held by reference only; credentials and factor secrets stay with the
/// provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    id: IdentityId,
    email: String,
}

impl Identity {
    /// Creates an identity from provider session data.
    #[must_use]
    pub fn new(id: IdentityId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }

    /// Returns the stable identifier from the identity provider.
    #[must_use]
    pub fn id(&self) -> IdentityId {
        self.id
    }

    /// Returns the email the provider associates with the identity.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }
}

/// Typed failures surfaced from credential and step-up flows.
///
/// These are returned to the caller so the sign-in form can show a message;
/// transport failures inside session resolution never use this type.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credentials were rejected. Deliberately generic to prevent
    /// account enumeration.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The account exists but its email address is not yet confirmed.
    #[error("email address has not been confirmed")]
    EmailNotConfirmed,

    /// A step-up challenge code was rejected by the provider.
    #[error("multi-factor challenge rejected")]
    MfaChallengeRejected,

    /// The provider could not be reached or answered with a server error.
    #[error("identity provider error: {0}")]
    Provider(String),
}

#[cfg(test)]
mod tests {
    use super::{Identity, IdentityId};

    #[test]
    fn identity_id_formats_as_uuid() {
        let identity_id = IdentityId::new();
        assert_eq!(identity_id.to_string().len(), 36);
    }

    #[test]
    fn identity_exposes_provider_fields() {
        let id = IdentityId::new();
        let identity = Identity::new(id, "lead@aspira.org");
        assert_eq!(identity.id(), id);
        assert_eq!(identity.email(), "lead@aspira.org");
    }
}
