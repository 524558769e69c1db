use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use aspira_application::{IdentityProvider, ProviderSession};
use aspira_core::{AppError, AppResult, AuthError, Identity, IdentityId};
use aspira_domain::{AssuranceLevel, FactorStatus, MfaFactor};

/// HTTP client for the hosted identity provider.
///
/// One instance per connected client: it carries that client's bearer token
/// for session, factor, and step-up calls. The provider owns credential
/// storage and token formats; this adapter only speaks the narrow session
/// contract.
pub struct HttpIdentityProvider {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: RwLock<Option<String>>,
}

#[derive(Debug, Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct ChallengeBody<'a> {
    code: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    aal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    access_token: String,
    user: ProviderUser,
}

#[derive(Debug, Deserialize)]
struct SignUpBody {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<ProviderUser>,
}

#[derive(Debug, Deserialize)]
struct VerifyBody {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FactorBody {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

impl HttpIdentityProvider {
    /// Creates a provider client for one connected client session.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            access_token: RwLock::new(None),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn bearer_token(&self) -> Option<String> {
        self.access_token.read().await.clone()
    }

    async fn store_token(&self, token: Option<String>) {
        *self.access_token.write().await = token;
    }

    fn identity_from_user(user: &ProviderUser) -> Identity {
        Identity::new(
            IdentityId::from_uuid(user.id),
            user.email.clone().unwrap_or_default(),
        )
    }

    /// Maps a rejected credential or challenge response onto the typed
    /// error surface.
    async fn auth_failure(response: reqwest::Response) -> AuthError {
        let status = response.status();
        let body = response.json::<ErrorBody>().await.unwrap_or_default();

        match body.error_code.as_deref() {
            Some("email_not_confirmed") => AuthError::EmailNotConfirmed,
            Some(_) if status.is_client_error() => AuthError::InvalidCredentials,
            _ if status == reqwest::StatusCode::BAD_REQUEST
                || status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY =>
            {
                AuthError::InvalidCredentials
            }
            _ => AuthError::Provider(
                body.msg
                    .unwrap_or_else(|| format!("provider answered with status {status}")),
            ),
        }
    }

    async fn fetch_user(&self) -> AppResult<Option<ProviderUser>> {
        let Some(token) = self.bearer_token().await else {
            return Ok(None);
        };

        let response = self
            .http_client
            .get(self.endpoint("/user"))
            .header("apikey", &self.api_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to reach identity provider: {error}"))
            })?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            // The stored token no longer maps to a live session.
            self.store_token(None).await;
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "session lookup failed with status {}",
                response.status()
            )));
        }

        let user = response.json::<ProviderUser>().await.map_err(|error| {
            AppError::Internal(format!("failed to decode provider user: {error}"))
        })?;

        Ok(Some(user))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in(&self, email: &str, secret: &str) -> Result<ProviderSession, AuthError> {
        let response = self
            .http_client
            .post(self.endpoint("/token?grant_type=password"))
            .header("apikey", &self.api_key)
            .json(&CredentialsBody {
                email,
                password: secret,
            })
            .send()
            .await
            .map_err(|error| AuthError::Provider(error.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::auth_failure(response).await);
        }

        let body = response
            .json::<TokenBody>()
            .await
            .map_err(|error| AuthError::Provider(format!("malformed token response: {error}")))?;

        let identity = Self::identity_from_user(&body.user);
        self.store_token(Some(body.access_token)).await;

        Ok(ProviderSession { identity })
    }

    async fn sign_up(
        &self,
        email: &str,
        secret: &str,
    ) -> Result<Option<ProviderSession>, AuthError> {
        let response = self
            .http_client
            .post(self.endpoint("/signup"))
            .header("apikey", &self.api_key)
            .json(&CredentialsBody {
                email,
                password: secret,
            })
            .send()
            .await
            .map_err(|error| AuthError::Provider(error.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::auth_failure(response).await);
        }

        let body = response
            .json::<SignUpBody>()
            .await
            .map_err(|error| AuthError::Provider(format!("malformed signup response: {error}")))?;

        // Without a token the account still awaits email confirmation.
        match (body.access_token, body.user) {
            (Some(token), Some(user)) => {
                let identity = Self::identity_from_user(&user);
                self.store_token(Some(token)).await;
                Ok(Some(ProviderSession { identity }))
            }
            _ => Ok(None),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.bearer_token().await;
        // The local token is dropped no matter what the provider answers.
        self.store_token(None).await;

        let Some(token) = token else {
            return Ok(());
        };

        let response = self
            .http_client
            .post(self.endpoint("/logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| AuthError::Provider(error.to_string()))?;

        if response.status().is_success() || response.status() == reqwest::StatusCode::UNAUTHORIZED
        {
            Ok(())
        } else {
            Err(AuthError::Provider(format!(
                "sign-out answered with status {}",
                response.status()
            )))
        }
    }

    async fn current_session(&self) -> AppResult<Option<ProviderSession>> {
        let user = self.fetch_user().await?;
        Ok(user.map(|user| ProviderSession {
            identity: Self::identity_from_user(&user),
        }))
    }

    async fn list_mfa_factors(&self) -> AppResult<Vec<MfaFactor>> {
        let Some(token) = self.bearer_token().await else {
            return Err(AppError::Internal(
                "no active provider session for factor listing".to_owned(),
            ));
        };

        let response = self
            .http_client
            .get(self.endpoint("/factors"))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to reach identity provider: {error}"))
            })?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "factor listing failed with status {}",
                response.status()
            )));
        }

        let factors = response.json::<Vec<FactorBody>>().await.map_err(|error| {
            AppError::Internal(format!("failed to decode factor list: {error}"))
        })?;

        Ok(factors
            .into_iter()
            .map(|factor| MfaFactor {
                id: factor.id,
                status: match factor.status.as_deref() {
                    Some("verified") => FactorStatus::Verified,
                    _ => FactorStatus::Unverified,
                },
            })
            .collect())
    }

    async fn assurance_level(&self) -> AppResult<AssuranceLevel> {
        let user = self.fetch_user().await?.ok_or_else(|| {
            AppError::Internal("no active provider session for assurance lookup".to_owned())
        })?;

        match user.aal.as_deref() {
            Some(value) => AssuranceLevel::from_str(value)
                .map_err(|error| AppError::Internal(format!("malformed assurance level: {error}"))),
            None => Ok(AssuranceLevel::Basic),
        }
    }

    async fn verify_mfa_challenge(&self, factor_id: &str, code: &str) -> Result<(), AuthError> {
        let Some(token) = self.bearer_token().await else {
            return Err(AuthError::Provider(
                "no active provider session for step-up verification".to_owned(),
            ));
        };

        let response = self
            .http_client
            .post(self.endpoint(&format!("/factors/{factor_id}/verify")))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .json(&ChallengeBody { code })
            .send()
            .await
            .map_err(|error| AuthError::Provider(error.to_string()))?;

        if response.status().is_client_error() {
            return Err(AuthError::MfaChallengeRejected);
        }

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "step-up verification answered with status {}",
                response.status()
            )));
        }

        let body = response
            .json::<VerifyBody>()
            .await
            .map_err(|error| AuthError::Provider(format!("malformed verify response: {error}")))?;

        // The provider rotates the token to an elevated one on success.
        if let Some(elevated_token) = body.access_token {
            self.store_token(Some(elevated_token)).await;
        }

        Ok(())
    }
}
