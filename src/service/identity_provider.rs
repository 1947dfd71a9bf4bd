use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;

pub const PROVIDER_GOOGLE: &str = "google";

/// Verified identity handed over by an external sign-in provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityAssertion {
    pub provider: String,
    pub external_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} is not set")]
    NotConfigured(&'static str),
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("provider returned no email")]
    MissingEmail,
    #[error("provider email is not verified")]
    UnverifiedEmail,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorize_url(&self, state: &str) -> Result<String, ProviderError>;
    async fn exchange(&self, code: &str) -> Result<IdentityAssertion, ProviderError>;
}

#[derive(Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    given_name: Option<String>,
    family_name: Option<String>,
    picture: Option<String>,
}

struct GoogleCredentials<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    redirect_url: &'a str,
}

pub struct GoogleIdentityProvider {
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_url: Option<String>,
    authorize_url: String,
    token_url: String,
    userinfo_url: String,
    client: reqwest::Client,
}

impl GoogleIdentityProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_url: config.google_redirect_url.clone(),
            authorize_url: config.google_authorize_url.clone(),
            token_url: config.google_token_url.clone(),
            userinfo_url: config.google_userinfo_url.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn credentials(&self) -> Result<GoogleCredentials<'_>, ProviderError> {
        let Some(client_id) = &self.client_id else {
            return Err(ProviderError::NotConfigured("AUTH_GOOGLE_CLIENT_ID"));
        };
        let Some(client_secret) = &self.client_secret else {
            return Err(ProviderError::NotConfigured("AUTH_GOOGLE_CLIENT_SECRET"));
        };
        let Some(redirect_url) = &self.redirect_url else {
            return Err(ProviderError::NotConfigured("AUTH_GOOGLE_REDIRECT_URL"));
        };
        Ok(GoogleCredentials {
            client_id,
            client_secret,
            redirect_url,
        })
    }

    fn into_assertion(user: GoogleUserInfo) -> Result<IdentityAssertion, ProviderError> {
        if user.email_verified == Some(false) {
            return Err(ProviderError::UnverifiedEmail);
        }
        let email = user
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or(ProviderError::MissingEmail)?;
        Ok(IdentityAssertion {
            provider: PROVIDER_GOOGLE.to_string(),
            external_id: user.sub,
            email,
            first_name: user.given_name,
            last_name: user.family_name,
            avatar_url: user.picture,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn authorize_url(&self, state: &str) -> Result<String, ProviderError> {
        let credentials = self.credentials()?;
        let delimiter = if self.authorize_url.contains('?') { "&" } else { "?" };
        Ok(format!(
            "{}{}client_id={}&redirect_uri={}&response_type=code&scope=openid%20email%20profile&state={}",
            self.authorize_url,
            delimiter,
            urlencoding::encode(credentials.client_id),
            urlencoding::encode(credentials.redirect_url),
            urlencoding::encode(state)
        ))
    }

    async fn exchange(&self, code: &str) -> Result<IdentityAssertion, ProviderError> {
        let credentials = self.credentials()?;

        let token = self
            .client
            .post(&self.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", credentials.client_id),
                ("client_secret", credentials.client_secret),
                ("code", code),
                ("redirect_uri", credentials.redirect_url),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<GoogleTokenResponse>()
            .await?;

        let user = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(&token.access_token)
            .header("User-Agent", "portfolio-api")
            .send()
            .await?
            .error_for_status()?
            .json::<GoogleUserInfo>()
            .await?;

        Self::into_assertion(user)
    }
}
