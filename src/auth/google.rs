//! Google OAuth 2.0 authorization code flow

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rand::RngCore;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Invalid OAuth configuration: {0}")]
    InvalidConfig(String),

    #[error("OAuth request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Error reported by Google, e.g. `invalid_grant`
    #[error("OAuth error: {error} - {description}")]
    Provider { error: String, description: String },

    #[error("Invalid OAuth response: {0}")]
    InvalidResponse(String),
}

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

/// OpenID Connect profile
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub sub: String,
    pub email: String,
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Clone)]
pub struct GoogleOAuth {
    http_client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
    auth_url: Url,
    token_url: String,
    userinfo_url: String,
}

impl GoogleOAuth {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Result<Self, OAuthError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| OAuthError::InvalidConfig(e.to_string()))?;
        let auth_url = Url::parse(AUTH_URL).map_err(|e| OAuthError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http_client,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scopes,
            auth_url,
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
        })
    }

    /// Replace the token and userinfo endpoints (used by tests)
    pub fn with_endpoints(mut self, token_url: impl Into<String>, userinfo_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self.userinfo_url = userinfo_url.into();
        self
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Consent screen URL the browser is sent to
    pub fn authorization_url(&self, state: &str) -> Url {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", state);
        url
    }

    /// 32 random bytes, base64url encoded
    pub fn generate_state() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE.encode(bytes)
    }

    pub async fn exchange_code(&self, code: &str) -> Result<GoogleToken, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        response
            .json::<GoogleToken>()
            .await
            .map_err(|e| OAuthError::InvalidResponse(e.to_string()))
    }

    pub async fn fetch_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, OAuthError> {
        let response = self
            .http_client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        response
            .json::<GoogleUserInfo>()
            .await
            .map_err(|e| OAuthError::InvalidResponse(e.to_string()))
    }
}

async fn provider_error(response: reqwest::Response) -> OAuthError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(err) => OAuthError::Provider {
            error: err.error,
            description: err.error_description.unwrap_or_default(),
        },
        Err(_) => OAuthError::Provider {
            error: status.as_str().to_string(),
            description: body,
        },
    }
}
