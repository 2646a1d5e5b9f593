//! Bearer token issue and validation

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::AuthUser;

/// Claims carried by an issued token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
}

/// Issues HS256 tokens and verifies HMAC-signed tokens with a shared secret
#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl AuthService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self::with_ttl(secret, Duration::hours(ttl_hours))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn generate_token(&self, user: &AuthUser) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user.id.clone(),
            email: user.email.clone(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "failed to sign token");
            AppError::internal("Failed to generate token")
        })
    }

    /// Verify signature, algorithm and time claims.
    ///
    /// Any HMAC variant signed with the shared secret is accepted.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_nbf = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AppError::token_expired(),
                _ => AppError::invalid_token(),
            })
    }

    /// Resolve the caller from an `Authorization` header value
    pub fn authenticate(&self, header: Option<&str>) -> Result<AuthUser, AppError> {
        let header = header
            .filter(|h| !h.is_empty())
            .ok_or_else(|| AppError::unauthorized("Authorization header required"))?;

        let token = match header.split(' ').collect::<Vec<_>>().as_slice() {
            // "Bearer " splits to an empty token, which then fails validation
            ["Bearer", token] => *token,
            _ => return Err(AppError::unauthorized("Invalid authorization header format")),
        };

        let claims = self.validate_token(token)?;
        Ok(AuthUser {
            id: claims.user_id,
            email: claims.email,
            name: None,
            image: None,
        })
    }
}
