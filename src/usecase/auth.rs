//! Google sign-in and account lookup

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{AuthService, GoogleOAuth, GoogleUserInfo, OAuthError};
use crate::cache::{google_token_key, KeyValueCache};
use crate::error::AppError;
use crate::models::{AuthUrlResponse, AuthUser, LoginResponse, User};
use crate::repository::UserStore;

/// Token lifetime assumed when Google omits `expires_in`
const DEFAULT_GOOGLE_TOKEN_TTL: Duration = Duration::from_secs(3600);

#[async_trait]
pub trait AuthUseCase: Send + Sync {
    /// Consent URL plus the state value embedded in it
    fn authorization(&self) -> AuthUrlResponse;

    async fn login_with_google(&self, code: &str) -> Result<LoginResponse, AppError>;

    async fn get_user_by_id(&self, user_id: &str) -> Result<User, AppError>;
}

pub struct AccountService {
    oauth: GoogleOAuth,
    users: Arc<dyn UserStore>,
    tokens: Arc<AuthService>,
    cache: Option<Arc<dyn KeyValueCache>>,
}

impl AccountService {
    pub fn new(oauth: GoogleOAuth, users: Arc<dyn UserStore>, tokens: Arc<AuthService>) -> Self {
        Self {
            oauth,
            users,
            tokens,
            cache: None,
        }
    }

    /// Keep Google access tokens for later Gmail calls
    pub fn with_token_cache(mut self, cache: Arc<dyn KeyValueCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Create the user on first sign-in, refresh the profile otherwise
    async fn upsert_user(&self, profile: GoogleUserInfo) -> Result<User, AppError> {
        let db_error = |e: crate::db::DbError| {
            tracing::error!(error = %e, "user store failed");
            AppError::database_error()
        };

        let now = Utc::now();
        let verified = profile.email_verified.unwrap_or(false);

        match self.users.get_by_email(&profile.email).await.map_err(db_error)? {
            Some(existing) => {
                let user = User {
                    name: profile.name.or(existing.name),
                    image: profile.picture.or(existing.image),
                    email_verified: existing.email_verified.or(verified.then_some(now)),
                    ..existing
                };
                self.users
                    .update(&user)
                    .await
                    .map_err(db_error)?
                    .ok_or_else(AppError::user_not_found)
            }
            None => {
                let user = User {
                    id: Uuid::new_v4().to_string(),
                    email: profile.email,
                    name: profile.name,
                    image: profile.picture,
                    email_verified: verified.then_some(now),
                    created_at: now,
                    updated_at: now,
                };
                tracing::info!(user_id = %user.id, "creating user on first sign-in");
                self.users.create(&user).await.map_err(db_error)
            }
        }
    }
}

fn oauth_failure(e: OAuthError) -> AppError {
    match e {
        OAuthError::Provider { .. } | OAuthError::InvalidResponse(_) => {
            AppError::unauthorized("Google authentication failed").with_details(e.to_string())
        }
        OAuthError::Http(_) | OAuthError::InvalidConfig(_) => {
            tracing::error!(error = %e, "google oauth unreachable");
            AppError::external_service_unavailable()
        }
    }
}

#[async_trait]
impl AuthUseCase for AccountService {
    fn authorization(&self) -> AuthUrlResponse {
        let state = GoogleOAuth::generate_state();
        AuthUrlResponse {
            authorization_url: self.oauth.authorization_url(&state).to_string(),
            state,
        }
    }

    async fn login_with_google(&self, code: &str) -> Result<LoginResponse, AppError> {
        let google_token = self.oauth.exchange_code(code).await.map_err(oauth_failure)?;
        let profile = self
            .oauth
            .fetch_user_info(&google_token.access_token)
            .await
            .map_err(oauth_failure)?;

        let user = self.upsert_user(profile).await?;

        if let Some(cache) = &self.cache {
            let ttl = google_token
                .expires_in
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_GOOGLE_TOKEN_TTL);
            if let Err(e) = cache
                .store(&google_token_key(&user.id), &google_token.access_token, Some(ttl))
                .await
            {
                tracing::warn!(user_id = %user.id, error = %e, "failed to cache google token");
            }
        }

        let auth_user = AuthUser::from(&user);
        let token = self.tokens.generate_token(&auth_user)?;
        tracing::info!(user_id = %user.id, "user signed in");

        Ok(LoginResponse {
            message: "Authentication successful".to_string(),
            token,
            user: auth_user,
            state: None,
        })
    }

    async fn get_user_by_id(&self, user_id: &str) -> Result<User, AppError> {
        match self.users.get_by_id(user_id).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AppError::user_not_found()),
            Err(e) => {
                tracing::error!(user_id, error = %e, "failed to load user");
                Err(AppError::database_error())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use warp::http::StatusCode;

    use crate::db::{DbError, Result as DbResult};

    #[derive(Default)]
    struct MemoryUsers {
        rows: Mutex<Vec<User>>,
        fail: bool,
    }

    #[async_trait]
    impl UserStore for MemoryUsers {
        async fn create(&self, user: &User) -> DbResult<User> {
            self.rows.lock().unwrap().push(user.clone());
            Ok(user.clone())
        }

        async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
            if self.fail {
                return Err(DbError::Timeout("pool".to_string()));
            }
            Ok(self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned())
        }

        async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
            Ok(self.rows.lock().unwrap().iter().find(|u| u.email == email).cloned())
        }

        async fn update(&self, user: &User) -> DbResult<Option<User>> {
            let mut rows = self.rows.lock().unwrap();
            let Some(row) = rows.iter_mut().find(|u| u.id == user.id) else {
                return Ok(None);
            };
            *row = User {
                updated_at: Utc::now(),
                ..user.clone()
            };
            Ok(Some(row.clone()))
        }

        async fn delete(&self, id: &str) -> DbResult<bool> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|u| u.id != id);
            Ok(rows.len() != before)
        }
    }

    fn service(users: Arc<MemoryUsers>) -> AccountService {
        let oauth = GoogleOAuth::new(
            "client",
            "secret",
            "http://localhost:8080/api/auth/google/callback",
            vec!["openid".to_string(), "email".to_string()],
        )
        .unwrap();
        AccountService::new(oauth, users, Arc::new(AuthService::new("secret", 1)))
    }

    fn profile(name: Option<&str>) -> GoogleUserInfo {
        GoogleUserInfo {
            sub: "1234".to_string(),
            email: "ada@example.com".to_string(),
            email_verified: Some(true),
            name: name.map(str::to_string),
            picture: None,
        }
    }

    #[test]
    fn test_authorization_embeds_state() {
        let auth = service(Arc::new(MemoryUsers::default())).authorization();
        let url = url::Url::parse(&auth.authorization_url).unwrap();
        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        // Padded base64url state arrives percent-encoded; compare decoded values
        assert_eq!(query.get("state"), Some(&auth.state));
        assert!(auth.state.ends_with('='));
        assert_eq!(query.get("client_id").map(String::as_str), Some("client"));
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let users = Arc::new(MemoryUsers::default());
        let svc = service(users.clone());

        let created = svc.upsert_user(profile(Some("Ada"))).await.unwrap();
        assert!(created.email_verified.is_some());

        let updated = svc.upsert_user(profile(Some("Ada Lovelace"))).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(updated.email_verified, created.email_verified);

        // A missing name in the profile keeps the stored one
        let kept = svc.upsert_user(profile(None)).await.unwrap();
        assert_eq!(kept.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(users.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_user_by_id() {
        let users = Arc::new(MemoryUsers::default());
        let svc = service(users.clone());
        let user = svc.upsert_user(profile(Some("Ada"))).await.unwrap();

        assert_eq!(svc.get_user_by_id(&user.id).await.unwrap().email, "ada@example.com");

        let err = svc.get_user_by_id("missing").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message, "User not found");
    }

    #[tokio::test]
    async fn test_get_user_store_failure() {
        let svc = service(Arc::new(MemoryUsers {
            fail: true,
            ..Default::default()
        }));

        let err = svc.get_user_by_id("u1").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Database error occurred");
    }

    #[test]
    fn test_oauth_failure_mapping() {
        let err = oauth_failure(OAuthError::Provider {
            error: "invalid_grant".to_string(),
            description: "Bad Request".to_string(),
        });
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert!(err.details.unwrap().contains("invalid_grant"));

        let err = oauth_failure(OAuthError::InvalidConfig("tls".to_string()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
