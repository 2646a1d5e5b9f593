// Google sign-in and session endpoints

use std::sync::Arc;

use super::respond;
use crate::error::AppError;
use crate::models::{AuthUser, MessageResponse, OAuthCallbackQuery};
use crate::usecase::AuthUseCase;

/// GET /api/auth/google
pub async fn google_login_handler(
    accounts: Arc<dyn AuthUseCase>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&accounts.authorization()))
}

/// GET /api/auth/google/callback
pub async fn google_callback_handler(
    query: OAuthCallbackQuery,
    accounts: Arc<dyn AuthUseCase>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Some(error) = query.error.filter(|e| !e.is_empty()) {
        tracing::warn!(%error, "google returned an oauth error");
        return Ok(respond::<()>(Err(AppError::bad_request(format!(
            "OAuth error: {}",
            error
        )))));
    }

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        return Ok(respond::<()>(Err(AppError::bad_request(
            "No authorization code provided",
        ))));
    };

    // State is echoed back to the client, which compares it with the one it was given
    let result = accounts.login_with_google(&code).await.map(|mut login| {
        login.state = query.state;
        login
    });
    Ok(respond(result))
}

/// GET /api/auth/me
pub async fn me_handler(
    user: AuthUser,
    accounts: Arc<dyn AuthUseCase>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = accounts
        .get_user_by_id(&user.id)
        .await
        .map(|stored| AuthUser::from(&stored));
    Ok(respond(result))
}

/// POST /api/auth/logout
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout_handler(user: AuthUser) -> Result<impl warp::Reply, warp::Rejection> {
    tracing::info!(user_id = %user.id, "user logged out");
    Ok(warp::reply::json(&MessageResponse::new("Logged out successfully")))
}
