// Route definitions, auth gate and rejection handling

use std::convert::Infallible;
use std::sync::Arc;

use warp::{Filter, Rejection, Reply};

use crate::auth::AuthService;
use crate::error::AppError;
use crate::handlers::{self, HealthCheck};
use crate::models::AuthUser;
use crate::usecase::{AiUseCase, AuthUseCase, EmailUseCase};

/// Everything the handlers need, shared across requests
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub ai: Arc<dyn AiUseCase>,
    pub emails: Arc<dyn EmailUseCase>,
    pub accounts: Arc<dyn AuthUseCase>,
    pub health: Arc<HealthCheck>,
    /// From address for outbound mail
    pub sender: String,
}

pub fn configure_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let api = warp::path("api");
    let authed = with_auth(state.auth.clone());

    // GET /
    let root = warp::path::end()
        .and(warp::get())
        .and_then(handlers::root_handler);

    // GET /health
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with(state.health.clone()))
        .and_then(handlers::health_handler);

    // GET /api/auth/google
    let google_login = api
        .and(warp::path("auth"))
        .and(warp::path("google"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with(state.accounts.clone()))
        .and_then(handlers::google_login_handler);

    // GET /api/auth/google/callback
    let google_callback = api
        .and(warp::path("auth"))
        .and(warp::path("google"))
        .and(warp::path("callback"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query())
        .and(with(state.accounts.clone()))
        .and_then(handlers::google_callback_handler);

    // GET /api/auth/me
    let me = api
        .and(warp::path("auth"))
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(warp::get())
        .and(authed.clone())
        .and(with(state.accounts.clone()))
        .and_then(handlers::me_handler);

    // POST /api/auth/logout
    let logout = api
        .and(warp::path("auth"))
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(warp::post())
        .and(authed.clone())
        .and_then(handlers::logout_handler);

    // POST /api/ai/ask
    let ask = api
        .and(warp::path("ai"))
        .and(warp::path("ask"))
        .and(warp::path::end())
        .and(warp::post())
        .and(authed.clone())
        .and(warp::body::json())
        .and(with(state.ai.clone()))
        .and_then(handlers::ask_handler);

    // GET /api/ai/conversations
    let conversations = api
        .and(warp::path("ai"))
        .and(warp::path("conversations"))
        .and(warp::path::end())
        .and(warp::get())
        .and(authed.clone())
        .and(warp::query())
        .and(with(state.ai.clone()))
        .and_then(handlers::conversations_handler);

    // GET /api/emails
    let list_emails = api
        .and(warp::path("emails"))
        .and(warp::path::end())
        .and(warp::get())
        .and(authed.clone())
        .and(warp::query())
        .and(with(state.emails.clone()))
        .and_then(handlers::list_emails_handler);

    // POST /api/emails/send
    let send_email = api
        .and(warp::path("emails"))
        .and(warp::path("send"))
        .and(warp::path::end())
        .and(warp::post())
        .and(authed.clone())
        .and(warp::body::json())
        .and(with(state.emails.clone()))
        .and(with(state.sender.clone()))
        .and_then(handlers::send_email_handler);

    // POST /api/emails/sync
    let sync_emails = api
        .and(warp::path("emails"))
        .and(warp::path("sync"))
        .and(warp::path::end())
        .and(warp::post())
        .and(authed.clone())
        .and(with(state.emails.clone()))
        .and_then(handlers::sync_emails_handler);

    // POST /api/emails/{id}/read
    let mark_read = api
        .and(warp::path("emails"))
        .and(warp::path::param::<String>())
        .and(warp::path("read"))
        .and(warp::path::end())
        .and(warp::post())
        .and(authed)
        .and(with(state.emails.clone()))
        .and_then(handlers::mark_read_handler);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["authorization", "content-type"])
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"]);

    // Combine routes
    root.or(health)
        .or(google_login)
        .or(google_callback)
        .or(me)
        .or(logout)
        .or(ask)
        .or(conversations)
        .or(list_emails)
        .or(send_email)
        .or(sync_emails)
        .or(mark_read)
        .recover(handle_rejection)
        .with(cors)
        .with(warp::log::custom(|info| {
            tracing::info!(
                method = %info.method(),
                path = info.path(),
                status = info.status().as_u16(),
                elapsed_ms = info.elapsed().as_millis() as u64,
                "request completed"
            );
        }))
}

fn with<T: Clone + Send>(value: T) -> impl Filter<Extract = (T,), Error = Infallible> + Clone {
    warp::any().map(move || value.clone())
}

/// Resolve the caller from the bearer token or reject with 401
pub fn with_auth(auth: Arc<AuthService>) -> impl Filter<Extract = (AuthUser,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let auth = auth.clone();
        async move {
            auth.authenticate(header.as_deref())
                .map_err(warp::reject::custom)
        }
    })
}

/// Convert every rejection into the JSON error body
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let error = if let Some(app_error) = err.find::<AppError>() {
        app_error.clone()
    } else if err.is_not_found() {
        AppError::not_found("Not found")
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        AppError::bad_request("Invalid JSON")
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        AppError::bad_request("Invalid query parameters")
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        AppError::bad_request("Content-Type must be application/json")
    } else if err.find::<warp::reject::InvalidHeader>().is_some() {
        AppError::bad_request("Invalid header")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        AppError::method_not_allowed("Method not allowed")
    } else {
        tracing::error!(rejection = ?err, "unhandled rejection");
        AppError::internal("Internal server error")
    };

    Ok(error.to_reply())
}
