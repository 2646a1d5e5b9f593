// Handlers module

pub mod ai;
pub mod auth;
pub mod email;
pub mod system;

pub use ai::{ask_handler, conversations_handler};
pub use auth::{google_callback_handler, google_login_handler, logout_handler, me_handler};
pub use email::{list_emails_handler, mark_read_handler, send_email_handler, sync_emails_handler};
pub use system::{health_handler, root_handler, HealthCheck};

use serde::Serialize;
use warp::http::StatusCode;
use warp::Reply;

use crate::error::AppError;

/// JSON 200 on success, the error's own status otherwise
pub(crate) fn respond<T: Serialize>(result: Result<T, AppError>) -> warp::reply::Response {
    match result {
        Ok(body) => warp::reply::json(&body).into_response(),
        Err(err) => {
            if err.status() == StatusCode::INTERNAL_SERVER_ERROR {
                tracing::error!(error = %err, "request failed");
            }
            err.to_reply().into_response()
        }
    }
}
