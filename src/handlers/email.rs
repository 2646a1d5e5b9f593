// /api/emails handlers

use std::sync::Arc;

use super::respond;
use crate::models::{AuthUser, EmailListQuery, MessageResponse, SendEmailRequest, SendEmailResponse, SyncResponse};
use crate::usecase::EmailUseCase;

/// GET /api/emails
pub async fn list_emails_handler(
    user: AuthUser,
    query: EmailListQuery,
    emails: Arc<dyn EmailUseCase>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let limit = query.limit.unwrap_or(0);
    let offset = query.offset.unwrap_or(0);
    Ok(respond(emails.get_user_emails(&user.id, limit, offset).await))
}

/// POST /api/emails/send, sent from the configured sender address
pub async fn send_email_handler(
    user: AuthUser,
    request: SendEmailRequest,
    emails: Arc<dyn EmailUseCase>,
    sender: String,
) -> Result<impl warp::Reply, warp::Rejection> {
    tracing::info!(user_id = %user.id, recipients = request.to.len(), "sending email");

    let result = emails
        .send_email(&sender, request.to, &request.subject, &request.body)
        .await
        .map(|id| SendEmailResponse {
            message: "Email sent successfully".to_string(),
            id,
        });
    Ok(respond(result))
}

/// POST /api/emails/sync
pub async fn sync_emails_handler(
    user: AuthUser,
    emails: Arc<dyn EmailUseCase>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = emails
        .sync_gmail_emails(&user.id)
        .await
        .map(|synced| SyncResponse {
            message: "Emails synced successfully".to_string(),
            synced,
        });
    Ok(respond(result))
}

/// POST /api/emails/{id}/read
pub async fn mark_read_handler(
    email_id: String,
    user: AuthUser,
    emails: Arc<dyn EmailUseCase>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = emails
        .mark_email_as_read(&user.id, &email_id)
        .await
        .map(|()| MessageResponse::new("Email marked as read"));
    Ok(respond(result))
}
