//! Stored email listing, outbound mail and Gmail sync

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::clamp_limit;
use crate::cache::{google_token_key, KeyValueCache};
use crate::error::AppError;
use crate::mail::{EmailRequest, GmailClient, GmailMessage, ResendClient};
use crate::models::Email;
use crate::repository::EmailStore;

/// Messages pulled from Gmail per sync
pub const SYNC_BATCH_SIZE: u32 = 50;

#[async_trait]
pub trait EmailUseCase: Send + Sync {
    async fn get_user_emails(&self, user_id: &str, limit: i64, offset: i64) -> Result<Vec<Email>, AppError>;

    /// Returns the id assigned by the mail provider
    async fn send_email(
        &self,
        from: &str,
        to: Vec<String>,
        subject: &str,
        body: &str,
    ) -> Result<String, AppError>;

    /// Returns the number of messages newly stored
    async fn sync_gmail_emails(&self, user_id: &str) -> Result<usize, AppError>;

    async fn mark_email_as_read(&self, user_id: &str, email_id: &str) -> Result<(), AppError>;
}

pub struct EmailService {
    store: Arc<dyn EmailStore>,
    resend: Option<ResendClient>,
    gmail: Option<GmailClient>,
    tokens: Option<Arc<dyn KeyValueCache>>,
}

impl EmailService {
    pub fn new(store: Arc<dyn EmailStore>) -> Self {
        Self {
            store,
            resend: None,
            gmail: None,
            tokens: None,
        }
    }

    pub fn with_resend(mut self, client: ResendClient) -> Self {
        self.resend = Some(client);
        self
    }

    pub fn with_gmail(mut self, client: GmailClient) -> Self {
        self.gmail = Some(client);
        self
    }

    /// Cache holding each user's Google access token
    pub fn with_token_cache(mut self, cache: Arc<dyn KeyValueCache>) -> Self {
        self.tokens = Some(cache);
        self
    }

    async fn google_access_token(&self, user_id: &str) -> Result<String, AppError> {
        let not_linked = || AppError::unauthorized("Gmail account not linked");

        let cache = self.tokens.as_ref().ok_or_else(not_linked)?;
        match cache.fetch(&google_token_key(user_id)).await {
            Ok(Some(token)) if !token.is_empty() => Ok(token),
            Ok(_) => Err(not_linked()),
            Err(e) => {
                tracing::error!(user_id, error = %e, "failed to read google token");
                Err(AppError::external_service_unavailable())
            }
        }
    }
}

fn to_email(user_id: &str, message: GmailMessage) -> Email {
    Email {
        id: Uuid::new_v4().to_string(),
        message_id: message.id,
        thread_id: message.thread_id,
        subject: message.subject,
        from: message.from,
        to: message.to,
        body: message.body,
        html_body: message.html_body,
        is_read: message.is_read,
        labels: message.labels,
        created_at: Utc::now(),
        user_id: user_id.to_string(),
    }
}

#[async_trait]
impl EmailUseCase for EmailService {
    async fn get_user_emails(&self, user_id: &str, limit: i64, offset: i64) -> Result<Vec<Email>, AppError> {
        self.store
            .get_by_user_id(user_id, clamp_limit(limit), offset.max(0))
            .await
            .map_err(|e| {
                tracing::error!(user_id, error = %e, "failed to list emails");
                AppError::database_error()
            })
    }

    async fn send_email(
        &self,
        from: &str,
        to: Vec<String>,
        subject: &str,
        body: &str,
    ) -> Result<String, AppError> {
        let resend = self
            .resend
            .as_ref()
            .ok_or_else(|| AppError::service_unavailable("Email service not configured"))?;

        if to.iter().all(|addr| addr.trim().is_empty()) {
            return Err(AppError::bad_request("At least one recipient is required"));
        }

        let request = EmailRequest {
            from: from.to_string(),
            to,
            subject: subject.to_string(),
            html: None,
            text: Some(body.to_string()),
        };

        resend
            .send_email(&request)
            .await
            .map_err(|e| AppError::internal(format!("Failed to send email: {}", e)))
    }

    async fn sync_gmail_emails(&self, user_id: &str) -> Result<usize, AppError> {
        let gmail = self
            .gmail
            .as_ref()
            .ok_or_else(|| AppError::service_unavailable("Gmail service not configured"))?;
        let token = self.google_access_token(user_id).await?;

        let messages = gmail
            .list_messages(&token, SYNC_BATCH_SIZE)
            .await
            .map_err(|e| {
                tracing::error!(user_id, error = %e, "gmail fetch failed");
                AppError::external_service_unavailable()
            })?;

        let fetched = messages.len();
        let mut stored = 0;
        for message in messages {
            let message_id = message.id.clone();
            match self.store.create(&to_email(user_id, message)).await {
                Ok(true) => stored += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(user_id, message_id = %message_id, error = %e, "skipping email")
                }
            }
        }

        tracing::info!(user_id, fetched, stored, "gmail sync complete");
        Ok(stored)
    }

    async fn mark_email_as_read(&self, user_id: &str, email_id: &str) -> Result<(), AppError> {
        let updated = self
            .store
            .update_read_status(email_id, user_id, true)
            .await
            .map_err(|e| {
                tracing::error!(user_id, email_id, error = %e, "failed to update email");
                AppError::database_error()
            })?;

        if !updated {
            return Err(AppError::not_found("Email not found"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use warp::http::StatusCode;

    use crate::db::{DbError, Result as DbResult};

    #[derive(Default)]
    struct MemoryEmails {
        rows: Mutex<Vec<Email>>,
        last_page: Mutex<Option<(i64, i64)>>,
    }

    #[async_trait]
    impl EmailStore for MemoryEmails {
        async fn create(&self, email: &Email) -> DbResult<bool> {
            let mut rows = self.rows.lock().unwrap();
            if rows
                .iter()
                .any(|e| e.user_id == email.user_id && e.message_id == email.message_id)
            {
                return Ok(false);
            }
            rows.push(email.clone());
            Ok(true)
        }

        async fn get_by_id(&self, id: &str, user_id: &str) -> DbResult<Option<Email>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|e| e.id == id && e.user_id == user_id).cloned())
        }

        async fn get_by_user_id(&self, user_id: &str, limit: i64, offset: i64) -> DbResult<Vec<Email>> {
            *self.last_page.lock().unwrap() = Some((limit, offset));
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|e| e.user_id == user_id)
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn update_read_status(&self, id: &str, user_id: &str, is_read: bool) -> DbResult<bool> {
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|e| e.id == id && e.user_id == user_id) {
                Some(email) => {
                    email.is_read = is_read;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    struct BrokenEmails;

    #[async_trait]
    impl EmailStore for BrokenEmails {
        async fn create(&self, _email: &Email) -> DbResult<bool> {
            Err(DbError::Connection("down".to_string()))
        }

        async fn get_by_id(&self, _: &str, _: &str) -> DbResult<Option<Email>> {
            Err(DbError::Connection("down".to_string()))
        }

        async fn get_by_user_id(&self, _: &str, _: i64, _: i64) -> DbResult<Vec<Email>> {
            Err(DbError::Connection("down".to_string()))
        }

        async fn update_read_status(&self, _: &str, _: &str, _: bool) -> DbResult<bool> {
            Err(DbError::Connection("down".to_string()))
        }
    }

    fn stored(id: &str, user_id: &str) -> Email {
        Email {
            id: id.to_string(),
            message_id: format!("m-{}", id),
            thread_id: None,
            subject: None,
            from: "a@example.com".to_string(),
            to: vec![],
            body: None,
            html_body: None,
            is_read: false,
            labels: vec![],
            created_at: Utc::now(),
            user_id: user_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_limit_and_offset_clamped() {
        let store = Arc::new(MemoryEmails::default());
        let svc = EmailService::new(store.clone());

        for (limit, offset, expected) in [(0, 0, (20, 0)), (500, -3, (20, 0)), (100, 5, (100, 5)), (7, 2, (7, 2))] {
            svc.get_user_emails("u1", limit, offset).await.unwrap();
            assert_eq!(*store.last_page.lock().unwrap(), Some(expected));
        }
    }

    #[tokio::test]
    async fn test_store_failure_maps_to_database_error() {
        let svc = EmailService::new(Arc::new(BrokenEmails));

        let err = svc.get_user_emails("u1", 10, 0).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Database error occurred");
    }

    #[tokio::test]
    async fn test_mark_read_scoped_to_owner() {
        let store = Arc::new(MemoryEmails::default());
        store.rows.lock().unwrap().push(stored("e1", "u1"));
        let svc = EmailService::new(store.clone());

        let err = svc.mark_email_as_read("u2", "e1").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(!store.rows.lock().unwrap()[0].is_read);

        svc.mark_email_as_read("u1", "e1").await.unwrap();
        assert!(store.rows.lock().unwrap()[0].is_read);
    }

    #[tokio::test]
    async fn test_send_without_resend() {
        let svc = EmailService::new(Arc::new(MemoryEmails::default()));
        let err = svc
            .send_email("bot@example.com", vec!["a@example.com".to_string()], "Hi", "Body")
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_send_requires_recipient() {
        let svc = EmailService::new(Arc::new(MemoryEmails::default()))
            .with_resend(ResendClient::new("re_key").unwrap());
        let err = svc
            .send_email("bot@example.com", vec![" ".to_string()], "Hi", "Body")
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sync_without_linked_account() {
        let svc = EmailService::new(Arc::new(MemoryEmails::default()))
            .with_gmail(GmailClient::new().unwrap());

        let err = svc.sync_gmail_emails("u1").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Gmail account not linked");
    }

    #[test]
    fn test_to_email_keeps_gmail_fields() {
        let email = to_email(
            "u1",
            GmailMessage {
                id: "g1".to_string(),
                thread_id: Some("t1".to_string()),
                subject: Some("Hi".to_string()),
                from: "a@example.com".to_string(),
                to: vec!["b@example.com".to_string()],
                body: Some("text".to_string()),
                html_body: None,
                labels: vec!["INBOX".to_string()],
                is_read: true,
            },
        );

        assert_eq!(email.message_id, "g1");
        assert_eq!(email.user_id, "u1");
        assert!(email.is_read);
        assert!(Uuid::parse_str(&email.id).is_ok());
    }
}
