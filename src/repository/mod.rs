//! Persistence traits over the application tables and their PostgreSQL implementations

pub mod conversation;
pub mod email;
pub mod user;

use async_trait::async_trait;

use crate::db::Result;
use crate::models::{AiConversation, Email, User};

pub use conversation::PgConversationStore;
pub use email::PgEmailStore;
pub use user::PgUserStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: &User) -> Result<User>;

    async fn get_by_id(&self, id: &str) -> Result<Option<User>>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Overwrite profile fields and bump `updated_at`; `None` when no row matches
    async fn update(&self, user: &User) -> Result<Option<User>>;

    async fn delete(&self, id: &str) -> Result<bool>;
}

#[async_trait]
pub trait EmailStore: Send + Sync {
    /// Insert an email; returns `false` when the `(user_id, message_id)` pair already exists
    async fn create(&self, email: &Email) -> Result<bool>;

    /// `None` unless the email exists and belongs to `user_id`
    async fn get_by_id(&self, id: &str, user_id: &str) -> Result<Option<Email>>;

    /// Newest first
    async fn get_by_user_id(&self, user_id: &str, limit: i64, offset: i64) -> Result<Vec<Email>>;

    /// Returns `true` when a row owned by `user_id` was updated
    async fn update_read_status(&self, id: &str, user_id: &str, is_read: bool) -> Result<bool>;
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create(&self, conversation: &AiConversation) -> Result<()>;

    async fn get_by_id(&self, id: &str) -> Result<Option<AiConversation>>;

    async fn get_by_provider(&self, provider: &str, limit: i64) -> Result<Vec<AiConversation>>;

    async fn get_by_user_id(&self, user_id: &str, limit: i64) -> Result<Vec<AiConversation>>;

    async fn delete(&self, id: &str) -> Result<bool>;
}
