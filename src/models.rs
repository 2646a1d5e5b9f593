// Data structures (users, emails, conversations) and HTTP request/response bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Stored records

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub email_verified: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub id: String,
    pub message_id: String,
    pub thread_id: Option<String>,
    pub subject: Option<String>,
    pub from: String,
    pub to: Vec<String>,
    pub body: Option<String>,
    pub html_body: Option<String>,
    pub is_read: bool,
    pub labels: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiConversation {
    pub id: String,
    pub email_id: Option<String>,
    pub user_id: String,
    pub prompt: String,
    pub response: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}

// Identity carried by a bearer token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
        }
    }
}

// AI

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AiRequest {
    pub prompt: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub email_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiResponse {
    pub response: String,
    pub provider: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConversationQuery {
    pub limit: Option<i64>,
}

// Email

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailRequest {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SendEmailResponse {
    pub message: String,
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EmailListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncResponse {
    pub message: String,
    pub synced: usize,
}

// Auth

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUrlResponse {
    pub authorization_url: String,
    pub state: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: AuthUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

// System

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub gemini: String,
    pub claude: String,
    pub redis: String,
    pub database: String,
}
