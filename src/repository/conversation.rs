use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::db::Result;
use crate::models::AiConversation;

use super::ConversationStore;

const CONVERSATION_COLUMNS: &str = "id, email_id, user_id, prompt, response, provider, created_at";

/// `ai_conversations` table access
#[derive(Clone)]
pub struct PgConversationStore {
    pool: Pool,
}

impl PgConversationStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn parse_conversation_row(row: &Row) -> Result<AiConversation> {
    Ok(AiConversation {
        id: row.try_get("id")?,
        email_id: row.try_get("email_id")?,
        user_id: row.try_get("user_id")?,
        prompt: row.try_get("prompt")?,
        response: row.try_get("response")?,
        provider: row.try_get("provider")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn create(&self, conversation: &AiConversation) -> Result<()> {
        let conn = self.pool.get().await?;
        let sql = format!(
            "INSERT INTO ai_conversations ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            CONVERSATION_COLUMNS
        );

        conn.execute(
            &sql,
            &[
                &conversation.id,
                &conversation.email_id,
                &conversation.user_id,
                &conversation.prompt,
                &conversation.response,
                &conversation.provider,
                &conversation.created_at,
            ],
        )
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<AiConversation>> {
        let conn = self.pool.get().await?;
        let sql = format!(
            "SELECT {} FROM ai_conversations WHERE id = $1",
            CONVERSATION_COLUMNS
        );

        conn.query_opt(&sql, &[&id])
            .await?
            .as_ref()
            .map(parse_conversation_row)
            .transpose()
    }

    async fn get_by_provider(&self, provider: &str, limit: i64) -> Result<Vec<AiConversation>> {
        let conn = self.pool.get().await?;
        let sql = format!(
            "SELECT {} FROM ai_conversations WHERE provider = $1 ORDER BY created_at DESC LIMIT $2",
            CONVERSATION_COLUMNS
        );

        let rows = conn.query(&sql, &[&provider, &limit]).await?;
        rows.iter().map(parse_conversation_row).collect()
    }

    async fn get_by_user_id(&self, user_id: &str, limit: i64) -> Result<Vec<AiConversation>> {
        let conn = self.pool.get().await?;
        let sql = format!(
            "SELECT {} FROM ai_conversations WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            CONVERSATION_COLUMNS
        );

        let rows = conn.query(&sql, &[&user_id, &limit]).await?;
        rows.iter().map(parse_conversation_row).collect()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.pool.get().await?;
        let deleted = conn
            .execute("DELETE FROM ai_conversations WHERE id = $1", &[&id])
            .await?;
        Ok(deleted > 0)
    }
}
