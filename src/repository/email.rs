use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::db::Result;
use crate::models::Email;

use super::EmailStore;

const EMAIL_COLUMNS: &str = r#"id, message_id, thread_id, subject, "from", "to", body, html_body, is_read, labels, created_at, user_id"#;

/// `emails` table access
#[derive(Clone)]
pub struct PgEmailStore {
    pool: Pool,
}

impl PgEmailStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn parse_email_row(row: &Row) -> Result<Email> {
    Ok(Email {
        id: row.try_get("id")?,
        message_id: row.try_get("message_id")?,
        thread_id: row.try_get("thread_id")?,
        subject: row.try_get("subject")?,
        from: row.try_get("from")?,
        to: row.try_get("to")?,
        body: row.try_get("body")?,
        html_body: row.try_get("html_body")?,
        is_read: row.try_get("is_read")?,
        labels: row.try_get("labels")?,
        created_at: row.try_get("created_at")?,
        user_id: row.try_get("user_id")?,
    })
}

#[async_trait]
impl EmailStore for PgEmailStore {
    async fn create(&self, email: &Email) -> Result<bool> {
        let conn = self.pool.get().await?;
        let sql = format!(
            "INSERT INTO emails ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (user_id, message_id) DO NOTHING",
            EMAIL_COLUMNS
        );

        let inserted = conn
            .execute(
                &sql,
                &[
                    &email.id,
                    &email.message_id,
                    &email.thread_id,
                    &email.subject,
                    &email.from,
                    &email.to,
                    &email.body,
                    &email.html_body,
                    &email.is_read,
                    &email.labels,
                    &email.created_at,
                    &email.user_id,
                ],
            )
            .await?;

        Ok(inserted > 0)
    }

    async fn get_by_id(&self, id: &str, user_id: &str) -> Result<Option<Email>> {
        let conn = self.pool.get().await?;
        let sql = format!(
            "SELECT {} FROM emails WHERE id = $1 AND user_id = $2",
            EMAIL_COLUMNS
        );

        conn.query_opt(&sql, &[&id, &user_id])
            .await?
            .as_ref()
            .map(parse_email_row)
            .transpose()
    }

    async fn get_by_user_id(&self, user_id: &str, limit: i64, offset: i64) -> Result<Vec<Email>> {
        let conn = self.pool.get().await?;
        let sql = format!(
            "SELECT {} FROM emails WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            EMAIL_COLUMNS
        );

        let rows = conn.query(&sql, &[&user_id, &limit, &offset]).await?;
        rows.iter().map(parse_email_row).collect()
    }

    async fn update_read_status(&self, id: &str, user_id: &str, is_read: bool) -> Result<bool> {
        let conn = self.pool.get().await?;
        let updated = conn
            .execute(
                "UPDATE emails SET is_read = $3 WHERE id = $1 AND user_id = $2",
                &[&id, &user_id, &is_read],
            )
            .await?;
        Ok(updated > 0)
    }
}
