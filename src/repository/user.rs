use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::db::Result;
use crate::models::User;

use super::UserStore;

const USER_COLUMNS: &str = "id, email, name, image, email_verified, created_at, updated_at";

/// `users` table access
#[derive(Clone)]
pub struct PgUserStore {
    pool: Pool,
}

impl PgUserStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn parse_user_row(row: &Row) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        image: row.try_get("image")?,
        email_verified: row.try_get("email_verified")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: &User) -> Result<User> {
        let conn = self.pool.get().await?;
        let sql = format!(
            "INSERT INTO users (id, email, name, image, email_verified, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            USER_COLUMNS
        );

        let row = conn
            .query_one(
                &sql,
                &[
                    &user.id,
                    &user.email,
                    &user.name,
                    &user.image,
                    &user.email_verified,
                    &user.created_at,
                    &user.updated_at,
                ],
            )
            .await?;

        parse_user_row(&row)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        let conn = self.pool.get().await?;
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        conn.query_opt(&sql, &[&id])
            .await?
            .as_ref()
            .map(parse_user_row)
            .transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.pool.get().await?;
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        conn.query_opt(&sql, &[&email])
            .await?
            .as_ref()
            .map(parse_user_row)
            .transpose()
    }

    async fn update(&self, user: &User) -> Result<Option<User>> {
        let conn = self.pool.get().await?;
        let sql = format!(
            "UPDATE users SET email = $2, name = $3, image = $4, email_verified = $5, \
             updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );

        conn.query_opt(
            &sql,
            &[&user.id, &user.email, &user.name, &user.image, &user.email_verified],
        )
        .await?
        .as_ref()
        .map(parse_user_row)
        .transpose()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.pool.get().await?;
        let deleted = conn.execute("DELETE FROM users WHERE id = $1", &[&id]).await?;
        Ok(deleted > 0)
    }
}
