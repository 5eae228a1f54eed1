//! PostgreSQL user directory

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::user::User;
use crate::pagination::Cursor;
use crate::repositories::{StoreError, StoreResult, UserDirectory};

/// User directory backed by the `users` table. Read-only from this service.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Create a new user directory
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> User {
    let Json(interests): Json<Vec<String>> = row.get("interests");
    User {
        id: row.get("id"),
        display_name: row.get("display_name"),
        interests,
        bio: row.get("bio"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, display_name, interests, bio, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Unavailable)?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, display_name, interests, bio, created_at, updated_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Unavailable)?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn list_candidates(
        &self,
        excluding: &[Uuid],
        after: Option<&Cursor>,
        limit: u32,
    ) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, display_name, interests, bio, created_at, updated_at
            FROM users
            WHERE id <> ALL($1)
              AND ($2::timestamptz IS NULL OR (created_at, id) > ($2::timestamptz, $3::uuid))
            ORDER BY created_at, id
            LIMIT $4
            "#,
        )
        .bind(excluding)
        .bind(after.map(|c| c.created_at))
        .bind(after.map(|c| c.id))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Unavailable)?;

        Ok(rows.iter().map(user_from_row).collect())
    }
}
