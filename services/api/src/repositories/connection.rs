//! PostgreSQL connection store

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::connection::{ConnectionRequest, NewConnectionRequest, RequestStatus};
use crate::repositories::{ConnectionStore, StoreError, StoreResult};

/// Connection store backed by the `connection_requests` table.
///
/// Creation races resolve on the partial unique index over the unordered
/// pair; resolution races on a conditional UPDATE. Both surface as
/// [`StoreError::Conflict`].
#[derive(Clone)]
pub struct PgConnectionStore {
    pool: PgPool,
}

impl PgConnectionStore {
    /// Create a new connection store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn request_from_row(row: &PgRow) -> ConnectionRequest {
    ConnectionRequest {
        id: row.get("id"),
        from_user_id: row.get("from_user_id"),
        to_user_id: row.get("to_user_id"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl ConnectionStore for PgConnectionStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<ConnectionRequest>> {
        let row = sqlx::query(
            r#"
            SELECT id, from_user_id, to_user_id, status, created_at, updated_at
            FROM connection_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Unavailable)?;

        Ok(row.as_ref().map(request_from_row))
    }

    async fn find_active_by_pair(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> StoreResult<Option<ConnectionRequest>> {
        let row = sqlx::query(
            r#"
            SELECT id, from_user_id, to_user_id, status, created_at, updated_at
            FROM connection_requests
            WHERE LEAST(from_user_id, to_user_id) = LEAST($1, $2)
              AND GREATEST(from_user_id, to_user_id) = GREATEST($1, $2)
              AND status IN ('pending', 'accepted')
            LIMIT 1
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Unavailable)?;

        Ok(row.as_ref().map(request_from_row))
    }

    async fn insert_if_absent(&self, new: NewConnectionRequest) -> StoreResult<ConnectionRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO connection_requests (from_user_id, to_user_id, status)
            VALUES ($1, $2, 'pending')
            RETURNING id, from_user_id, to_user_id, status, created_at, updated_at
            "#,
        )
        .bind(new.from_user_id)
        .bind(new.to_user_id)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(request_from_row(&row)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Conflict)
            }
            Err(err) => Err(StoreError::Unavailable(err)),
        }
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: RequestStatus,
        new_status: RequestStatus,
    ) -> StoreResult<ConnectionRequest> {
        let row = sqlx::query(
            r#"
            UPDATE connection_requests
            SET status = $3, updated_at = now()
            WHERE id = $1 AND status = $2
            RETURNING id, from_user_id, to_user_id, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(new_status)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Unavailable)?;

        match row {
            Some(row) => Ok(request_from_row(&row)),
            // The request moved out of `expected` under us (or was removed).
            None => Err(StoreError::Conflict),
        }
    }

    async fn list_exclusions(
        &self,
        user_id: Uuid,
        ignored_blocks_sender: bool,
    ) -> StoreResult<Vec<Uuid>> {
        let rows = sqlx::query(
            r#"
            SELECT CASE
                       WHEN from_user_id = $1 THEN to_user_id
                       ELSE from_user_id
                   END AS counterpart
            FROM connection_requests
            WHERE (from_user_id = $1 OR to_user_id = $1)
              AND (status IN ('pending', 'accepted')
                   OR (status = 'ignored' AND (to_user_id = $1 OR $2)))
            "#,
        )
        .bind(user_id)
        .bind(ignored_blocks_sender)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Unavailable)?;

        Ok(rows.iter().map(|row| row.get("counterpart")).collect())
    }

    async fn list_pending_for_recipient(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<ConnectionRequest>> {
        let rows = sqlx::query(
            r#"
            SELECT id, from_user_id, to_user_id, status, created_at, updated_at
            FROM connection_requests
            WHERE to_user_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Unavailable)?;

        Ok(rows.iter().map(request_from_row).collect())
    }

    async fn list_accepted_for(&self, user_id: Uuid) -> StoreResult<Vec<ConnectionRequest>> {
        let rows = sqlx::query(
            r#"
            SELECT id, from_user_id, to_user_id, status, created_at, updated_at
            FROM connection_requests
            WHERE (from_user_id = $1 OR to_user_id = $1) AND status = 'accepted'
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Unavailable)?;

        Ok(rows.iter().map(request_from_row).collect())
    }
}

// These exercise the real index and CAS paths and therefore need a live
// database; the engine-level race semantics are covered by the in-memory
// tests.
#[cfg(test)]
mod pg_tests {
    use super::*;
    use common::database::{DatabaseConfig, init_pool, run_migrations};
    use serial_test::serial;

    async fn store_with_two_users() -> (PgConnectionStore, Uuid, Uuid) {
        let config = DatabaseConfig::from_env().expect("database config");
        let pool = init_pool(&config).await.expect("database pool");
        run_migrations(&pool, &sqlx::migrate!("./migrations"))
            .await
            .expect("migrations");

        let mut ids = Vec::new();
        for name in ["pg-test-a", "pg-test-b"] {
            let row = sqlx::query(
                "INSERT INTO users (display_name) VALUES ($1) RETURNING id",
            )
            .bind(name)
            .fetch_one(&pool)
            .await
            .expect("insert user");
            ids.push(row.get::<Uuid, _>("id"));
        }

        (PgConnectionStore::new(pool), ids[0], ids[1])
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn reciprocal_insert_conflicts_at_the_index() {
        let (store, a, b) = store_with_two_users().await;

        store
            .insert_if_absent(NewConnectionRequest {
                from_user_id: a,
                to_user_id: b,
            })
            .await
            .expect("first insert");

        let err = store
            .insert_if_absent(NewConnectionRequest {
                from_user_id: b,
                to_user_id: a,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn status_cas_rejects_stale_expectations() {
        let (store, a, b) = store_with_two_users().await;

        let request = store
            .insert_if_absent(NewConnectionRequest {
                from_user_id: a,
                to_user_id: b,
            })
            .await
            .expect("insert");

        let accepted = store
            .update_status(request.id, RequestStatus::Pending, RequestStatus::Accepted)
            .await
            .expect("first resolve");
        assert_eq!(accepted.status, RequestStatus::Accepted);

        let err = store
            .update_status(request.id, RequestStatus::Pending, RequestStatus::Rejected)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }
}
