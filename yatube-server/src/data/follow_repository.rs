use crate::data::db_error;
use crate::domain::error::DomainError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Storage for follow edges, unique per (user, author) pair.
///
/// Self-follow is not rejected here; callers check it before writing.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Returns `false` when the edge already existed.
    async fn insert(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError>;
    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError>;
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError>;
    async fn followers_of(&self, author_id: Uuid) -> Result<Vec<Uuid>, DomainError>;
    async fn following_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, DomainError>;
    async fn count_followers(&self, author_id: Uuid) -> Result<usize, DomainError>;
    async fn count_following(&self, user_id: Uuid) -> Result<usize, DomainError>;
}

#[derive(Clone)]
pub struct PostgresFollowRepository {
    pool: PgPool,
}

impl PostgresFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowRepository for PostgresFollowRepository {
    async fn insert(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO follows (user_id, author_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT follow_unique DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_error("insert follow"))?;

        let created = inserted.rows_affected() == 1;
        if created {
            info!(user_id = %user_id, author_id = %author_id, "follow created");
        }
        Ok(created)
    }

    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete follow"))?;

        let removed = deleted.rows_affected() > 0;
        if removed {
            info!(user_id = %user_id, author_id = %author_id, "follow deleted");
        }
        Ok(removed)
    }

    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("check follow"))
    }

    async fn followers_of(&self, author_id: Uuid) -> Result<Vec<Uuid>, DomainError> {
        sqlx::query_scalar("SELECT user_id FROM follows WHERE author_id = $1 ORDER BY created_at")
            .bind(author_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list followers"))
    }

    async fn following_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, DomainError> {
        sqlx::query_scalar("SELECT author_id FROM follows WHERE user_id = $1 ORDER BY created_at")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list followed authors"))
    }

    async fn count_followers(&self, author_id: Uuid) -> Result<usize, DomainError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("count followers"))?;
        Ok(usize::try_from(total).unwrap_or_default())
    }

    async fn count_following(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("count followed authors"))?;
        Ok(usize::try_from(total).unwrap_or_default())
    }
}
