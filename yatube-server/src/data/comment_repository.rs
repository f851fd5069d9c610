use crate::data::db_error;
use crate::domain::comment::{Comment, NewComment};
use crate::domain::error::DomainError;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: NewComment) -> Result<Comment, DomainError>;
    /// Newest first.
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, comment: NewComment) -> Result<Comment, DomainError> {
        let created = sqlx::query_as::<_, Comment>(
            r#"
            WITH c AS (
                INSERT INTO comments (text, author_id, post_id)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT c.id, c.text, c.created_at, c.author_id, u.username AS author_username, c.post_id
            FROM c
            JOIN users u ON u.id = c.author_id
            "#,
        )
        .bind(&comment.text)
        .bind(comment.author_id)
        .bind(comment.post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create comment"))?;

        info!(comment_id = created.id, post_id = created.post_id, "comment created");
        Ok(created)
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.text, c.created_at, c.author_id, u.username AS author_username, c.post_id
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list comments"))
    }
}
