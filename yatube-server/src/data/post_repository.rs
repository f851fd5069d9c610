use crate::data::db_error;
use crate::domain::error::DomainError;
use crate::domain::post::{NewPost, Post, PostDraft};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::info;
use uuid::Uuid;

/// Which posts a listing is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(Uuid),
    /// Posts by every author the given user follows.
    FollowedBy(Uuid),
}

/// Listings are always newest first, ties broken by id.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError>;
    async fn update(&self, id: i64, update: PostDraft) -> Result<Option<Post>, DomainError>;
    async fn count(&self, filter: PostFilter) -> Result<usize, DomainError>;
    async fn list(
        &self,
        filter: PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Post>, DomainError>;
}

const POST_COLUMNS: &str = r#"
    p.id, p.text, p.created_at, p.author_id, u.username AS author_username,
    p.group_id, g.slug AS group_slug, g.title AS group_title, p.image
"#;

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_joins(qb: &mut QueryBuilder<'_, Postgres>) {
    qb.push(" JOIN users u ON u.id = p.author_id LEFT JOIN post_groups g ON g.id = p.group_id");
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: PostFilter) {
    match filter {
        PostFilter::All => {}
        PostFilter::Group(group_id) => {
            qb.push(" WHERE p.group_id = ").push_bind(group_id);
        }
        PostFilter::Author(author_id) => {
            qb.push(" WHERE p.author_id = ").push_bind(author_id);
        }
        PostFilter::FollowedBy(user_id) => {
            qb.push(" WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let created = sqlx::query_as::<_, Post>(&format!(
            r#"
            WITH p AS (
                INSERT INTO posts (text, author_id, group_id, image)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT {POST_COLUMNS}
            FROM p
            JOIN users u ON u.id = p.author_id
            LEFT JOIN post_groups g ON g.id = p.group_id
            "#
        ))
        .bind(&post.text)
        .bind(post.author_id)
        .bind(post.group_id)
        .bind(&post.image)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create post"))?;

        info!(post_id = created.id, author_id = %created.author_id, "post created");
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM posts p"));
        push_joins(&mut qb);
        qb.push(" WHERE p.id = ").push_bind(id);

        qb.build_query_as::<Post>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find post by id"))
    }

    async fn update(&self, id: i64, update: PostDraft) -> Result<Option<Post>, DomainError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            WITH p AS (
                UPDATE posts
                SET text = $1, group_id = $2
                WHERE id = $3
                RETURNING *
            )
            SELECT {POST_COLUMNS}
            FROM p
            JOIN users u ON u.id = p.author_id
            LEFT JOIN post_groups g ON g.id = p.group_id
            "#
        ))
        .bind(&update.text)
        .bind(update.group_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update post"))?;

        if post.is_some() {
            info!(post_id = id, "post updated");
        }

        Ok(post)
    }

    async fn count(&self, filter: PostFilter) -> Result<usize, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_filter(&mut qb, filter);

        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("count posts"))?;
        let total: i64 = row.try_get(0).map_err(db_error("count posts"))?;
        Ok(usize::try_from(total).unwrap_or_default())
    }

    async fn list(
        &self,
        filter: PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Post>, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM posts p"));
        push_joins(&mut qb);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);

        qb.build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list posts"))
    }
}
