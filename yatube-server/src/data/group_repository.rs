use crate::data::{db_error, is_unique_violation};
use crate::domain::error::{DomainError, FieldErrors};
use crate::domain::group::{Group, NewGroup};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn create(&self, group: NewGroup) -> Result<Group, DomainError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, DomainError>;
    async fn list(&self) -> Result<Vec<Group>, DomainError>;
    /// Removes the group; its posts stay and lose their group.
    async fn delete_by_slug(&self, slug: &str) -> Result<bool, DomainError>;
}

pub(crate) fn duplicate_slug(slug: &str) -> DomainError {
    DomainError::InvalidInput(FieldErrors::single(
        "slug",
        format!("group with slug {slug:?} already exists"),
    ))
}

#[derive(Clone)]
pub struct PostgresGroupRepository {
    pool: PgPool,
}

impl PostgresGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn create(&self, group: NewGroup) -> Result<Group, DomainError> {
        let created = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO post_groups (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "post_groups_slug") {
                duplicate_slug(&group.slug)
            } else {
                error!("failed to create group: {}", e);
                DomainError::Internal(format!("database error: {}", e))
            }
        })?;

        info!(group_id = created.id, slug = %created.slug, "group created");
        Ok(created)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError> {
        sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find group by slug"))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, DomainError> {
        sqlx::query_as::<_, Group>("SELECT id, title, slug, description FROM post_groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find group by id"))
    }

    async fn list(&self) -> Result<Vec<Group>, DomainError> {
        sqlx::query_as::<_, Group>("SELECT id, title, slug, description FROM post_groups ORDER BY title")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list groups"))
    }

    async fn delete_by_slug(&self, slug: &str) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM post_groups WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete group"))?;

        if deleted.rows_affected() > 0 {
            info!(slug, "group deleted");
        }
        Ok(deleted.rows_affected() > 0)
    }
}
