pub mod comment_repository;
pub mod follow_repository;
pub mod group_repository;
pub mod memory;
pub mod post_repository;
pub mod user_repository;

use tracing::error;

use crate::domain::error::DomainError;

/// Maps a store failure to `Internal`, logging the operation that failed.
pub(crate) fn db_error(operation: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| {
        error!(operation, "database error: {}", e);
        DomainError::Internal(format!("database error: {}", e))
    }
}

pub(crate) fn is_unique_violation(e: &sqlx::Error, constraint: &str) -> bool {
    e.as_database_error()
        .and_then(|db| db.constraint())
        .map(|c| c.contains(constraint))
        == Some(true)
}
