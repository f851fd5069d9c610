use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
    pub post_id: i64,
}

impl Comment {
    pub fn pub_date(&self) -> String {
        self.created_at.format("%d %b %Y %H:%M").to_string()
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub author_id: Uuid,
    pub post_id: i64,
    pub text: String,
}
