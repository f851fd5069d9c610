use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Characters of text used when a post or comment stands in for a title.
pub const EXCERPT_LEN: usize = 15;
/// Characters of text used as the detail page title.
pub const HEADLINE_LEN: usize = 30;

/// A post as the feeds see it, joined with its author and group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
    pub image: Option<String>,
}

impl Post {
    pub fn headline(&self) -> String {
        excerpt(&self.text, HEADLINE_LEN)
    }

    pub fn pub_date(&self) -> String {
        self.created_at.format("%d %b %Y %H:%M").to_string()
    }
}

impl std::fmt::Display for Post {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&excerpt(&self.text, EXCERPT_LEN))
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Author-editable fields as submitted through the post form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<i64>,
}

pub fn excerpt(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_counts_characters_not_bytes() {
        assert_eq!(excerpt("Тестовый пост для проверки", 15), "Тестовый пост д");
        assert_eq!(excerpt("short", 15), "short");
    }

    #[test]
    fn display_is_the_short_excerpt() {
        let post = Post {
            id: 1,
            text: "Тестовый пост для проверки".into(),
            created_at: Utc::now(),
            author_id: Uuid::new_v4(),
            author_username: "auth".into(),
            group_id: None,
            group_slug: None,
            group_title: None,
            image: None,
        };
        assert_eq!(post.to_string(), "Тестовый пост д");
        assert_eq!(post.headline(), "Тестовый пост для проверки");
    }
}
