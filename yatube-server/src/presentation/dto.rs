use serde::{Deserialize, Serialize};

use chrono::{DateTime, Utc};

use crate::application::post_service::INVALID_CHOICE;
use crate::domain::error::FieldErrors;
use crate::domain::page::PageRequest;
use crate::domain::post::{Post, PostDraft};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref())
    }
}

// ======================= POSTS =======================

/// Raw post form. `group` is the selected group id, empty for "no group".
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: String,
}

impl PostForm {
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }

    pub fn selected_group(&self) -> Option<i64> {
        self.group.trim().parse().ok()
    }

    pub fn to_draft(&self) -> Result<PostDraft, FieldErrors> {
        let group = self.group.trim();
        let group_id = if group.is_empty() {
            None
        } else {
            Some(
                group
                    .parse()
                    .map_err(|_| FieldErrors::single("group", INVALID_CHOICE))?,
            )
        };
        Ok(PostDraft {
            text: self.text.clone(),
            group_id,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

// ======================= AUTH =======================

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl SignupForm {
    pub fn confirmation_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.password2.is_empty() {
            errors.add("password2", "This field is required.");
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }
        errors
    }
}

// ======================= Utils =======================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}
