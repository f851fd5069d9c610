use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::{PostFilter, PostRepository};
use crate::domain::comment::{Comment, NewComment};
use crate::domain::error::{DomainError, FieldErrors};
use crate::domain::group::Group;
use crate::domain::post::{NewPost, Post, PostDraft};

const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            posts,
            groups,
            comments,
        }
    }

    pub async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    pub async fn count_by_author(&self, author: Uuid) -> Result<usize, DomainError> {
        self.posts.count(PostFilter::Author(author)).await
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>, DomainError> {
        self.groups.list().await
    }

    /// Loads a post for editing, failing with `Forbidden` for anyone but its author.
    pub async fn get_for_edit(&self, editor: Uuid, post_id: i64) -> Result<Post, DomainError> {
        let post = self.get_post(post_id).await?;
        if post.author_id != editor {
            return Err(DomainError::Forbidden);
        }
        Ok(post)
    }

    #[instrument(skip(self, draft), fields(group_id = ?draft.group_id))]
    pub async fn create_post(&self, author: Uuid, draft: PostDraft) -> Result<Post, DomainError> {
        let draft = self.validate(draft).await?;
        let post = self
            .posts
            .create(NewPost {
                author_id: author,
                text: draft.text,
                group_id: draft.group_id,
                image: None,
            })
            .await?;
        Ok(post)
    }

    #[instrument(skip(self, draft))]
    pub async fn update_post(
        &self,
        editor: Uuid,
        post_id: i64,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        let existing = self.get_post(post_id).await?;
        if existing.author_id != editor {
            warn!(post_id, "edit attempt by non-author");
            return Err(DomainError::Forbidden);
        }

        let draft = self.validate(draft).await?;
        self.posts
            .update(post_id, draft)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))
    }

    pub async fn comments_for(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        self.comments.list_for_post(post_id).await
    }

    #[instrument(skip(self, text))]
    pub async fn add_comment(
        &self,
        author: Uuid,
        post_id: i64,
        text: &str,
    ) -> Result<Comment, DomainError> {
        let post = self.get_post(post_id).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::InvalidInput(FieldErrors::single("text", REQUIRED)));
        }

        let comment = self
            .comments
            .create(NewComment {
                author_id: author,
                post_id: post.id,
                text: text.to_string(),
            })
            .await?;
        info!(comment_id = comment.id, post_id, "comment added");
        Ok(comment)
    }

    /// Trims the text and checks that the chosen group exists.
    async fn validate(&self, draft: PostDraft) -> Result<PostDraft, DomainError> {
        let mut errors = FieldErrors::new();
        let text = draft.text.trim().to_string();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }
        if let Some(group_id) = draft.group_id {
            if self.groups.find_by_id(group_id).await?.is_none() {
                errors.add("group", INVALID_CHOICE);
            }
        }
        errors.into_result()?;

        Ok(PostDraft {
            text,
            group_id: draft.group_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;
    use crate::data::user_repository::UserRepository;
    use crate::domain::group::NewGroup;
    use crate::domain::user::User;

    struct Fixture {
        service: PostService,
        author: User,
        other: User,
        group: Group,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let author = UserRepository::create(
            store.as_ref(),
            User::new("auth".into(), "a@example.com".into(), "x".into()),
        )
        .await
        .unwrap();
        let other = UserRepository::create(
            store.as_ref(),
            User::new("other".into(), "o@example.com".into(), "x".into()),
        )
        .await
        .unwrap();
        let group = GroupRepository::create(
            store.as_ref(),
            NewGroup {
                title: "Test group".into(),
                slug: "test_slug".into(),
                description: "Test description".into(),
            },
        )
        .await
        .unwrap();
        Fixture {
            service: PostService::new(store.clone(), store.clone(), store),
            author,
            other,
            group,
        }
    }

    fn draft(text: &str, group_id: Option<i64>) -> PostDraft {
        PostDraft {
            text: text.into(),
            group_id,
        }
    }

    #[tokio::test]
    async fn creates_post_with_trimmed_text_and_group() {
        let f = fixture().await;
        let post = f
            .service
            .create_post(f.author.id, draft("  Test post  ", Some(f.group.id)))
            .await
            .unwrap();

        assert_eq!(post.text, "Test post");
        assert_eq!(post.author_username, "auth");
        assert_eq!(post.group_slug.as_deref(), Some("test_slug"));
        assert_eq!(f.service.count_by_author(f.author.id).await.unwrap(), 1);
        assert_eq!(f.service.count_by_author(f.other.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejects_blank_text_and_unknown_group() {
        let f = fixture().await;
        let Err(DomainError::InvalidInput(errors)) = f
            .service
            .create_post(f.author.id, draft("   ", Some(999)))
            .await
        else {
            panic!("expected validation errors");
        };
        assert!(errors.has("text"));
        assert!(errors.has("group"));
    }

    #[tokio::test]
    async fn only_author_can_edit() {
        let f = fixture().await;
        let post = f
            .service
            .create_post(f.author.id, draft("original", None))
            .await
            .unwrap();

        let denied = f
            .service
            .update_post(f.other.id, post.id, draft("hijacked", None))
            .await;
        assert!(matches!(denied, Err(DomainError::Forbidden)));
        assert_eq!(f.service.get_post(post.id).await.unwrap().text, "original");

        let edited = f
            .service
            .update_post(f.author.id, post.id, draft("edited", Some(f.group.id)))
            .await
            .unwrap();
        assert_eq!(edited.text, "edited");
        assert_eq!(edited.group_id, Some(f.group.id));
    }

    #[tokio::test]
    async fn comments_are_listed_newest_first() {
        let f = fixture().await;
        let post = f
            .service
            .create_post(f.author.id, draft("post", None))
            .await
            .unwrap();

        f.service.add_comment(f.other.id, post.id, "first").await.unwrap();
        f.service.add_comment(f.author.id, post.id, "second").await.unwrap();
        let texts: Vec<String> = f
            .service
            .comments_for(post.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["second", "first"]);

        assert!(matches!(
            f.service.add_comment(f.other.id, post.id, " ").await,
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            f.service.add_comment(f.other.id, 404, "lost").await,
            Err(DomainError::PostNotFound(404))
        ));
    }
}
