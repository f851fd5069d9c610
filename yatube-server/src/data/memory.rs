//! Process-local store implementing every repository trait.
//!
//! Used when no `DATABASE_URL` is configured and by the test suites. It keeps
//! the same guarantees as the PostgreSQL schema: unique usernames and group
//! slugs, unique follow edges, posts detaching from deleted groups.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::follow_repository::FollowRepository;
use crate::data::group_repository::{GroupRepository, duplicate_slug};
use crate::data::post_repository::{PostFilter, PostRepository};
use crate::data::user_repository::UserRepository;
use crate::domain::comment::{Comment, NewComment};
use crate::domain::error::DomainError;
use crate::domain::follow::Follow;
use crate::domain::group::{Group, NewGroup};
use crate::domain::post::{NewPost, Post, PostDraft};
use crate::domain::user::User;

#[derive(Debug, Clone)]
struct PostRow {
    id: i64,
    text: String,
    created_at: DateTime<Utc>,
    author_id: Uuid,
    group_id: Option<i64>,
    image: Option<String>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: i64,
    text: String,
    created_at: DateTime<Utc>,
    author_id: Uuid,
    post_id: i64,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, PostRow>,
    comments: BTreeMap<i64, CommentRow>,
    follows: HashMap<(Uuid, Uuid), Follow>,
    last_group_id: i64,
    last_post_id: i64,
    last_comment_id: i64,
}

impl State {
    fn username(&self, id: Uuid) -> String {
        self.users
            .get(&id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn post(&self, row: &PostRow) -> Post {
        let group = row.group_id.and_then(|id| self.groups.get(&id));
        Post {
            id: row.id,
            text: row.text.clone(),
            created_at: row.created_at,
            author_id: row.author_id,
            author_username: self.username(row.author_id),
            group_id: group.map(|g| g.id),
            group_slug: group.map(|g| g.slug.clone()),
            group_title: group.map(|g| g.title.clone()),
            image: row.image.clone(),
        }
    }

    fn comment(&self, row: &CommentRow) -> Comment {
        Comment {
            id: row.id,
            text: row.text.clone(),
            created_at: row.created_at,
            author_id: row.author_id,
            author_username: self.username(row.author_id),
            post_id: row.post_id,
        }
    }

    fn matches(&self, row: &PostRow, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => row.group_id == Some(group_id),
            PostFilter::Author(author_id) => row.author_id == author_id,
            PostFilter::FollowedBy(user_id) => {
                self.follows.contains_key(&(user_id, row.author_id))
            }
        }
    }

    fn check_user(&self, id: Uuid) -> Result<(), DomainError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(DomainError::Internal(format!("unknown user {id}")))
        }
    }

    fn check_group(&self, id: Option<i64>) -> Result<(), DomainError> {
        match id {
            Some(id) if !self.groups.contains_key(&id) => {
                Err(DomainError::Internal(format!("unknown group {id}")))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(DomainError::UserAlreadyExists(user.username));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn create(&self, group: NewGroup) -> Result<Group, DomainError> {
        let mut state = self.state.write().await;
        if state.groups.values().any(|g| g.slug == group.slug) {
            return Err(duplicate_slug(&group.slug));
        }
        state.last_group_id += 1;
        let created = Group {
            id: state.last_group_id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        state.groups.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError> {
        let state = self.state.read().await;
        Ok(state.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, DomainError> {
        Ok(self.state.read().await.groups.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Group>, DomainError> {
        let mut groups: Vec<Group> = self.state.read().await.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }

    async fn delete_by_slug(&self, slug: &str) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        let Some(id) = state.groups.values().find(|g| g.slug == slug).map(|g| g.id) else {
            return Ok(false);
        };
        state.groups.remove(&id);
        for post in state.posts.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let mut state = self.state.write().await;
        state.check_user(post.author_id)?;
        state.check_group(post.group_id)?;
        state.last_post_id += 1;
        let row = PostRow {
            id: state.last_post_id,
            text: post.text,
            created_at: Utc::now(),
            author_id: post.author_id,
            group_id: post.group_id,
            image: post.image,
        };
        let created = state.post(&row);
        state.posts.insert(row.id, row);
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let state = self.state.read().await;
        Ok(state.posts.get(&id).map(|row| state.post(row)))
    }

    async fn update(&self, id: i64, update: PostDraft) -> Result<Option<Post>, DomainError> {
        let mut state = self.state.write().await;
        state.check_group(update.group_id)?;
        let Some(row) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        row.text = update.text;
        row.group_id = update.group_id;
        let row = row.clone();
        Ok(Some(state.post(&row)))
    }

    async fn count(&self, filter: PostFilter) -> Result<usize, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .posts
            .values()
            .filter(|row| state.matches(row, filter))
            .count())
    }

    async fn list(
        &self,
        filter: PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Post>, DomainError> {
        let state = self.state.read().await;
        let mut rows: Vec<&PostRow> = state
            .posts
            .values()
            .filter(|row| state.matches(row, filter))
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| state.post(row))
            .collect())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, comment: NewComment) -> Result<Comment, DomainError> {
        let mut state = self.state.write().await;
        state.check_user(comment.author_id)?;
        if !state.posts.contains_key(&comment.post_id) {
            return Err(DomainError::PostNotFound(comment.post_id));
        }
        state.last_comment_id += 1;
        let row = CommentRow {
            id: state.last_comment_id,
            text: comment.text,
            created_at: Utc::now(),
            author_id: comment.author_id,
            post_id: comment.post_id,
        };
        let created = state.comment(&row);
        state.comments.insert(row.id, row);
        Ok(created)
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        let state = self.state.read().await;
        let mut rows: Vec<&CommentRow> = state
            .comments
            .values()
            .filter(|row| row.post_id == post_id)
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows.into_iter().map(|row| state.comment(row)).collect())
    }
}

#[async_trait]
impl FollowRepository for InMemoryStore {
    async fn insert(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        state.check_user(user_id)?;
        state.check_user(author_id)?;
        if state.follows.contains_key(&(user_id, author_id)) {
            return Ok(false);
        }
        state
            .follows
            .insert((user_id, author_id), Follow::new(user_id, author_id));
        Ok(true)
    }

    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        Ok(state.follows.remove(&(user_id, author_id)).is_some())
    }

    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let state = self.state.read().await;
        Ok(state.follows.contains_key(&(user_id, author_id)))
    }

    async fn followers_of(&self, author_id: Uuid) -> Result<Vec<Uuid>, DomainError> {
        let state = self.state.read().await;
        let mut edges: Vec<&Follow> = state
            .follows
            .values()
            .filter(|f| f.author_id == author_id)
            .collect();
        edges.sort_by_key(|f| f.created_at);
        Ok(edges.into_iter().map(|f| f.user_id).collect())
    }

    async fn following_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, DomainError> {
        let state = self.state.read().await;
        let mut edges: Vec<&Follow> = state
            .follows
            .values()
            .filter(|f| f.user_id == user_id)
            .collect();
        edges.sort_by_key(|f| f.created_at);
        Ok(edges.into_iter().map(|f| f.author_id).collect())
    }

    async fn count_followers(&self, author_id: Uuid) -> Result<usize, DomainError> {
        let state = self.state.read().await;
        Ok(state.follows.keys().filter(|(_, a)| *a == author_id).count())
    }

    async fn count_following(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let state = self.state.read().await;
        Ok(state.follows.keys().filter(|(u, _)| *u == user_id).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(store: &InMemoryStore, name: &str) -> User {
        UserRepository::create(store, User::new(name.into(), format!("{name}@example.com"), "x".into()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn rejects_duplicate_usernames() {
        let store = InMemoryStore::new();
        user(&store, "auth").await;
        let err = UserRepository::create(&store, User::new("auth".into(), "b@example.com".into(), "y".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::UserAlreadyExists(name) if name == "auth"));
    }

    #[tokio::test]
    async fn deleting_group_detaches_its_posts() {
        let store = InMemoryStore::new();
        let author = user(&store, "auth").await;
        let group = GroupRepository::create(
            &store,
            NewGroup {
                title: "Test group".into(),
                slug: "test_slug".into(),
                description: "Test description".into(),
            },
        )
        .await
        .unwrap();
        let post = PostRepository::create(
            &store,
            NewPost {
                author_id: author.id,
                text: "grouped".into(),
                group_id: Some(group.id),
                image: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(post.group_slug.as_deref(), Some("test_slug"));

        assert!(store.delete_by_slug("test_slug").await.unwrap());
        assert!(!store.delete_by_slug("test_slug").await.unwrap());

        let post = PostRepository::find_by_id(&store, post.id).await.unwrap().unwrap();
        assert_eq!(post.group_id, None);
        assert_eq!(post.group_slug, None);
    }

    #[tokio::test]
    async fn follow_edges_are_unique() {
        let store = InMemoryStore::new();
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;

        assert!(store.insert(a.id, b.id).await.unwrap());
        assert!(!store.insert(a.id, b.id).await.unwrap());
        assert_eq!(store.followers_of(b.id).await.unwrap(), vec![a.id]);
        assert_eq!(store.following_of(a.id).await.unwrap(), vec![b.id]);
        assert_eq!(store.count_followers(b.id).await.unwrap(), 1);
        assert_eq!(store.count_following(a.id).await.unwrap(), 1);
        assert_eq!(store.count_followers(a.id).await.unwrap(), 0);

        assert!(store.delete(a.id, b.id).await.unwrap());
        assert!(!store.delete(a.id, b.id).await.unwrap());
        assert!(!store.exists(a.id, b.id).await.unwrap());
    }
}
