use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::data::follow_repository::FollowRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    /// Following yourself is silently ignored.
    SelfFollow,
}

/// Follow edges between users: no self-loops, no parallel edges.
#[derive(Clone)]
pub struct SocialGraph {
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl SocialGraph {
    pub fn new(users: Arc<dyn UserRepository>, follows: Arc<dyn FollowRepository>) -> Self {
        Self { users, follows }
    }

    async fn resolve(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn follow(&self, follower: Uuid, target: &str) -> Result<FollowOutcome, DomainError> {
        let author = self.resolve(target).await?;
        // Storage uniqueness alone would accept (X, X).
        if author.id == follower {
            debug!("self-follow ignored");
            return Ok(FollowOutcome::SelfFollow);
        }

        if self.follows.insert(follower, author.id).await? {
            Ok(FollowOutcome::Created)
        } else {
            Ok(FollowOutcome::AlreadyFollowing)
        }
    }

    /// Returns whether an edge was removed; a missing edge is not an error.
    #[instrument(skip(self))]
    pub async fn unfollow(&self, follower: Uuid, target: &str) -> Result<bool, DomainError> {
        let author = self.resolve(target).await?;
        self.follows.delete(follower, author.id).await
    }

    pub async fn is_following(&self, follower: Uuid, target: Uuid) -> Result<bool, DomainError> {
        if follower == target {
            return Ok(false);
        }
        self.follows.exists(follower, target).await
    }

    pub async fn followers_of(&self, target: Uuid) -> Result<Vec<Uuid>, DomainError> {
        self.follows.followers_of(target).await
    }

    pub async fn following_of(&self, user: Uuid) -> Result<Vec<Uuid>, DomainError> {
        self.follows.following_of(user).await
    }

    pub async fn count_followers(&self, target: Uuid) -> Result<usize, DomainError> {
        self.follows.count_followers(target).await
    }

    pub async fn count_following(&self, user: Uuid) -> Result<usize, DomainError> {
        self.follows.count_following(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;

    async fn setup() -> (SocialGraph, User, User) {
        let store = Arc::new(InMemoryStore::new());
        let a = UserRepository::create(
            store.as_ref(),
            User::new("auth".into(), "a@example.com".into(), "x".into()),
        )
        .await
        .unwrap();
        let b = UserRepository::create(
            store.as_ref(),
            User::new("auth2".into(), "b@example.com".into(), "x".into()),
        )
        .await
        .unwrap();
        (SocialGraph::new(store.clone(), store), a, b)
    }

    #[tokio::test]
    async fn follow_twice_creates_one_edge() {
        let (graph, a, b) = setup().await;

        assert_eq!(graph.follow(a.id, "auth2").await.unwrap(), FollowOutcome::Created);
        assert_eq!(
            graph.follow(a.id, "auth2").await.unwrap(),
            FollowOutcome::AlreadyFollowing
        );
        assert!(graph.is_following(a.id, b.id).await.unwrap());
        assert!(!graph.is_following(b.id, a.id).await.unwrap());
        assert_eq!(graph.followers_of(b.id).await.unwrap(), vec![a.id]);
        assert_eq!(graph.following_of(a.id).await.unwrap(), vec![b.id]);
        assert_eq!(graph.count_followers(b.id).await.unwrap(), 1);
        assert_eq!(graph.count_following(a.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn self_follow_never_creates_an_edge() {
        let (graph, a, _) = setup().await;

        assert_eq!(graph.follow(a.id, "auth").await.unwrap(), FollowOutcome::SelfFollow);
        assert!(!graph.is_following(a.id, a.id).await.unwrap());
        assert!(graph.followers_of(a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unfollow_is_idempotent() {
        let (graph, a, b) = setup().await;

        assert!(!graph.unfollow(a.id, "auth2").await.unwrap());
        graph.follow(a.id, "auth2").await.unwrap();
        assert!(graph.unfollow(a.id, "auth2").await.unwrap());
        assert!(!graph.unfollow(a.id, "auth2").await.unwrap());
        assert!(!graph.is_following(a.id, b.id).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_target_is_not_found() {
        let (graph, a, _) = setup().await;

        assert!(matches!(
            graph.follow(a.id, "ghost").await,
            Err(DomainError::UserNotFound(name)) if name == "ghost"
        ));
        assert!(matches!(
            graph.unfollow(a.id, "ghost").await,
            Err(DomainError::UserNotFound(_))
        ));
    }
}
