pub mod admin;
pub mod application;
pub mod data;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use sqlx::PgPool;

use crate::application::auth_service::AuthService;
use crate::application::feed_service::FeedService;
use crate::application::post_service::PostService;
use crate::application::social_graph::SocialGraph;
use crate::data::comment_repository::{CommentRepository, PostgresCommentRepository};
use crate::data::follow_repository::{FollowRepository, PostgresFollowRepository};
use crate::data::group_repository::{GroupRepository, PostgresGroupRepository};
use crate::data::memory::InMemoryStore;
use crate::data::post_repository::{PostRepository, PostgresPostRepository};
use crate::data::user_repository::{PostgresUserRepository, UserRepository};
use crate::infrastructure::cache::FeedCache;
use crate::infrastructure::security::JwtKeys;
use crate::presentation::handlers;

/// One handle per store concern, backed by Postgres or by a shared in-memory store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            groups: Arc::new(PostgresGroupRepository::new(pool.clone())),
            posts: Arc::new(PostgresPostRepository::new(pool.clone())),
            comments: Arc::new(PostgresCommentRepository::new(pool.clone())),
            follows: Arc::new(PostgresFollowRepository::new(pool)),
        }
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            groups: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            follows: store,
        }
    }
}

#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub posts: PostService,
    pub feeds: FeedService,
    pub social: SocialGraph,
}

impl Services {
    pub fn new(repos: Repositories, keys: JwtKeys, feed_cache_ttl: Duration) -> Self {
        let social = SocialGraph::new(repos.users.clone(), repos.follows.clone());
        let feeds = FeedService::new(
            repos.posts.clone(),
            repos.groups.clone(),
            repos.users.clone(),
            social.clone(),
            Arc::new(FeedCache::new(feed_cache_ttl)),
        );
        Self {
            auth: AuthService::new(repos.users, keys),
            posts: PostService::new(repos.posts, repos.groups, repos.comments),
            feeds,
            social,
        }
    }

    /// Shares the services with every handler and mounts the routes.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.auth.clone()))
            .app_data(web::Data::new(self.posts.clone()))
            .app_data(web::Data::new(self.feeds.clone()))
            .app_data(web::Data::new(self.social.clone()))
            .configure(handlers::configure);
    }
}
