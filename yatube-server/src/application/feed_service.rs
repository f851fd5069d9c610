//! Feed assembly: which posts appear on which listing, one page at a time.
//!
//! Every scope shares the store's ordering (newest first, id as tie-break) and
//! the clamping rules of [`Paginator`]. Only the global feed goes through the
//! [`FeedCache`].

use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::application::social_graph::SocialGraph;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::{PostFilter, PostRepository};
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::page::{Page, PageRequest, Paginator};
use crate::domain::post::Post;
use crate::domain::user::User;
use crate::infrastructure::cache::FeedCache;

pub const INDEX_CACHE_KEY: &str = "index_page";

#[derive(Debug)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Debug)]
pub struct ProfileFeed {
    pub author: User,
    pub page: Page<Post>,
    /// Whether the viewer follows this author; false for anonymous viewers.
    pub following: bool,
    pub post_count: usize,
    pub followers_count: usize,
    pub following_count: usize,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
    social: SocialGraph,
    cache: Arc<FeedCache>,
    paginator: Paginator,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
        social: SocialGraph,
        cache: Arc<FeedCache>,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            social,
            cache,
            paginator: Paginator::default(),
        }
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    async fn page(&self, filter: PostFilter, request: PageRequest) -> Result<Page<Post>, DomainError> {
        let total = self.posts.count(filter).await?;
        let window = self.paginator.window(total, request);
        let items = if window.limit == 0 {
            Vec::new()
        } else {
            self.posts.list(filter, window.limit, window.offset).await?
        };
        Ok(Page::new(items, window))
    }

    pub async fn global(&self, request: PageRequest) -> Result<Page<Post>, DomainError> {
        self.page(PostFilter::All, request).await
    }

    /// The global feed rendered by `render`, served from the cache while fresh.
    ///
    /// Writes do not invalidate the entry; it lives until its TTL expires or the
    /// cache is cleared.
    pub async fn global_rendered<F>(
        &self,
        request: PageRequest,
        render: F,
    ) -> Result<Arc<str>, DomainError>
    where
        F: FnOnce(&Page<Post>) -> Result<String, DomainError>,
    {
        let key = format!("{INDEX_CACHE_KEY}:{}", request.cache_token());
        self.cache
            .get_or_try_insert_with(&key, || async {
                let page = self.global(request).await?;
                render(&page)
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn group(&self, slug: &str, request: PageRequest) -> Result<GroupFeed, DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_string()))?;
        let page = self.page(PostFilter::Group(group.id), request).await?;
        Ok(GroupFeed { group, page })
    }

    #[instrument(skip(self))]
    pub async fn profile(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        request: PageRequest,
    ) -> Result<ProfileFeed, DomainError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))?;
        let page = self.page(PostFilter::Author(author.id), request).await?;
        let following = match viewer {
            Some(viewer) => self.social.is_following(viewer, author.id).await?,
            None => false,
        };
        let followers_count = self.social.count_followers(author.id).await?;
        let following_count = self.social.count_following(author.id).await?;

        Ok(ProfileFeed {
            post_count: page.total_items,
            author,
            page,
            following,
            followers_count,
            following_count,
        })
    }

    /// Posts by every author `viewer` follows; empty when they follow no one.
    #[instrument(skip(self))]
    pub async fn follow(&self, viewer: Uuid, request: PageRequest) -> Result<Page<Post>, DomainError> {
        if self.social.count_following(viewer).await? == 0 {
            return Ok(self.paginator.paginate(Vec::new(), request));
        }
        self.page(PostFilter::FollowedBy(viewer), request).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::data::memory::InMemoryStore;
    use crate::domain::group::NewGroup;
    use crate::domain::post::NewPost;

    struct Fixture {
        store: Arc<InMemoryStore>,
        feeds: FeedService,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(InMemoryStore::new());
            let social = SocialGraph::new(store.clone(), store.clone());
            let feeds = FeedService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                social,
                Arc::new(FeedCache::new(Duration::from_secs(20))),
            );
            Self { store, feeds }
        }

        async fn user(&self, name: &str) -> User {
            UserRepository::create(
                self.store.as_ref(),
                User::new(name.into(), format!("{name}@example.com"), "x".into()),
            )
            .await
            .unwrap()
        }

        async fn group(&self, slug: &str) -> Group {
            GroupRepository::create(
                self.store.as_ref(),
                NewGroup {
                    title: format!("Group {slug}"),
                    slug: slug.into(),
                    description: "Test description".into(),
                },
            )
            .await
            .unwrap()
        }

        async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
            PostRepository::create(
                self.store.as_ref(),
                NewPost {
                    author_id: author.id,
                    text: text.into(),
                    group_id: group.map(|g| g.id),
                    image: None,
                },
            )
            .await
            .unwrap()
        }
    }

    fn ids(page: &Page<Post>) -> Vec<i64> {
        page.items.iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn grouped_post_appears_in_its_feeds_only() {
        let f = Fixture::new();
        let author = f.user("auth").await;
        let group = f.group("test_slug").await;
        f.group("test_slug_2").await;
        let post = f.post(&author, "Test post", Some(&group)).await;

        let first = PageRequest::default();
        assert_eq!(ids(&f.feeds.global(first).await.unwrap()), vec![post.id]);
        assert_eq!(ids(&f.feeds.group("test_slug", first).await.unwrap().page), vec![post.id]);
        assert_eq!(ids(&f.feeds.profile("auth", None, first).await.unwrap().page), vec![post.id]);
        assert!(f.feeds.group("test_slug_2", first).await.unwrap().page.is_empty());
    }

    #[tokio::test]
    async fn thirteen_group_posts_split_into_two_pages_newest_first() {
        let f = Fixture::new();
        let author = f.user("auth").await;
        let group = f.group("test_slug").await;
        let mut created = Vec::new();
        for i in 0..13 {
            created.push(f.post(&author, &format!("Test text {i}"), Some(&group)).await.id);
        }
        created.reverse();

        let first = f.feeds.group("test_slug", PageRequest::Number(1)).await.unwrap().page;
        let second = f.feeds.group("test_slug", PageRequest::Number(2)).await.unwrap().page;
        assert_eq!(ids(&first), created[..10].to_vec());
        assert_eq!(ids(&second), created[10..].to_vec());

        let beyond = f.feeds.global(PageRequest::Number(999)).await.unwrap();
        assert_eq!(ids(&beyond), ids(&second));
        assert_eq!(beyond.number, 2);
    }

    #[tokio::test]
    async fn unknown_scopes_are_not_found() {
        let f = Fixture::new();
        assert!(matches!(
            f.feeds.group("missing", PageRequest::default()).await,
            Err(DomainError::GroupNotFound(_))
        ));
        assert!(matches!(
            f.feeds.profile("ghost", None, PageRequest::default()).await,
            Err(DomainError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn follow_feed_is_union_of_followed_authors() {
        let f = Fixture::new();
        let viewer = f.user("viewer").await;
        let a1 = f.user("a1").await;
        let a2 = f.user("a2").await;
        let stranger = f.user("stranger").await;

        let p1 = f.post(&a1, "from a1", None).await;
        let _noise = f.post(&stranger, "from stranger", None).await;
        let p2 = f.post(&a2, "from a2", None).await;
        let p3 = f.post(&a1, "again a1", None).await;

        let social = SocialGraph::new(f.store.clone(), f.store.clone());
        assert!(f.feeds.follow(viewer.id, PageRequest::default()).await.unwrap().is_empty());

        social.follow(viewer.id, "a1").await.unwrap();
        social.follow(viewer.id, "a2").await.unwrap();
        let feed = f.feeds.follow(viewer.id, PageRequest::default()).await.unwrap();
        assert_eq!(ids(&feed), vec![p3.id, p2.id, p1.id]);

        social.unfollow(viewer.id, "a1").await.unwrap();
        let feed = f.feeds.follow(viewer.id, PageRequest::default()).await.unwrap();
        assert_eq!(ids(&feed), vec![p2.id]);
    }

    #[tokio::test]
    async fn profile_reports_viewer_follow_status() {
        let f = Fixture::new();
        let author = f.user("auth").await;
        let viewer = f.user("viewer").await;
        f.post(&author, "post", None).await;

        let anonymous = f.feeds.profile("auth", None, PageRequest::default()).await.unwrap();
        assert!(!anonymous.following);
        assert_eq!(anonymous.post_count, 1);

        SocialGraph::new(f.store.clone(), f.store.clone())
            .follow(viewer.id, "auth")
            .await
            .unwrap();
        let seen = f
            .feeds
            .profile("auth", Some(viewer.id), PageRequest::default())
            .await
            .unwrap();
        assert!(seen.following);
        assert_eq!(seen.followers_count, 1);

        let own = f
            .feeds
            .profile("auth", Some(author.id), PageRequest::default())
            .await
            .unwrap();
        assert!(!own.following);
    }

    #[tokio::test]
    async fn rendered_global_feed_stays_stale_until_cleared() {
        let f = Fixture::new();
        let author = f.user("auth").await;
        f.post(&author, "first", None).await;

        let render = |page: &Page<Post>| Ok::<_, DomainError>(format!("{:?}", ids(page)));
        let before = f.feeds.global_rendered(PageRequest::default(), render).await.unwrap();

        f.post(&author, "second", None).await;
        let cached = f.feeds.global_rendered(PageRequest::default(), render).await.unwrap();
        assert_eq!(cached, before);

        f.feeds.cache().clear().await;
        let fresh = f.feeds.global_rendered(PageRequest::default(), render).await.unwrap();
        assert_ne!(fresh, before);
    }
}
