use actix_web::{HttpRequest, HttpResponse, get, web};

use crate::application::feed_service::FeedService;
use crate::domain::error::DomainError;
use crate::presentation::dto::PageQuery;
use crate::presentation::templates::{
    FollowTemplate, GroupListTemplate, IndexTemplate, Nav, ProfileTemplate, html, render_feed,
};
use crate::presentation::utils::{Viewer, require_authenticated};

#[get("/")]
pub async fn index(
    feeds: web::Data<FeedService>,
    viewer: Viewer,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let feed = feeds.global_rendered(query.request(), render_feed).await?;
    html(&IndexTemplate {
        nav: Nav::from(&viewer),
        feed: &feed,
    })
}

#[get("/group/{slug}/")]
pub async fn group_posts(
    feeds: web::Data<FeedService>,
    viewer: Viewer,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let group_feed = feeds.group(&path, query.request()).await?;
    html(&GroupListTemplate {
        nav: Nav::from(&viewer),
        group: &group_feed.group,
        feed: render_feed(&group_feed.page)?,
    })
}

#[get("/profile/{username}/")]
pub async fn profile(
    feeds: web::Data<FeedService>,
    viewer: Viewer,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let profile = feeds.profile(&path, viewer.id(), query.request()).await?;
    let can_follow = viewer
        .id()
        .is_some_and(|viewer_id| viewer_id != profile.author.id);

    html(&ProfileTemplate {
        nav: Nav::from(&viewer),
        author: &profile.author,
        feed: render_feed(&profile.page)?,
        following: profile.following,
        can_follow,
        post_count: profile.post_count,
        followers_count: profile.followers_count,
        following_count: profile.following_count,
    })
}

#[get("/follow/")]
pub async fn follow_index(
    req: HttpRequest,
    feeds: web::Data<FeedService>,
    viewer: Viewer,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let user = require_authenticated(&viewer, &req)?;
    let page = feeds.follow(user.id, query.request()).await?;
    html(&FollowTemplate {
        nav: Nav::from(&viewer),
        feed: render_feed(&page)?,
    })
}
