use actix_web::{HttpRequest, HttpResponse, get, web};
use tracing::info;

use crate::application::social_graph::{FollowOutcome, SocialGraph};
use crate::domain::error::DomainError;
use crate::presentation::utils::{Viewer, profile_url, redirect, require_authenticated};

#[get("/profile/{username}/follow/")]
pub async fn profile_follow(
    req: HttpRequest,
    social: web::Data<SocialGraph>,
    viewer: Viewer,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let user = require_authenticated(&viewer, &req)?;
    let username = path.into_inner();

    if social.follow(user.id, &username).await? == FollowOutcome::Created {
        info!(follower = %user.username, author = %username, "follow created");
    }
    Ok(redirect(profile_url(&username)))
}

#[get("/profile/{username}/unfollow/")]
pub async fn profile_unfollow(
    req: HttpRequest,
    social: web::Data<SocialGraph>,
    viewer: Viewer,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let user = require_authenticated(&viewer, &req)?;
    let username = path.into_inner();

    if social.unfollow(user.id, &username).await? {
        info!(follower = %user.username, author = %username, "follow removed");
    }
    Ok(redirect(profile_url(&username)))
}
