pub mod about;
pub mod auth;
pub mod feed;
pub mod follow;
pub mod posts;
pub mod site;

use actix_web::web;

/// Registers every route; the not-found fallback is installed by the caller
/// through `default_service`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(feed::index)
        .service(feed::group_posts)
        .service(feed::profile)
        .service(feed::follow_index)
        .service(follow::profile_follow)
        .service(follow::profile_unfollow)
        .service(posts::post_detail)
        .service(posts::create_post_form)
        .service(posts::create_post)
        .service(posts::edit_post_form)
        .service(posts::edit_post)
        .service(posts::add_comment)
        .service(auth::scope())
        .service(about::scope())
        .service(site::health);
}
