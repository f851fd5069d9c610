//! Askama page types. Every page carries a [`Nav`] for the site header; the
//! feed fragment does not, so one rendering can be shared by every viewer.

use actix_web::HttpResponse;
use askama::Template;
use tracing::error;

use crate::domain::comment::Comment;
use crate::domain::error::{DomainError, FieldErrors};
use crate::domain::group::Group;
use crate::domain::page::Page;
use crate::domain::post::Post;
use crate::domain::user::User;
use crate::presentation::utils::Viewer;

const HTML: &str = "text/html; charset=utf-8";

#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub authenticated: bool,
    pub username: String,
}

impl Nav {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl From<&Viewer> for Nav {
    fn from(viewer: &Viewer) -> Self {
        match viewer.user() {
            Some(user) => Self {
                authenticated: true,
                username: user.username.clone(),
            },
            None => Self::anonymous(),
        }
    }
}

pub fn html<T: Template>(template: &T) -> Result<HttpResponse, DomainError> {
    let body = template.render()?;
    Ok(HttpResponse::Ok().content_type(HTML).body(body))
}

/// The post list plus paginator shared by every feed page.
#[derive(Template)]
#[template(path = "includes/feed.html")]
pub struct FeedTemplate<'a> {
    pub page: &'a Page<Post>,
}

pub fn render_feed(page: &Page<Post>) -> Result<String, DomainError> {
    Ok(FeedTemplate { page }.render()?)
}

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexTemplate<'a> {
    pub nav: Nav,
    pub feed: &'a str,
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupListTemplate<'a> {
    pub nav: Nav,
    pub group: &'a Group,
    pub feed: String,
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate<'a> {
    pub nav: Nav,
    pub author: &'a User,
    pub feed: String,
    pub following: bool,
    /// Hides the follow buttons on anonymous and own profiles.
    pub can_follow: bool,
    pub post_count: usize,
    pub followers_count: usize,
    pub following_count: usize,
}

#[derive(Template)]
#[template(path = "posts/follow.html")]
pub struct FollowTemplate {
    pub nav: Nav,
    pub feed: String,
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailTemplate<'a> {
    pub nav: Nav,
    pub post: &'a Post,
    pub author_post_count: usize,
    pub comments: &'a [Comment],
    pub can_edit: bool,
    pub comment_text: String,
    pub errors: FieldErrors,
}

pub struct GroupOption {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

impl GroupOption {
    pub fn list(groups: &[Group], selected: Option<i64>) -> Vec<Self> {
        groups
            .iter()
            .map(|group| Self {
                id: group.id,
                title: group.title.clone(),
                selected: selected == Some(group.id),
            })
            .collect()
    }
}

/// Create and edit share one form; `post_id` is only meaningful when editing.
#[derive(Template)]
#[template(path = "posts/create_post.html")]
pub struct PostFormTemplate {
    pub nav: Nav,
    pub is_edit: bool,
    pub post_id: i64,
    pub text: String,
    pub groups: Vec<GroupOption>,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub username: String,
    pub next: String,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate {
    pub nav: Nav,
    pub username: String,
    pub email: String,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "users/logged_out.html")]
pub struct LoggedOutTemplate {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "about/author.html")]
pub struct AuthorTemplate {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "about/tech.html")]
pub struct TechTemplate {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "core/404.html")]
pub struct NotFoundTemplate {
    pub nav: Nav,
    pub path: String,
}

pub fn not_found_page(nav: Nav, path: &str) -> HttpResponse {
    let page = NotFoundTemplate {
        nav,
        path: path.to_string(),
    };
    match page.render() {
        Ok(body) => HttpResponse::NotFound().content_type(HTML).body(body),
        Err(err) => {
            error!(error = %err, "failed to render not-found page");
            HttpResponse::NotFound().finish()
        }
    }
}
