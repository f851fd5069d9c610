use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::http::header::LOCATION;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::{Ready, ready};
use uuid::Uuid;

use crate::application::auth_service::AuthService;
use crate::domain::error::{DomainError, encode_path_segment};

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
}

/// The user behind the request, if the session cookie identified one.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<AuthenticatedUser>);

impl Viewer {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.0.as_ref()
    }

    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.id)
    }
}

impl FromRequest for Viewer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Viewer(req.extensions().get::<AuthenticatedUser>().cloned())))
    }
}

/// Guard for protected handlers: anonymous viewers are sent to the login page
/// with the current path as `next`.
pub fn require_authenticated<'a>(
    viewer: &'a Viewer,
    req: &HttpRequest,
) -> Result<&'a AuthenticatedUser, DomainError> {
    viewer.user().ok_or_else(|| DomainError::Unauthenticated {
        next: full_path(req),
    })
}

fn full_path(req: &HttpRequest) -> String {
    match req.query_string() {
        "" => req.path().to_string(),
        query => format!("{}?{}", req.path(), query),
    }
}

pub fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, location.as_ref()))
        .finish()
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", encode_path_segment(username))
}

/// Only local absolute paths are honoured as post-login targets.
pub fn safe_next(next: Option<&str>) -> &str {
    match next.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

pub fn session_cookie(token: String, ttl_seconds: i64) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(ttl_seconds))
        .finish()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .finish()
}

pub async fn extract_user_from_token(
    token: &str,
    auth_service: &AuthService,
) -> Result<AuthenticatedUser, DomainError> {
    let claims = auth_service
        .keys()
        .verify_token(token)
        .map_err(|_| DomainError::Unauthorized)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| DomainError::Unauthorized)?;

    let user = auth_service.get_user(user_id).await?;

    Ok(AuthenticatedUser {
        id: user.id,
        username: user.username,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn next_must_be_a_local_path() {
        assert_eq!(safe_next(Some("/follow/")), "/follow/");
        assert_eq!(safe_next(Some("https://evil.example/")), "/");
        assert_eq!(safe_next(Some("//evil.example/")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn anonymous_viewer_is_sent_to_login_with_query() {
        let req = TestRequest::get().uri("/follow/?page=2").to_http_request();
        let viewer = Viewer::default();
        let Err(DomainError::Unauthenticated { next }) = require_authenticated(&viewer, &req)
        else {
            panic!("expected a login redirect");
        };
        assert_eq!(next, "/follow/?page=2");
    }
}
