use std::collections::BTreeMap;

use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;
use tracing::error;


pub const LOGIN_URL: &str = "/auth/login/";

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("group not found: {0}")]
    GroupNotFound(String),
    #[error("post not found: {0}")]
    PostNotFound(i64),
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),
    #[error("authentication required")]
    Unauthenticated { next: String },
    #[error("invalid credentials")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("invalid input")]
    InvalidInput(FieldErrors),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::UserNotFound(_) | DomainError::GroupNotFound(_) | DomainError::PostNotFound(_)
        )
    }
}

impl From<askama::Error> for DomainError {
    fn from(err: askama::Error) -> Self {
        DomainError::Internal(format!("template error: {err}"))
    }
}

/// Validation messages keyed by form field; `__all__` holds form-wide ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub const NON_FIELD: &'static str = "__all__";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn non_field(&self) -> &[String] {
        self.get(Self::NON_FIELD)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn into_result(self) -> Result<(), DomainError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::InvalidInput(self))
        }
    }
}

/// `/auth/login/?next=<path>`, keeping `/` readable in the return target.
pub fn login_redirect_url(next: &str) -> String {
    let mut url = String::with_capacity(LOGIN_URL.len() + next.len() + 6);
    url.push_str(LOGIN_URL);
    url.push_str("?next=");
    push_percent_encoded(&mut url, next, true);
    url
}

/// Percent-encodes one path segment: everything but unreserved characters.
pub fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    push_percent_encoded(&mut encoded, segment, false);
    encoded
}

fn push_percent_encoded(out: &mut String, input: &str, keep_slash: bool) {
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            b'/' if keep_slash => out.push('/'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::UserNotFound(_)
            | DomainError::GroupNotFound(_)
            | DomainError::PostNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Unauthenticated { .. } => StatusCode::FOUND,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden => StatusCode::FORBIDDEN,
            DomainError::UserAlreadyExists(_) => StatusCode::CONFLICT,
            DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            DomainError::Unauthenticated { next } => HttpResponse::Found()
                .insert_header((LOCATION, login_redirect_url(next)))
                .finish(),
            err if err.is_not_found() => HttpResponse::NotFound().finish(),
            DomainError::Internal(message) => {
                error!(error = %message, "request failed");
                HttpResponse::InternalServerError()
                    .content_type("text/plain; charset=utf-8")
                    .body("internal server error")
            }
            other => HttpResponse::build(other.status_code())
                .content_type("text/plain; charset=utf-8")
                .body(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_redirect_keeps_path_and_escapes_query() {
        assert_eq!(login_redirect_url("/create/"), "/auth/login/?next=/create/");
        assert_eq!(
            login_redirect_url("/follow/?page=2"),
            "/auth/login/?next=/follow/%3Fpage%3D2"
        );
    }

    #[test]
    fn path_segments_escape_non_ascii_and_slashes() {
        assert_eq!(encode_path_segment("auth_2"), "auth_2");
        assert_eq!(encode_path_segment("Автор"), "%D0%90%D0%B2%D1%82%D0%BE%D1%80");
        assert_eq!(encode_path_segment("a/b+c"), "a%2Fb%2Bc");
    }

    #[test]
    fn field_errors_collect_messages_per_field() {
        let mut errors = FieldErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.add("text", "This field is required.");
        errors.add("text", "Second message.");
        assert_eq!(errors.get("text").len(), 2);
        assert!(errors.get("group").is_empty());
        assert!(matches!(errors.into_result(), Err(DomainError::InvalidInput(_))));
    }
}
