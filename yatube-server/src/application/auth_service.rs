use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::data::user_repository::UserRepository;
use crate::domain::error::{DomainError, FieldErrors};
use crate::domain::user::User;
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(id.to_string()))
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, DomainError> {
        let username = username.trim();
        let email = email.trim();
        validate_registration(username, email, password).into_result()?;

        let hash =
            hash_password(password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(username.to_string(), email.to_lowercase(), hash);
        let user = self.repo.create(user).await?;
        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Checks credentials and issues a session token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String), DomainError> {
        let user = self
            .repo
            .find_by_username(username.trim())
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        let token = self
            .keys
            .generate_token(user.id)
            .map_err(|err| DomainError::Internal(err.to_string()))?;
        info!(user_id = %user.id, "user logged in");
        Ok((user, token))
    }
}

fn validate_registration(username: &str, email: &str, password: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if username.is_empty() {
        errors.add("username", "This field is required.");
    } else if username.chars().count() > USERNAME_MAX_LEN {
        errors.add(
            "username",
            format!("Ensure this value has at most {USERNAME_MAX_LEN} characters."),
        );
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }

    if email.is_empty() {
        errors.add("email", "This field is required.");
    } else if !email.contains('@') {
        errors.add("email", "Enter a valid email address.");
    }

    if password.chars().count() < PASSWORD_MIN_LEN {
        errors.add(
            "password1",
            format!("This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."),
        );
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryStore::new()),
            JwtKeys::new("test-secret".into(), 1),
        )
    }

    #[tokio::test]
    async fn registered_user_can_log_in() {
        let auth = service();
        let user = auth
            .register("auth", "Auth@Example.com", "s3cret-pass")
            .await
            .unwrap();
        assert_eq!(user.email, "auth@example.com");

        let (logged_in, token) = auth.login("auth", "s3cret-pass").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(auth.keys().verify_token(&token).unwrap().sub, user.id.to_string());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_unauthorized() {
        let auth = service();
        auth.register("auth", "auth@example.com", "s3cret-pass")
            .await
            .unwrap();

        assert!(matches!(
            auth.login("auth", "nope-nope").await,
            Err(DomainError::Unauthorized)
        ));
        assert!(matches!(
            auth.login("ghost", "s3cret-pass").await,
            Err(DomainError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn registration_reports_field_errors() {
        let auth = service();
        let Err(DomainError::InvalidInput(errors)) =
            auth.register("bad name!", "no-at-sign", "short").await
        else {
            panic!("expected validation errors");
        };
        assert!(errors.has("username"));
        assert!(errors.has("email"));
        assert!(errors.has("password1"));
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let auth = service();
        auth.register("auth", "a@example.com", "s3cret-pass")
            .await
            .unwrap();
        assert!(matches!(
            auth.register("auth", "b@example.com", "s3cret-pass").await,
            Err(DomainError::UserAlreadyExists(_))
        ));
    }
}
