#![allow(dead_code)]

use std::time::Duration;

use actix_web::cookie::Cookie;

use yatube_server::data::memory::InMemoryStore;
use yatube_server::domain::group::{Group, NewGroup};
use yatube_server::domain::post::{Post, PostDraft};
use yatube_server::domain::user::User;
use yatube_server::infrastructure::security::JwtKeys;
use yatube_server::presentation::utils::SESSION_COOKIE;
use yatube_server::{Repositories, Services};

pub const PASSWORD: &str = "s3cret-pass";

/// Builds the full application the way the server does, minus CORS, logging and headers.
#[macro_export]
macro_rules! init_app {
    ($services:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(yatube_server::presentation::middleware::SessionMiddleware)
                .wrap(yatube_server::presentation::middleware::not_found_pages())
                .configure(|cfg| $services.configure(cfg))
                .default_service(actix_web::web::to(
                    yatube_server::presentation::handlers::site::not_found,
                )),
        )
        .await
    };
}

pub struct Harness {
    pub repos: Repositories,
    pub services: Services,
}

impl Harness {
    pub fn new() -> Self {
        let repos = Repositories::in_memory(InMemoryStore::new());
        let services = Services::new(
            repos.clone(),
            JwtKeys::new("test-secret".into(), 1),
            Duration::from_secs(20),
        );
        Self { repos, services }
    }

    pub async fn user(&self, username: &str) -> User {
        self.services
            .auth
            .register(username, &format!("{username}@example.com"), PASSWORD)
            .await
            .unwrap()
    }

    pub async fn session(&self, username: &str) -> Cookie<'static> {
        let (_, token) = self.services.auth.login(username, PASSWORD).await.unwrap();
        Cookie::new(SESSION_COOKIE, token)
    }

    pub async fn group(&self, slug: &str) -> Group {
        self.repos
            .groups
            .create(NewGroup {
                title: format!("Group {slug}"),
                slug: slug.into(),
                description: "Test description".into(),
            })
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.services
            .posts
            .create_post(
                author.id,
                PostDraft {
                    text: text.into(),
                    group_id: group.map(|g| g.id),
                },
            )
            .await
            .unwrap()
    }
}

pub fn template_marker(name: &str) -> String {
    format!(r#"<meta name="template" content="{name}">"#)
}

pub fn card_count(body: &str) -> usize {
    body.matches(r#"<article class="post">"#).count()
}
