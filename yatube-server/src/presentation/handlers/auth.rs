use actix_web::{HttpResponse, Scope, get, post, web};
use tracing::{error, info};

use crate::application::auth_service::AuthService;
use crate::domain::error::{DomainError, FieldErrors};
use crate::presentation::dto::{LoginForm, LoginQuery, SignupForm};
use crate::presentation::templates::{
    LoggedOutTemplate, LoginTemplate, Nav, SignupTemplate, html,
};
use crate::presentation::utils::{
    Viewer, expired_session_cookie, redirect, safe_next, session_cookie,
};

const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

pub fn scope() -> Scope {
    web::scope("/auth")
        .service(signup_form)
        .service(signup)
        .service(login_form)
        .service(login)
        .service(logout)
}

fn signed_in(auth: &AuthService, token: String, location: &str) -> HttpResponse {
    let mut response = redirect(location);
    if let Err(err) = response.add_cookie(&session_cookie(token, auth.keys().ttl_seconds())) {
        error!(error = %err, "failed to set session cookie");
    }
    response
}

#[get("/signup/")]
async fn signup_form(viewer: Viewer) -> Result<HttpResponse, DomainError> {
    html(&SignupTemplate {
        nav: Nav::from(&viewer),
        username: String::new(),
        email: String::new(),
        errors: FieldErrors::new(),
    })
}

#[post("/signup/")]
async fn signup(
    auth: web::Data<AuthService>,
    viewer: Viewer,
    form: web::Form<SignupForm>,
) -> Result<HttpResponse, DomainError> {
    let confirmation = form.confirmation_errors();
    let registered = match confirmation.into_result() {
        Ok(()) => {
            auth.register(&form.username, &form.email, &form.password1)
                .await
        }
        Err(err) => Err(err),
    };

    let errors = match registered {
        Ok(user) => {
            let (_, token) = auth.login(&user.username, &form.password1).await?;
            return Ok(signed_in(&auth, token, "/"));
        }
        Err(DomainError::InvalidInput(errors)) => errors,
        Err(DomainError::UserAlreadyExists(_)) => FieldErrors::single("username", USERNAME_TAKEN),
        Err(err) => return Err(err),
    };

    html(&SignupTemplate {
        nav: Nav::from(&viewer),
        username: form.username.clone(),
        email: form.email.clone(),
        errors,
    })
}

#[get("/login/")]
async fn login_form(
    viewer: Viewer,
    query: web::Query<LoginQuery>,
) -> Result<HttpResponse, DomainError> {
    html(&LoginTemplate {
        nav: Nav::from(&viewer),
        username: String::new(),
        next: query.next.clone().unwrap_or_default(),
        errors: FieldErrors::new(),
    })
}

#[post("/login/")]
async fn login(
    auth: web::Data<AuthService>,
    viewer: Viewer,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, DomainError> {
    match auth.login(&form.username, &form.password).await {
        Ok((_, token)) => Ok(signed_in(&auth, token, safe_next(form.next.as_deref()))),
        Err(DomainError::Unauthorized) => html(&LoginTemplate {
            nav: Nav::from(&viewer),
            username: form.username.clone(),
            next: form.next.clone().unwrap_or_default(),
            errors: FieldErrors::single(FieldErrors::NON_FIELD, INVALID_LOGIN),
        }),
        Err(err) => Err(err),
    }
}

#[get("/logout/")]
async fn logout(viewer: Viewer) -> Result<HttpResponse, DomainError> {
    if let Some(user) = viewer.user() {
        info!(username = %user.username, "user logged out");
    }
    let mut response = html(&LoggedOutTemplate {
        nav: Nav::anonymous(),
    })?;
    if let Err(err) = response.add_cookie(&expired_session_cookie()) {
        error!(error = %err, "failed to clear session cookie");
    }
    Ok(response)
}
