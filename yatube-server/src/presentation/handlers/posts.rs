use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::info;

use crate::application::post_service::PostService;
use crate::domain::error::{DomainError, FieldErrors};
use crate::domain::post::Post;
use crate::presentation::dto::{CommentForm, PostForm};
use crate::presentation::templates::{
    GroupOption, Nav, PostDetailTemplate, PostFormTemplate, html,
};
use crate::presentation::utils::{Viewer, profile_url, redirect, require_authenticated};

fn detail_url(post_id: i64) -> String {
    format!("/posts/{post_id}/")
}

async fn render_detail(
    service: &PostService,
    viewer: &Viewer,
    post: &Post,
    comment_text: String,
    errors: FieldErrors,
) -> Result<HttpResponse, DomainError> {
    let comments = service.comments_for(post.id).await?;
    let author_post_count = service.count_by_author(post.author_id).await?;
    html(&PostDetailTemplate {
        nav: Nav::from(viewer),
        post,
        author_post_count,
        comments: &comments,
        can_edit: viewer.id() == Some(post.author_id),
        comment_text,
        errors,
    })
}

async fn render_form(
    service: &PostService,
    viewer: &Viewer,
    post_id: Option<i64>,
    form: &PostForm,
    errors: FieldErrors,
) -> Result<HttpResponse, DomainError> {
    let groups = service.list_groups().await?;
    html(&PostFormTemplate {
        nav: Nav::from(viewer),
        is_edit: post_id.is_some(),
        post_id: post_id.unwrap_or_default(),
        text: form.text.clone(),
        groups: GroupOption::list(&groups, form.selected_group()),
        errors,
    })
}

#[get("/posts/{post_id:\\d+}/")]
pub async fn post_detail(
    service: web::Data<PostService>,
    viewer: Viewer,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let post = service.get_post(path.into_inner()).await?;
    render_detail(&service, &viewer, &post, String::new(), FieldErrors::new()).await
}

#[get("/create/")]
pub async fn create_post_form(
    req: HttpRequest,
    service: web::Data<PostService>,
    viewer: Viewer,
) -> Result<HttpResponse, DomainError> {
    require_authenticated(&viewer, &req)?;
    render_form(&service, &viewer, None, &PostForm::default(), FieldErrors::new()).await
}

#[post("/create/")]
pub async fn create_post(
    req: HttpRequest,
    service: web::Data<PostService>,
    viewer: Viewer,
    form: web::Form<PostForm>,
) -> Result<HttpResponse, DomainError> {
    let user = require_authenticated(&viewer, &req)?;

    let created = match form.to_draft() {
        Ok(draft) => service.create_post(user.id, draft).await,
        Err(errors) => Err(DomainError::InvalidInput(errors)),
    };
    match created {
        Ok(post) => {
            info!(post_id = post.id, post = %post, author = %user.username, "post published");
            Ok(redirect(profile_url(&user.username)))
        }
        Err(DomainError::InvalidInput(errors)) => {
            render_form(&service, &viewer, None, &form, errors).await
        }
        Err(err) => Err(err),
    }
}

#[get("/posts/{post_id:\\d+}/edit/")]
pub async fn edit_post_form(
    req: HttpRequest,
    service: web::Data<PostService>,
    viewer: Viewer,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let user = require_authenticated(&viewer, &req)?;
    let post_id = path.into_inner();

    match service.get_for_edit(user.id, post_id).await {
        Ok(post) => {
            let form = PostForm::from_post(&post);
            render_form(&service, &viewer, Some(post_id), &form, FieldErrors::new()).await
        }
        Err(DomainError::Forbidden) => Ok(redirect(detail_url(post_id))),
        Err(err) => Err(err),
    }
}

#[post("/posts/{post_id:\\d+}/edit/")]
pub async fn edit_post(
    req: HttpRequest,
    service: web::Data<PostService>,
    viewer: Viewer,
    path: web::Path<i64>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse, DomainError> {
    let user = require_authenticated(&viewer, &req)?;
    let post_id = path.into_inner();

    let updated = match form.to_draft() {
        Ok(draft) => service.update_post(user.id, post_id, draft).await,
        Err(errors) => match service.get_for_edit(user.id, post_id).await {
            Ok(_) => Err(DomainError::InvalidInput(errors)),
            Err(err) => Err(err),
        },
    };
    match updated {
        Ok(_) | Err(DomainError::Forbidden) => Ok(redirect(detail_url(post_id))),
        Err(DomainError::InvalidInput(errors)) => {
            render_form(&service, &viewer, Some(post_id), &form, errors).await
        }
        Err(err) => Err(err),
    }
}

#[post("/posts/{post_id:\\d+}/comment/")]
pub async fn add_comment(
    req: HttpRequest,
    service: web::Data<PostService>,
    viewer: Viewer,
    path: web::Path<i64>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse, DomainError> {
    let user = require_authenticated(&viewer, &req)?;
    let post_id = path.into_inner();

    match service.add_comment(user.id, post_id, &form.text).await {
        Ok(_) => Ok(redirect(detail_url(post_id))),
        Err(DomainError::InvalidInput(errors)) => {
            let post = service.get_post(post_id).await?;
            render_detail(&service, &viewer, &post, form.text.clone(), errors).await
        }
        Err(err) => Err(err),
    }
}
