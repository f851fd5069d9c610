use actix_web::{HttpResponse, Scope, get, web};

use crate::domain::error::DomainError;
use crate::presentation::templates::{AuthorTemplate, Nav, TechTemplate, html};
use crate::presentation::utils::Viewer;

pub fn scope() -> Scope {
    web::scope("/about").service(author).service(tech)
}

#[get("/author/")]
async fn author(viewer: Viewer) -> Result<HttpResponse, DomainError> {
    html(&AuthorTemplate {
        nav: Nav::from(&viewer),
    })
}

#[get("/tech/")]
async fn tech(viewer: Viewer) -> Result<HttpResponse, DomainError> {
    html(&TechTemplate {
        nav: Nav::from(&viewer),
    })
}
