use actix_web::{HttpResponse, Responder, get};
use chrono::Utc;

use crate::presentation::dto::HealthResponse;

/// Fallback for every unmatched route; the body comes from `not_found_pages`.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().finish()
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
