use actix_web::{web, HttpResponse, Responder};

use super::catalog::{placeholders, PlaceholderInfo};
use super::service::{GenerateDocumentRequest, GeneratedDocument, PreviewRequest, PreviewResponse};
use super::DocumentError;
use crate::{AppState, ErrorResponse};

fn error_response(err: &DocumentError) -> HttpResponse {
    match err {
        DocumentError::Validation(message) => {
            HttpResponse::BadRequest().json(ErrorResponse::bad_request(message))
        }
        DocumentError::TemplateNotFound(_) => {
            HttpResponse::NotFound().json(ErrorResponse::not_found(&err.to_string()))
        }
        _ => {
            log::error!("Document generation failed: {}", err);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&err.to_string()))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/documents/generate",
    tag = "Documents",
    request_body = GenerateDocumentRequest,
    responses(
        (status = 200, description = "PDF generated and shared", body = GeneratedDocument),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Template not found", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = ErrorResponse)
    )
)]
pub async fn generate_document(
    state: web::Data<AppState>,
    item: web::Json<GenerateDocumentRequest>,
) -> impl Responder {
    match state.documents.generate_document(item.into_inner()).await {
        Ok(document) => HttpResponse::Ok().json(document),
        Err(e) => error_response(&e),
    }
}

#[utoipa::path(
    post,
    path = "/api/documents/preview",
    tag = "Documents",
    request_body = PreviewRequest,
    responses(
        (status = 200, description = "Resolved text and formatted blocks", body = PreviewResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Template not found", body = ErrorResponse)
    )
)]
pub async fn preview_document(
    state: web::Data<AppState>,
    item: web::Json<PreviewRequest>,
) -> impl Responder {
    match state.documents.preview(item.into_inner()).await {
        Ok(preview) => HttpResponse::Ok().json(preview),
        Err(e) => error_response(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/documents/placeholders",
    tag = "Documents",
    responses(
        (status = 200, description = "Every placeholder a template may use", body = Vec<PlaceholderInfo>)
    )
)]
pub async fn list_placeholders() -> impl Responder {
    HttpResponse::Ok().json(placeholders())
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/documents/generate").route(web::post().to(generate_document)))
        .service(web::resource("/documents/preview").route(web::post().to(preview_document)))
        .service(
            web::resource("/documents/placeholders").route(web::get().to(list_placeholders)),
        );
}
