//! Attachment download.

use std::sync::Arc;

use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::services::storage::BlobStore;

/// `Content-Disposition` value that survives non-ASCII filenames.
fn attachment_disposition(filename: &str) -> String {
    format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    )
}

/// Download an attachment with its stored mime type.
#[utoipa::path(
    get,
    path = "/api/v1/attachments/{attachment_id}",
    tag = "Attachments",
    params(("attachment_id" = Uuid, Path, description = "Attachment id")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "Attachment not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn download_attachment(
    pool: web::Data<DbPool>,
    store: web::Data<Arc<dyn BlobStore>>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let attachment = pool.get_attachment(path.into_inner()).await?;
    let (data, stored_type) = store.get(&attachment.file_path).await?;

    let content_type = attachment
        .mime_type
        .or(stored_type)
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, content_type))
        .insert_header((CONTENT_DISPOSITION, attachment_disposition(&attachment.filename)))
        .body(data))
}

/// Configure attachment routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/attachments/{attachment_id}").route(web::get().to(download_attachment)),
    );
}
