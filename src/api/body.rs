//! Request bodies that may arrive as JSON or as `multipart/form-data`.

use actix_multipart::Multipart;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, web};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};
use crate::services::uploads::{MultipartForm, UploadedFile, read_multipart};

/// Largest accepted JSON body, in bytes.
const MAX_JSON_BODY: usize = 1024 * 1024;

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"))
}

/// Read a submission: a JSON body, or a multipart form whose text parts are
/// mapped through `from_form` and whose file parts become attachments.
pub(crate) async fn read_submission<T, F>(
    req: &HttpRequest,
    mut payload: web::Payload,
    max_upload_size: usize,
    from_form: F,
) -> AppResult<(T, Vec<UploadedFile>)>
where
    T: DeserializeOwned,
    F: FnOnce(&MultipartForm) -> T,
{
    if is_multipart(req) {
        let form = read_multipart(Multipart::new(req.headers(), payload), max_upload_size).await?;
        let parsed = from_form(&form);
        return Ok((parsed, form.files));
    }

    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| AppError::Validation(format!("Read error: {}", e)))?;
        if body.len() + chunk.len() > MAX_JSON_BODY {
            return Err(AppError::Validation("Request body is too large".to_string()));
        }
        body.extend_from_slice(&chunk);
    }
    if body.is_empty() {
        return Err(AppError::Validation("Request body is required".to_string()));
    }

    Ok((serde_json::from_slice(&body)?, Vec::new()))
}
