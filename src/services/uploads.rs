//! Multipart form intake and attachment staging.
//!
//! Issue and comment creation accept `multipart/form-data`: text parts become
//! form fields and every part carrying a filename becomes an attachment. Blobs
//! are written to the store ("staged") before the owning row is persisted, and
//! removed again if that persistence fails.

use std::collections::HashMap;
use std::sync::Arc;

use actix_multipart::Multipart;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::storage::{BlobStore, attachment_key, content_type_for_extension};

/// Largest accepted text part (form field), in bytes.
const MAX_FIELD_SIZE: usize = 64 * 1024;

/// A file part read from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A parsed multipart request.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, Vec<String>>,
    pub files: Vec<UploadedFile>,
}

impl MultipartForm {
    /// Last value submitted for `name`.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).and_then(|v| v.last().cloned())
    }

    /// Every value submitted for `name`, in submission order.
    pub fn all(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    #[cfg(test)]
    pub(crate) fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    #[cfg(test)]
    pub(crate) fn insert_field(&mut self, name: &str, value: &str) {
        self.fields
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }
}

/// Read a whole multipart payload, capping the total file bytes.
pub async fn read_multipart(
    mut payload: Multipart,
    max_upload_size: usize,
) -> AppResult<MultipartForm> {
    let mut form = MultipartForm::default();
    let mut total_size: usize = 0;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?;

        let Some(name) = field.name().map(str::to_string) else {
            drain_field(&mut field).await;
            continue;
        };
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let content_type = field.content_type().map(|m| m.essence_str().to_string());

        let limit = match filename {
            Some(_) => max_upload_size.saturating_sub(total_size),
            None => MAX_FIELD_SIZE,
        };

        let mut data: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::Validation(format!("Read error: {}", e)))?;
            if data.len() + chunk.len() > limit {
                return Err(match filename {
                    Some(ref f) => AppError::Validation(format!(
                        "attachment '{}' exceeds upload limit of {} bytes",
                        f, max_upload_size
                    )),
                    None => AppError::Validation(format!("field '{}' is too large", name)),
                });
            }
            data.extend_from_slice(&chunk);
        }

        match filename {
            // Browsers send an empty file part when no file was chosen
            Some(f) if f.is_empty() && data.is_empty() => {}
            Some(f) => {
                total_size += data.len();
                form.files.push(UploadedFile {
                    filename: f,
                    content_type,
                    data,
                });
            }
            None => {
                let value = String::from_utf8(data).map_err(|_| {
                    AppError::Validation(format!("field '{}' is not valid UTF-8", name))
                })?;
                form.fields.entry(name).or_default().push(value);
            }
        }
    }

    Ok(form)
}

/// Drain a multipart field without saving.
async fn drain_field(field: &mut actix_multipart::Field) {
    while let Some(chunk) = field.next().await {
        let _ = chunk;
    }
}

/// An attachment blob written to the store but not yet recorded.
#[derive(Debug, Clone)]
pub struct StagedBlob {
    pub id: Uuid,
    pub filename: String,
    pub key: String,
    pub size: i64,
    pub mime_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Write every file to the blob store. On failure, already-written blobs are removed.
pub async fn stage_files(
    store: &Arc<dyn BlobStore>,
    files: Vec<UploadedFile>,
) -> AppResult<Vec<StagedBlob>> {
    let mut staged = Vec::with_capacity(files.len());

    for file in files {
        let id = Uuid::now_v7();
        let uploaded_at = Utc::now();
        let key = attachment_key(&file.filename, uploaded_at, id);
        let mime_type = file.content_type.clone().or_else(|| {
            file.filename
                .rsplit_once('.')
                .map(|(_, ext)| content_type_for_extension(ext).to_string())
        });
        let size = file.data.len() as i64;

        if let Err(e) = store.put(&key, file.data, mime_type.as_deref()).await {
            discard_staged(store, &staged).await;
            return Err(e);
        }

        info!("Staged attachment {} ({} bytes) at {}", file.filename, size, key);
        staged.push(StagedBlob {
            id,
            filename: file.filename,
            key,
            size,
            mime_type,
            uploaded_at,
        });
    }

    Ok(staged)
}

/// Best-effort removal of staged blobs after the owning write failed.
pub async fn discard_staged(store: &Arc<dyn BlobStore>, staged: &[StagedBlob]) {
    for blob in staged {
        if let Err(e) = store.delete(&blob.key).await {
            warn!("Failed to discard staged blob {}: {}", blob.key, e);
        }
    }
}

/// Best-effort removal of blobs whose rows were deleted.
pub async fn remove_blobs(store: &Arc<dyn BlobStore>, keys: &[String]) {
    for key in keys {
        if let Err(e) = store.delete(key).await {
            warn!("Failed to remove blob {}: {}", key, e);
        }
    }
}
