//! Blob storage for attachments.
//!
//! Attachments are addressed by an opaque key. Two backends are provided:
//! a local directory (default, also used by tests) and S3/MinIO.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use tracing::info;
use uuid::Uuid;

use crate::config::{StorageBackend, StorageSettings};
use crate::error::{AppError, AppResult};

/// Key prefix under which every attachment blob is stored.
pub const ATTACHMENT_PREFIX: &str = "attachments";

/// Opaque keyed blob store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`, replacing any previous blob.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<&str>) -> AppResult<()>;

    /// Fetch the blob and its content type. Missing keys are `NotFound`.
    async fn get(&self, key: &str) -> AppResult<(Vec<u8>, Option<String>)>;

    /// Remove the blob. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// Build the configured blob store.
pub async fn build_blob_store(config: &StorageSettings) -> AppResult<Arc<dyn BlobStore>> {
    match config.backend {
        StorageBackend::Local => Ok(Arc::new(LocalBlobStore::new(&config.upload_dir).await?)),
        StorageBackend::S3 => Ok(Arc::new(S3BlobStore::new(config).await?)),
    }
}

/// Blob store rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create the store, creating `root` if needed.
    pub async fn new(root: impl AsRef<Path>) -> AppResult<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to create upload directory {}: {}",
                root.display(),
                e
            ))
        })?;
        info!("Local blob storage initialized: root={}", root.display());
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        if key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
            return Err(AppError::Storage(format!("Invalid blob key: {}", key)));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: Option<&str>) -> AppResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {}", e)))?;
        }
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write blob {}: {}", key, e)))
    }

    async fn get(&self, key: &str) -> AppResult<(Vec<u8>, Option<String>)> {
        let path = self.path_for(key)?;
        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("File {}", key))
            } else {
                AppError::Storage(format!("Failed to read blob {}: {}", key, e))
            }
        })?;
        let content_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| content_type_for_extension(ext).to_string());
        Ok((data, content_type))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete blob {}: {}",
                key, e
            ))),
        }
    }
}

/// S3 storage client wrapper. Works against AWS S3 and MinIO.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Create a new S3 storage client from configuration.
    pub async fn new(config: &StorageSettings) -> AppResult<Self> {
        let credentials = Credentials::new(
            &config.access_key,
            config.secret_key.expose_secret(),
            None,
            None,
            "triage-board",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true); // Required for MinIO

        if let Some(ref endpoint) = config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let storage = Self {
            client: Client::from_conf(s3_config_builder.build()),
            bucket: config.bucket.clone(),
        };

        storage.ensure_bucket_exists().await?;

        info!("S3 storage initialized: bucket={}", config.bucket);

        Ok(storage)
    }

    /// Ensure the bucket exists, creating it if necessary.
    async fn ensure_bucket_exists(&self) -> AppResult<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    info!("Creating S3 bucket '{}'", self.bucket);
                    self.client
                        .create_bucket()
                        .bucket(&self.bucket)
                        .send()
                        .await
                        .map_err(|e| {
                            AppError::Storage(format!("Failed to create bucket: {}", e))
                        })?;
                    Ok(())
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to access bucket '{}': {}",
                        self.bucket, service_error
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<&str>) -> AppResult<()> {
        let body = aws_sdk_s3::primitives::ByteStream::from(data);
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload file to S3: {}", e)))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<(Vec<u8>, Option<String>)> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    AppError::NotFound(format!("File {}", key))
                } else {
                    AppError::Storage(format!("Failed to get file from S3: {}", service_error))
                }
            })?;

        let content_type = response.content_type().map(String::from);
        let data = response
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read S3 response body: {}", e)))?
            .into_bytes()
            .to_vec();

        Ok((data, content_type))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete S3 object: {}", e)))?;
        Ok(())
    }
}

/// Get the content type for a file based on its extension.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "log" | "txt" => "text/plain",
        "csv" => "text/csv",
        "zip" => "application/zip",
        "gz" | "tgz" => "application/gzip",
        "xml" => "application/xml",
        _ => "application/octet-stream",
    }
}

/// Strip directory components and unsafe characters from a client filename.
///
/// Returns `"file"` when nothing usable remains.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').replace("..", "_");
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Build a blob key for an uploaded attachment.
///
/// Format: `attachments/{yyyymmdd_HHMMSS}_{sanitized filename}_{8-char id}`.
pub fn attachment_key(filename: &str, uploaded_at: DateTime<Utc>, id: Uuid) -> String {
    let simple = id.simple().to_string();
    format!(
        "{}/{}_{}_{}",
        ATTACHMENT_PREFIX,
        uploaded_at.format("%Y%m%d_%H%M%S"),
        sanitize_filename(filename),
        &simple[simple.len() - 8..]
    )
}
