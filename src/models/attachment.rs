//! Attachment DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::attachment;

/// Attachment metadata. The blob key stays server-side.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachmentResponse {
    pub id: Uuid,
    pub issue_id: Uuid,
    pub comment_id: Option<Uuid>,
    pub filename: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
    /// Relative URL serving the file
    pub download_url: String,
}

impl From<attachment::Model> for AttachmentResponse {
    fn from(m: attachment::Model) -> Self {
        Self {
            download_url: format!("/api/v1/attachments/{}", m.id),
            id: m.id,
            issue_id: m.issue_id,
            comment_id: m.comment_id,
            filename: m.filename,
            file_size: m.file_size,
            mime_type: m.mime_type,
            uploaded_by: m.uploaded_by,
            created_at: m.created_at,
        }
    }
}
