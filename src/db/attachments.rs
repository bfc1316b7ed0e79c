//! Attachment rows.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use crate::entity::attachment;
use crate::error::{AppError, AppResult};
use crate::models::AttachmentResponse;
use crate::services::uploads::StagedBlob;

use super::DbPool;

/// Record staged blobs as attachments of an issue (and optionally one of its comments).
pub async fn insert_attachments<C: ConnectionTrait>(
    db: &C,
    issue_id: Uuid,
    comment_id: Option<Uuid>,
    uploaded_by: &str,
    staged: &[StagedBlob],
) -> AppResult<()> {
    if staged.is_empty() {
        return Ok(());
    }

    let rows = staged.iter().map(|blob| attachment::ActiveModel {
        id: Set(blob.id),
        issue_id: Set(issue_id),
        comment_id: Set(comment_id),
        filename: Set(blob.filename.clone()),
        file_path: Set(blob.key.clone()),
        file_size: Set(blob.size),
        mime_type: Set(blob.mime_type.clone()),
        uploaded_by: Set(uploaded_by.to_string()),
        created_at: Set(blob.uploaded_at),
    });

    attachment::Entity::insert_many(rows)
        .exec_without_returning(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert attachments: {}", e)))?;

    Ok(())
}

/// Attachments of an issue, oldest first.
pub async fn attachments_for_issue<C: ConnectionTrait>(
    db: &C,
    issue_id: Uuid,
) -> AppResult<Vec<attachment::Model>> {
    attachment::Entity::find()
        .filter(attachment::Column::IssueId.eq(issue_id))
        .order_by_asc(attachment::Column::CreatedAt)
        .order_by_asc(attachment::Column::Id)
        .all(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load attachments: {}", e)))
}

/// Blob keys of every attachment whose `owner` column is in `owner_ids`.
pub async fn blob_keys<C: ConnectionTrait>(
    db: &C,
    owner: attachment::Column,
    owner_ids: &[Uuid],
) -> AppResult<Vec<String>> {
    if owner_ids.is_empty() {
        return Ok(Vec::new());
    }

    attachment::Entity::find()
        .select_only()
        .column(attachment::Column::FilePath)
        .filter(owner.is_in(owner_ids.iter().copied()))
        .into_tuple::<String>()
        .all(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load attachment keys: {}", e)))
}

/// Split attachments into issue-level ones and those belonging to comments.
pub fn group_by_comment(
    attachments: Vec<attachment::Model>,
) -> (Vec<AttachmentResponse>, HashMap<Uuid, Vec<AttachmentResponse>>) {
    let mut issue_level = Vec::new();
    let mut by_comment: HashMap<Uuid, Vec<AttachmentResponse>> = HashMap::new();
    for a in attachments {
        match a.comment_id {
            Some(comment_id) => by_comment
                .entry(comment_id)
                .or_default()
                .push(AttachmentResponse::from(a)),
            None => issue_level.push(AttachmentResponse::from(a)),
        }
    }
    (issue_level, by_comment)
}

impl DbPool {
    /// Get an attachment by ID.
    pub async fn get_attachment(&self, id: Uuid) -> AppResult<attachment::Model> {
        attachment::Entity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get attachment: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Attachment {}", id)))
    }
}
