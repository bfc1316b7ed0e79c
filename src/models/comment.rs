//! Comment DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::comment;
use crate::error::{AppError, AppResult};
use crate::models::attachment::AttachmentResponse;
use crate::services::uploads::MultipartForm;

/// Comment creation payload.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateCommentRequest {
    pub commenter_name: Option<String>,
    pub content: Option<String>,
}

/// Validated comment input.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub commenter_name: String,
    pub content: String,
}

impl CreateCommentRequest {
    /// Read the text fields of a multipart comment form.
    pub fn from_form(form: &MultipartForm) -> Self {
        Self {
            commenter_name: form.text("commenter_name"),
            content: form.text("content"),
        }
    }

    pub fn validate(self) -> AppResult<NewComment> {
        let commenter_name = self.commenter_name.filter(|s| !s.trim().is_empty());
        let content = self.content.filter(|s| !s.trim().is_empty());

        match (commenter_name, content) {
            (Some(commenter_name), Some(content)) => Ok(NewComment {
                commenter_name,
                content,
            }),
            (name, content) => {
                let missing: Vec<&str> = [
                    name.is_none().then_some("commenter_name"),
                    content.is_none().then_some("content"),
                ]
                .into_iter()
                .flatten()
                .collect();
                Err(AppError::Validation(format!(
                    "Missing required field(s): {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// Comment as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    pub id: Uuid,
    pub issue_id: Uuid,
    pub commenter_name: String,
    pub content: String,
    pub is_verified_solution: bool,
    pub upvotes: i32,
    pub downvotes: i32,
    /// `upvotes - downvotes`
    pub score: i32,
    pub attachments: Vec<AttachmentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentResponse {
    pub fn new(m: comment::Model, attachments: Vec<AttachmentResponse>) -> Self {
        Self {
            id: m.id,
            issue_id: m.issue_id,
            commenter_name: m.commenter_name,
            content: m.content,
            is_verified_solution: m.is_verified_solution,
            upvotes: m.upvotes,
            downvotes: m.downvotes,
            score: m.upvotes - m.downvotes,
            attachments,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
