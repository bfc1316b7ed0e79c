//! Domain models and wire DTOs for the triage board.

use serde::Serialize;
use utoipa::ToSchema;

pub mod attachment;
pub mod comment;
pub mod filter;
pub mod issue;
pub mod patch;
pub mod tag;
pub mod user;

// Re-export commonly used types
pub use attachment::AttachmentResponse;
pub use comment::{CommentResponse, CreateCommentRequest, NewComment};
pub use filter::{
    BulkDeleteRequest, BulkDeleteResponse, IssueFilter, IssueIdsQuery, IssueIdsResponse,
    ListIssuesQuery, SearchQuery, SearchRequest, SearchSpec,
};
pub use issue::{
    CreateIssueRequest, IssueChanges, IssueDetailResponse, IssueListResponse, IssueResponse,
    IssueStatus, MoveToCcrRequest, NewIssue, SearchResponse, Severity, UpdateIssueRequest,
    VoteDirection,
};
pub use patch::Patch;
pub use tag::{TagInput, TagResponse};
pub use user::{Caller, Role, UserResponse};

/// Pagination metadata for a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    /// Create pagination metadata.
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        let pages = if total == 0 || per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };

        Pagination {
            page,
            per_page,
            total,
            pages,
        }
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.per_page
    }
}

/// Plain message body.
#[derive(Debug, Clone, Serialize, serde::Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
