//! Filter vocabulary shared by listing, search and bulk admin queries.

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::tag::TagInput;

/// Largest accepted search `size`.
pub const MAX_SEARCH_SIZE: u64 = 500;
/// Largest accepted listing `per_page`.
pub const MAX_PER_PAGE: u64 = 100;

/// Exact-match filters over issues. Blank values are treated as absent.
///
/// `tags` is accepted and carried through but does not narrow results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub status: Option<String>,
    pub severity: Option<String>,
    pub release: Option<String>,
    pub platform: Option<String>,
    pub build: Option<String>,
    pub target: Option<String>,
    pub test_case_ids: Option<String>,
    pub reporter_name: Option<String>,
    pub tags: Vec<String>,
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Free text is kept verbatim; it only counts as absent when blank.
fn search_text(value: &Option<String>) -> Option<String> {
    value.clone().filter(|s| !s.trim().is_empty())
}

fn split_tags(input: Option<&TagInput>) -> Vec<String> {
    let raw: Vec<&str> = match input {
        Some(TagInput::Csv(s)) => s.split(',').collect(),
        Some(TagInput::List(items)) => items.iter().map(String::as_str).collect(),
        None => Vec::new(),
    };
    raw.into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

macro_rules! filter_fields {
    ($self:ident, $tags:expr) => {
        IssueFilter {
            status: present(&$self.status),
            severity: present(&$self.severity),
            release: present(&$self.release),
            platform: present(&$self.platform),
            build: present(&$self.build),
            target: present(&$self.target),
            test_case_ids: present(&$self.test_case_ids),
            reporter_name: present(&$self.reporter_name),
            tags: $tags,
        }
    };
}

/// `GET /issues` query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListIssuesQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub status: Option<String>,
    pub severity: Option<String>,
    pub release: Option<String>,
    pub platform: Option<String>,
    pub build: Option<String>,
    pub target: Option<String>,
    #[serde(alias = "test_case_id")]
    pub test_case_ids: Option<String>,
    pub reporter_name: Option<String>,
    pub tags: Option<String>,
}

impl ListIssuesQuery {
    pub fn filter(&self) -> IssueFilter {
        filter_fields!(self, split_tags(self.tags.clone().map(TagInput::Csv).as_ref()))
    }

    /// Page number, 1-based; anything below 1 is page 1.
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self, default: u64) -> u64 {
        self.per_page.unwrap_or(default).clamp(1, MAX_PER_PAGE)
    }
}

/// `GET /search` query string.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub size: Option<u64>,
    pub status: Option<String>,
    pub severity: Option<String>,
    pub release: Option<String>,
    pub platform: Option<String>,
    pub build: Option<String>,
    pub target: Option<String>,
    #[serde(alias = "test_case_id")]
    pub test_case_ids: Option<String>,
    pub reporter_name: Option<String>,
    pub tags: Option<String>,
}

/// `POST /search` body.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// Free text matched against title, description and test case id
    pub search: Option<String>,
    /// Result cap (default 20, max 500)
    pub size: Option<u64>,
    pub status: Option<String>,
    pub severity: Option<String>,
    pub release: Option<String>,
    pub platform: Option<String>,
    pub build: Option<String>,
    pub target: Option<String>,
    #[serde(alias = "test_case_id")]
    pub test_case_ids: Option<String>,
    pub reporter_name: Option<String>,
    /// Accepted but not applied
    #[schema(value_type = Option<Vec<String>>)]
    pub tags: Option<TagInput>,
}

/// A resolved search: free text, filters and result cap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSpec {
    pub text: Option<String>,
    pub filter: IssueFilter,
    pub size: u64,
}

fn clamp_size(size: Option<u64>, default: u64) -> u64 {
    size.unwrap_or(default).clamp(1, MAX_SEARCH_SIZE)
}

impl SearchQuery {
    pub fn into_spec(self, default_size: u64) -> SearchSpec {
        SearchSpec {
            text: search_text(&self.q),
            filter: filter_fields!(self, split_tags(self.tags.clone().map(TagInput::Csv).as_ref())),
            size: clamp_size(self.size, default_size),
        }
    }
}

impl SearchRequest {
    pub fn into_spec(self, default_size: u64) -> SearchSpec {
        SearchSpec {
            text: search_text(&self.search),
            filter: filter_fields!(self, split_tags(self.tags.as_ref())),
            size: clamp_size(self.size, default_size),
        }
    }
}

/// `GET /admin/issues/ids` query string.
#[derive(Debug, Default, Deserialize)]
pub struct IssueIdsQuery {
    pub status: Option<String>,
    pub severity: Option<String>,
    pub release: Option<String>,
    pub platform: Option<String>,
    pub build: Option<String>,
    pub target: Option<String>,
    #[serde(alias = "test_case_id")]
    pub test_case_ids: Option<String>,
    pub reporter_name: Option<String>,
    pub tags: Option<String>,
}

impl IssueIdsQuery {
    pub fn filter(&self) -> IssueFilter {
        filter_fields!(self, split_tags(self.tags.clone().map(TagInput::Csv).as_ref()))
    }
}

/// Bulk delete body.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub issue_ids: Vec<Uuid>,
}

/// Matching issue ids for bulk operations.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct IssueIdsResponse {
    pub issue_ids: Vec<Uuid>,
    pub total: u64,
}

/// Result of a bulk delete.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct BulkDeleteResponse {
    pub message: String,
    pub deleted_count: u64,
}
