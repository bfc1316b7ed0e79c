//! Issue domain types and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::issue;
use crate::error::{AppError, AppResult};
use crate::models::attachment::AttachmentResponse;
use crate::models::comment::CommentResponse;
use crate::models::patch::Patch;
use crate::models::tag::TagInput;
use crate::services::catalog::platform_display;
use crate::services::tags::normalize_tag_names;
use crate::services::uploads::MultipartForm;

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// Parse case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    fn parse_field(s: &str) -> AppResult<Self> {
        Self::parse(s).ok_or_else(|| {
            AppError::Validation(
                "severity must be one of Low, Medium, High, Critical".to_string(),
            )
        })
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issue lifecycle status.
///
/// Any status may move to any other; `resolved` is also reached through a
/// verified solution and `ccr` through the CCR transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
    Ccr,
    Closed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Ccr => "ccr",
            Self::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "in_progress" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            "ccr" => Some(Self::Ccr),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    fn parse_field(s: &str) -> AppResult<Self> {
        Self::parse(s).ok_or_else(|| {
            AppError::Validation(
                "status must be one of open, in_progress, resolved, ccr, closed".to_string(),
            )
        })
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which vote counter to bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

/// Issue creation payload. Every field is optional on the wire so that all
/// missing required fields can be reported at once.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateIssueRequest {
    pub testcase_title: Option<String>,
    pub testcase_path: Option<String>,
    /// Low, Medium, High or Critical
    pub severity: Option<String>,
    pub description: Option<String>,
    pub reporter_name: Option<String>,
    pub build: Option<String>,
    pub target: Option<String>,
    pub additional_comments: Option<String>,
    #[schema(value_type = Option<Vec<String>>)]
    pub tags: Option<TagInput>,
}

/// Validated issue input.
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub testcase_title: String,
    pub testcase_path: String,
    pub severity: Severity,
    pub description: String,
    pub reporter_name: String,
    pub build: Option<String>,
    pub target: Option<String>,
    pub additional_comments: Option<String>,
    /// Normalized tag names
    pub tags: Vec<String>,
}

const REQUIRED_ISSUE_FIELDS: [&str; 5] = [
    "testcase_title",
    "testcase_path",
    "severity",
    "description",
    "reporter_name",
];

impl CreateIssueRequest {
    /// Read the text fields of a multipart issue form.
    ///
    /// Repeated `tags` parts form a list; a single part is comma-separated.
    pub fn from_form(form: &MultipartForm) -> Self {
        let tags = match form.all("tags") {
            [] => None,
            [single] => Some(TagInput::Csv(single.clone())),
            many => Some(TagInput::List(many.to_vec())),
        };
        Self {
            testcase_title: form.text("testcase_title"),
            testcase_path: form.text("testcase_path"),
            severity: form.text("severity"),
            description: form.text("description"),
            reporter_name: form.text("reporter_name"),
            build: form.text("build"),
            target: form.text("target"),
            additional_comments: form.text("additional_comments"),
            tags,
        }
    }

    pub fn validate(self) -> AppResult<NewIssue> {
        let values = [
            &self.testcase_title,
            &self.testcase_path,
            &self.severity,
            &self.description,
            &self.reporter_name,
        ];
        let missing: Vec<&str> = REQUIRED_ISSUE_FIELDS
            .iter()
            .zip(values)
            .filter(|(_, v)| v.as_deref().is_none_or(|s| s.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required field(s): {}",
                missing.join(", ")
            )));
        }

        let severity = Severity::parse_field(self.severity.as_deref().unwrap_or_default())?;
        let tags = match self.tags {
            Some(ref input) => normalize_tag_names(input)?,
            None => Vec::new(),
        };

        Ok(NewIssue {
            testcase_title: self.testcase_title.unwrap_or_default(),
            testcase_path: self.testcase_path.unwrap_or_default(),
            severity,
            description: self.description.unwrap_or_default(),
            reporter_name: self.reporter_name.unwrap_or_default(),
            build: non_blank(self.build),
            target: non_blank(self.target),
            additional_comments: non_blank(self.additional_comments),
            tags,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Partial issue update. A missing key leaves the field untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateIssueRequest {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub testcase_title: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub testcase_path: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub severity: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub description: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub reporter_name: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub status: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub build: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub target: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub additional_comments: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub ccr_number: Patch<String>,
    /// `null` detaches every tag
    #[serde(default)]
    #[schema(value_type = Option<Vec<String>>)]
    pub tags: Patch<TagInput>,
    /// Immutable; present only so that attempts to change it are rejected
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub test_case_ids: Patch<serde_json::Value>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub release: Patch<serde_json::Value>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub platform: Patch<serde_json::Value>,
}

/// Validated issue changes.
///
/// Non-nullable columns are `Option` (None = unchanged); nullable ones keep the
/// tri-state `Patch`.
#[derive(Debug, Clone, Default)]
pub struct IssueChanges {
    pub testcase_title: Option<String>,
    pub testcase_path: Option<String>,
    pub severity: Option<Severity>,
    pub description: Option<String>,
    pub reporter_name: Option<String>,
    pub status: Option<IssueStatus>,
    pub build: Patch<String>,
    pub target: Patch<String>,
    pub additional_comments: Patch<String>,
    pub ccr_number: Patch<String>,
    /// Full replacement set when present (empty = detach all)
    pub tags: Option<Vec<String>>,
}

impl UpdateIssueRequest {
    pub fn validate(self) -> AppResult<IssueChanges> {
        if !self.test_case_ids.is_absent() {
            return Err(AppError::Validation(
                "test_case_ids cannot be changed after creation".to_string(),
            ));
        }
        if !self.release.is_absent() || !self.platform.is_absent() {
            return Err(AppError::Validation(
                "release and platform are derived from testcase_path".to_string(),
            ));
        }

        let severity = match self.severity.required_text("severity")? {
            Some(s) => Some(Severity::parse_field(&s)?),
            None => None,
        };
        let status = match self.status.required_text("status")? {
            Some(s) => Some(IssueStatus::parse_field(&s)?),
            None => None,
        };
        let tags = match self.tags {
            Patch::Absent => None,
            Patch::Null => Some(Vec::new()),
            Patch::Value(input) => Some(normalize_tag_names(&input)?),
        };

        Ok(IssueChanges {
            testcase_title: self.testcase_title.required_text("testcase_title")?,
            testcase_path: self.testcase_path.required_text("testcase_path")?,
            severity,
            description: self.description.required_text("description")?,
            reporter_name: self.reporter_name.required_text("reporter_name")?,
            status,
            build: self.build.blank_as_null(),
            target: self.target.blank_as_null(),
            additional_comments: self.additional_comments.blank_as_null(),
            ccr_number: self.ccr_number.blank_as_null(),
            tags,
        })
    }
}

impl IssueChanges {
    /// Whether any field outside the reporter-editable set is touched.
    pub fn touches_admin_fields(&self) -> bool {
        self.testcase_title.is_some()
            || self.testcase_path.is_some()
            || self.severity.is_some()
            || self.description.is_some()
            || self.status.is_some()
            || !self.ccr_number.is_absent()
    }
}

/// CCR transition payload.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MoveToCcrRequest {
    pub ccr_number: Option<String>,
}

impl MoveToCcrRequest {
    pub fn validate(self) -> AppResult<String> {
        match self.ccr_number {
            Some(n) if !n.trim().is_empty() => Ok(n.trim().to_string()),
            _ => Err(AppError::Validation("ccr_number is required".to_string())),
        }
    }
}

/// Issue as returned by list, search and mutation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssueResponse {
    pub id: Uuid,
    pub testcase_title: String,
    pub testcase_path: String,
    pub severity: String,
    pub test_case_ids: String,
    pub release: Option<String>,
    pub platform: Option<String>,
    pub platform_display: Option<String>,
    pub build: Option<String>,
    pub target: Option<String>,
    pub description: String,
    pub additional_comments: Option<String>,
    pub reporter_name: String,
    pub status: String,
    pub ccr_number: Option<String>,
    pub upvotes: i32,
    pub downvotes: i32,
    /// `upvotes - downvotes`
    pub score: i32,
    pub tags: Vec<String>,
    pub comment_count: u64,
    pub has_verified_solution: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-issue aggregates loaded alongside the row.
#[derive(Debug, Clone, Default)]
pub struct IssueSummaryExtras {
    pub tags: Vec<String>,
    pub comment_count: u64,
    pub has_verified_solution: bool,
}

impl IssueResponse {
    pub fn new(m: issue::Model, extras: IssueSummaryExtras) -> Self {
        Self {
            platform_display: m.platform.as_deref().map(|p| platform_display(p).to_string()),
            score: m.upvotes - m.downvotes,
            id: m.id,
            testcase_title: m.testcase_title,
            testcase_path: m.testcase_path,
            severity: m.severity,
            test_case_ids: m.test_case_ids,
            release: m.release,
            platform: m.platform,
            build: m.build,
            target: m.target,
            description: m.description,
            additional_comments: m.additional_comments,
            reporter_name: m.reporter_name,
            status: m.status,
            ccr_number: m.ccr_number,
            upvotes: m.upvotes,
            downvotes: m.downvotes,
            tags: extras.tags,
            comment_count: extras.comment_count,
            has_verified_solution: extras.has_verified_solution,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Full issue view: comments newest-first and issue-level attachments.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssueDetailResponse {
    #[serde(flatten)]
    pub issue: IssueResponse,
    pub comments: Vec<CommentResponse>,
    pub attachments: Vec<AttachmentResponse>,
}

/// Paginated issue listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssueListResponse {
    pub issues: Vec<IssueResponse>,
    pub total: u64,
    pub pages: u64,
    pub current_page: u64,
    pub per_page: u64,
}

/// Search results, capped at the requested size.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub issues: Vec<IssueResponse>,
    /// Number of issues returned
    pub total: u64,
}
