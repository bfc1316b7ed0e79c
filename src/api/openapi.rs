//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::config::{ADMIN_KEY_HEADER, SESSION_COOKIE};
use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Triage Board Server",
        version = "0.3.0",
        description = "Issue triage for automated test-case failures: issues, threaded comments, votes and verified solutions"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Auth endpoints
        api::auth::register,
        api::auth::login,
        api::auth::logout,
        api::auth::me,
        // Issue endpoints
        api::issues::list_issues,
        api::issues::create_issue,
        api::issues::get_issue,
        api::issues::update_issue,
        api::issues::move_to_ccr,
        api::issues::upvote_issue,
        api::issues::downvote_issue,
        // Comment endpoints
        api::comments::list_comments,
        api::comments::create_comment,
        api::comments::verify_solution,
        api::comments::upvote_comment,
        api::comments::downvote_comment,
        // Search endpoints
        api::search::search_get,
        api::search::search_post,
        // Attachments
        api::attachments::download_attachment,
        // Catalog endpoints
        api::catalog::list_tags,
        api::catalog::list_releases,
        api::catalog::list_platforms,
        api::catalog::list_builds,
        api::catalog::list_targets,
        // Admin endpoints
        api::admin::list_users,
        api::admin::update_user,
        api::admin::edit_issue,
        api::admin::delete_issue,
        api::admin::delete_comment,
        api::admin::list_issue_ids,
        api::admin::bulk_delete,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            models::MessageResponse,
            models::Pagination,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Auth
            models::Role,
            models::UserResponse,
            models::user::RegisterRequest,
            models::user::LoginRequest,
            models::user::UpdateUserRequest,
            api::auth::LoginResponse,
            api::auth::MeResponse,
            // Issues
            models::Severity,
            models::IssueStatus,
            models::CreateIssueRequest,
            models::UpdateIssueRequest,
            models::MoveToCcrRequest,
            models::IssueResponse,
            models::IssueDetailResponse,
            models::IssueListResponse,
            // Comments and attachments
            models::CreateCommentRequest,
            models::CommentResponse,
            models::AttachmentResponse,
            // Search and bulk
            models::SearchRequest,
            models::SearchResponse,
            models::IssueIdsResponse,
            models::BulkDeleteRequest,
            models::BulkDeleteResponse,
            // Catalog
            models::TagInput,
            models::TagResponse,
            api::catalog::PlatformResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Registration, login and sessions"),
        (name = "Issues", description = "Issue filing, editing, CCR transitions and votes"),
        (name = "Comments", description = "Comment threads, verified solutions and votes"),
        (name = "Search", description = "Substring and filter search"),
        (name = "Attachments", description = "Attachment downloads"),
        (name = "Catalog", description = "Lookup lists for filing and filtering"),
        (name = "Admin", description = "User management, deletion and bulk operations")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add session cookie and admin key security schemes.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Cookie(
                        utoipa::openapi::security::ApiKeyValue::new(SESSION_COOKIE),
                    ),
                ),
            );
            components.add_security_scheme(
                "admin_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new(ADMIN_KEY_HEADER),
                    ),
                ),
            );
        }
    }
}
