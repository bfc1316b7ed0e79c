//! Issue API handlers.

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, web};
use uuid::Uuid;

use super::body::read_submission;
use crate::auth::CurrentUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{
    CreateIssueRequest, IssueDetailResponse, IssueListResponse, IssueResponse, ListIssuesQuery,
    MoveToCcrRequest, UpdateIssueRequest, VoteDirection,
};
use crate::services::storage::BlobStore;
use crate::services::uploads::{discard_staged, stage_files};

/// List issues, newest first, one page at a time.
#[utoipa::path(
    get,
    path = "/api/v1/issues",
    tag = "Issues",
    params(
        ("page" = Option<u64>, Query, description = "Page number, 1-based (default 1)"),
        ("per_page" = Option<u64>, Query, description = "Issues per page (default 10, max 100)"),
        ("status" = Option<String>, Query, description = "Exact status"),
        ("severity" = Option<String>, Query, description = "Exact severity"),
        ("release" = Option<String>, Query, description = "Exact release"),
        ("platform" = Option<String>, Query, description = "Exact platform code"),
        ("build" = Option<String>, Query, description = "Exact build cadence"),
        ("target" = Option<String>, Query, description = "Exact target"),
        ("test_case_ids" = Option<String>, Query, description = "Exact test case identifier"),
        ("reporter_name" = Option<String>, Query, description = "Exact reporter"),
        ("tags" = Option<String>, Query, description = "Comma-separated tags (accepted, not applied)"),
    ),
    responses(
        (status = 200, description = "Page of issues", body = IssueListResponse),
        (status = 400, description = "Invalid query", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_issues(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<ListIssuesQuery>,
) -> AppResult<HttpResponse> {
    let per_page = query.per_page(config.query.default_page_size);
    let response = pool
        .list_issues(&query.filter(), query.page(), per_page)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

/// File a new issue.
///
/// Accepts JSON or `multipart/form-data`; in a multipart request every file
/// part becomes an issue attachment.
#[utoipa::path(
    post,
    path = "/api/v1/issues",
    tag = "Issues",
    request_body = CreateIssueRequest,
    responses(
        (status = 201, description = "Issue created", body = IssueResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 409, description = "Conflicting tag or identifier", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn create_issue(
    auth: CurrentUser,
    req: HttpRequest,
    payload: web::Payload,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    store: web::Data<Arc<dyn BlobStore>>,
) -> AppResult<HttpResponse> {
    let (request, files) = read_submission(
        &req,
        payload,
        config.max_upload_size,
        CreateIssueRequest::from_form,
    )
    .await?;
    let new_issue = request.validate()?;

    // Blobs go to the store before any lock is taken
    let staged = stage_files(store.get_ref(), files).await?;

    match pool.create_issue(&auth.caller, new_issue, &staged).await {
        Ok(issue) => Ok(HttpResponse::Created().json(issue)),
        Err(e) => {
            discard_staged(store.get_ref(), &staged).await;
            Err(e)
        }
    }
}

/// Get one issue with its comments and attachments.
#[utoipa::path(
    get,
    path = "/api/v1/issues/{issue_id}",
    tag = "Issues",
    params(("issue_id" = Uuid, Path, description = "Issue id")),
    responses(
        (status = 200, description = "Issue detail", body = IssueDetailResponse),
        (status = 404, description = "Issue not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_issue(pool: web::Data<DbPool>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let issue = pool.get_issue_detail(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(issue))
}

/// Partially update an issue.
///
/// Keys missing from the body are left unchanged; `null` clears a nullable
/// field. Changing anything other than build, target, additional_comments,
/// reporter_name or tags requires an admin.
#[utoipa::path(
    put,
    path = "/api/v1/issues/{issue_id}",
    tag = "Issues",
    params(("issue_id" = Uuid, Path, description = "Issue id")),
    request_body = UpdateIssueRequest,
    responses(
        (status = 200, description = "Issue updated", body = IssueResponse),
        (status = 400, description = "Invalid fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin-only field", body = crate::error::ErrorResponse),
        (status = 404, description = "Issue not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn update_issue(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateIssueRequest>,
) -> AppResult<HttpResponse> {
    let changes = body.into_inner().validate()?;
    let issue = pool
        .update_issue(&auth.caller, path.into_inner(), changes)
        .await?;
    Ok(HttpResponse::Ok().json(issue))
}

/// Move an issue to the `ccr` status with a change-request number.
#[utoipa::path(
    post,
    path = "/api/v1/issues/{issue_id}/move-to-ccr",
    tag = "Issues",
    params(("issue_id" = Uuid, Path, description = "Issue id")),
    request_body = MoveToCcrRequest,
    responses(
        (status = 200, description = "Issue moved to CCR", body = IssueResponse),
        (status = 400, description = "ccr_number missing", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Issue not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn move_to_ccr(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<MoveToCcrRequest>,
) -> AppResult<HttpResponse> {
    let ccr_number = body.into_inner().validate()?;
    let issue = pool
        .move_to_ccr(&auth.caller, path.into_inner(), ccr_number)
        .await?;
    Ok(HttpResponse::Ok().json(issue))
}

/// Upvote an issue.
#[utoipa::path(
    post,
    path = "/api/v1/issues/{issue_id}/upvote",
    tag = "Issues",
    params(("issue_id" = Uuid, Path, description = "Issue id")),
    responses(
        (status = 200, description = "Vote recorded", body = IssueResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Issue not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn upvote_issue(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let issue = pool
        .vote_issue(&auth.caller, path.into_inner(), VoteDirection::Up)
        .await?;
    Ok(HttpResponse::Ok().json(issue))
}

/// Downvote an issue.
#[utoipa::path(
    post,
    path = "/api/v1/issues/{issue_id}/downvote",
    tag = "Issues",
    params(("issue_id" = Uuid, Path, description = "Issue id")),
    responses(
        (status = 200, description = "Vote recorded", body = IssueResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Issue not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn downvote_issue(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let issue = pool
        .vote_issue(&auth.caller, path.into_inner(), VoteDirection::Down)
        .await?;
    Ok(HttpResponse::Ok().json(issue))
}

/// Configure issue routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/issues")
            .route(web::get().to(list_issues))
            .route(web::post().to(create_issue)),
    )
    .service(
        web::resource("/issues/{issue_id}")
            .route(web::get().to(get_issue))
            .route(web::put().to(update_issue)),
    )
    .service(web::resource("/issues/{issue_id}/move-to-ccr").route(web::post().to(move_to_ccr)))
    .service(web::resource("/issues/{issue_id}/upvote").route(web::post().to(upvote_issue)))
    .service(web::resource("/issues/{issue_id}/downvote").route(web::post().to(downvote_issue)));
}
