//! Admin API handlers: user management, deletions and bulk operations.
//!
//! Every handler here requires an authenticated admin; the repository
//! operations re-check the role themselves.

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::user::UpdateUserRequest;
use crate::models::{
    BulkDeleteRequest, BulkDeleteResponse, IssueIdsQuery, IssueIdsResponse, IssueResponse,
    MessageResponse, UpdateIssueRequest, UserResponse,
};
use crate::services::storage::BlobStore;
use crate::services::uploads::remove_blobs;

/// List every user.
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "Admin",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
    ),
    security(("session" = []), ("admin_key" = []))
)]
pub async fn list_users(auth: CurrentUser, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.list_users(&auth.caller).await?))
}

/// Change a user's role or active flag.
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{user_id}",
    tag = "Admin",
    params(("user_id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []), ("admin_key" = []))
)]
pub async fn update_user(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let user = pool
        .update_user(&auth.caller, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Edit any issue field.
#[utoipa::path(
    put,
    path = "/api/v1/admin/issues/{issue_id}/edit",
    tag = "Admin",
    params(("issue_id" = Uuid, Path, description = "Issue id")),
    request_body = UpdateIssueRequest,
    responses(
        (status = 200, description = "Issue updated", body = IssueResponse),
        (status = 400, description = "Invalid fields", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "Issue not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []), ("admin_key" = []))
)]
pub async fn edit_issue(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateIssueRequest>,
) -> AppResult<HttpResponse> {
    auth.caller.require_admin()?;
    let changes = body.into_inner().validate()?;
    let issue = pool
        .update_issue(&auth.caller, path.into_inner(), changes)
        .await?;
    Ok(HttpResponse::Ok().json(issue))
}

/// Delete an issue with its comments, tags and attachments.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/issues/{issue_id}",
    tag = "Admin",
    params(("issue_id" = Uuid, Path, description = "Issue id")),
    responses(
        (status = 200, description = "Issue deleted", body = MessageResponse),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "Issue not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []), ("admin_key" = []))
)]
pub async fn delete_issue(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    store: web::Data<Arc<dyn BlobStore>>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let keys = pool.delete_issue(&auth.caller, id).await?;
    remove_blobs(store.get_ref(), &keys).await;
    Ok(HttpResponse::Ok().json(MessageResponse::new(format!("Issue {} deleted", id))))
}

/// Delete a comment and its attachments.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/comments/{comment_id}",
    tag = "Admin",
    params(("comment_id" = Uuid, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Comment deleted", body = MessageResponse),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "Comment not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []), ("admin_key" = []))
)]
pub async fn delete_comment(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    store: web::Data<Arc<dyn BlobStore>>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let keys = pool.delete_comment(&auth.caller, id).await?;
    remove_blobs(store.get_ref(), &keys).await;
    Ok(HttpResponse::Ok().json(MessageResponse::new(format!("Comment {} deleted", id))))
}

/// Ids of every issue matching the filters.
#[utoipa::path(
    get,
    path = "/api/v1/admin/issues/ids",
    tag = "Admin",
    params(
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
        (status = 200, description = "Matching ids", body = IssueIdsResponse),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
    ),
    security(("session" = []), ("admin_key" = []))
)]
pub async fn list_issue_ids(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    query: web::Query<IssueIdsQuery>,
) -> AppResult<HttpResponse> {
    let issue_ids = pool.list_issue_ids(&auth.caller, &query.filter()).await?;
    Ok(HttpResponse::Ok().json(IssueIdsResponse {
        total: issue_ids.len() as u64,
        issue_ids,
    }))
}

/// Delete a batch of issues atomically: all of them or none.
#[utoipa::path(
    post,
    path = "/api/v1/admin/issues/bulk-delete",
    tag = "Admin",
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Issues deleted", body = BulkDeleteResponse),
        (status = 400, description = "No ids given", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "Some ids do not exist; nothing deleted", body = crate::error::ErrorResponse),
        (status = 500, description = "Transaction failed; nothing deleted", body = crate::error::ErrorResponse),
    ),
    security(("session" = []), ("admin_key" = []))
)]
pub async fn bulk_delete(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    store: web::Data<Arc<dyn BlobStore>>,
    body: web::Json<BulkDeleteRequest>,
) -> AppResult<HttpResponse> {
    let (deleted_count, keys) = pool
        .bulk_delete_issues(&auth.caller, &body.issue_ids)
        .await?;
    remove_blobs(store.get_ref(), &keys).await;
    Ok(HttpResponse::Ok().json(BulkDeleteResponse {
        message: format!("Deleted {} issues", deleted_count),
        deleted_count,
    }))
}

/// Configure admin routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/admin/users").route(web::get().to(list_users)))
        .service(web::resource("/admin/users/{user_id}").route(web::put().to(update_user)))
        // Registered before /admin/issues/{issue_id} so "ids" is not taken as an id
        .service(web::resource("/admin/issues/ids").route(web::get().to(list_issue_ids)))
        .service(web::resource("/admin/issues/bulk-delete").route(web::post().to(bulk_delete)))
        .service(web::resource("/admin/issues/{issue_id}").route(web::delete().to(delete_issue)))
        .service(web::resource("/admin/issues/{issue_id}/edit").route(web::put().to(edit_issue)))
        .service(
            web::resource("/admin/comments/{comment_id}").route(web::delete().to(delete_comment)),
        );
}
