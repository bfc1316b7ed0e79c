//! Comment API handlers: threads, verified solutions and comment votes.

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, web};
use uuid::Uuid;

use super::body::read_submission;
use crate::auth::CurrentUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{CommentResponse, CreateCommentRequest, VoteDirection};
use crate::services::storage::BlobStore;
use crate::services::uploads::{discard_staged, stage_files};

/// List an issue's comments, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/issues/{issue_id}/comments",
    tag = "Comments",
    params(("issue_id" = Uuid, Path, description = "Issue id")),
    responses(
        (status = 200, description = "Comments", body = Vec<CommentResponse>),
        (status = 404, description = "Issue not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_comments(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let comments = pool.list_comments(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(comments))
}

/// Comment on an issue. Accepts JSON or `multipart/form-data` with files.
#[utoipa::path(
    post,
    path = "/api/v1/issues/{issue_id}/comments",
    tag = "Comments",
    params(("issue_id" = Uuid, Path, description = "Issue id")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Missing fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Issue not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn create_comment(
    auth: CurrentUser,
    req: HttpRequest,
    payload: web::Payload,
    path: web::Path<Uuid>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    store: web::Data<Arc<dyn BlobStore>>,
) -> AppResult<HttpResponse> {
    let (request, files) = read_submission(
        &req,
        payload,
        config.max_upload_size,
        CreateCommentRequest::from_form,
    )
    .await?;
    let new_comment = request.validate()?;
    let staged = stage_files(store.get_ref(), files).await?;

    match pool
        .create_comment(&auth.caller, path.into_inner(), new_comment, &staged)
        .await
    {
        Ok(comment) => Ok(HttpResponse::Created().json(comment)),
        Err(e) => {
            discard_staged(store.get_ref(), &staged).await;
            Err(e)
        }
    }
}

/// Mark a comment as the verified solution; the issue becomes `resolved`.
#[utoipa::path(
    post,
    path = "/api/v1/comments/{comment_id}/verify",
    tag = "Comments",
    params(("comment_id" = Uuid, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Comment verified", body = CommentResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Comment not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn verify_solution(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let comment = pool.verify_solution(&auth.caller, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(comment))
}

/// Upvote a comment.
#[utoipa::path(
    post,
    path = "/api/v1/comments/{comment_id}/upvote",
    tag = "Comments",
    params(("comment_id" = Uuid, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Vote recorded", body = CommentResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Comment not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn upvote_comment(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let comment = pool
        .vote_comment(&auth.caller, path.into_inner(), VoteDirection::Up)
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

/// Downvote a comment.
#[utoipa::path(
    post,
    path = "/api/v1/comments/{comment_id}/downvote",
    tag = "Comments",
    params(("comment_id" = Uuid, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Vote recorded", body = CommentResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Comment not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn downvote_comment(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let comment = pool
        .vote_comment(&auth.caller, path.into_inner(), VoteDirection::Down)
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

/// Configure comment routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/issues/{issue_id}/comments")
            .route(web::get().to(list_comments))
            .route(web::post().to(create_comment)),
    )
    .service(web::resource("/comments/{comment_id}/verify").route(web::post().to(verify_solution)))
    .service(web::resource("/comments/{comment_id}/upvote").route(web::post().to(upvote_comment)))
    .service(
        web::resource("/comments/{comment_id}/downvote").route(web::post().to(downvote_comment)),
    );
}
