//! Comment repository, verified-solution selection and comment voting.

use chrono::Utc;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::entity::{attachment, comment, issue};
use crate::error::{AppError, AppResult};
use crate::models::{AttachmentResponse, Caller, CommentResponse, IssueStatus, NewComment, VoteDirection};
use crate::services::uploads::StagedBlob;

use super::DbPool;
use super::attachments::{blob_keys, insert_attachments};
use super::issues::find_issue;

async fn find_comment<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<comment::Model> {
    comment::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get comment: {}", e)))?
        .ok_or_else(|| AppError::NotFound(format!("Comment {}", id)))
}

async fn comment_response<C: ConnectionTrait>(
    db: &C,
    model: comment::Model,
) -> AppResult<CommentResponse> {
    let attachments = attachment::Entity::find()
        .filter(attachment::Column::CommentId.eq(model.id))
        .order_by_asc(attachment::Column::CreatedAt)
        .all(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load attachments: {}", e)))?
        .into_iter()
        .map(AttachmentResponse::from)
        .collect();
    Ok(CommentResponse::new(model, attachments))
}

impl DbPool {
    /// Comments on an issue, newest first, each with its attachments.
    pub async fn list_comments(&self, issue_id: Uuid) -> AppResult<Vec<CommentResponse>> {
        Ok(self.get_issue_detail(issue_id).await?.comments)
    }

    /// Add a comment (with staged attachments) and refresh the issue's `updated_at`.
    pub async fn create_comment(
        &self,
        caller: &Caller,
        issue_id: Uuid,
        new_comment: NewComment,
        staged: &[StagedBlob],
    ) -> AppResult<CommentResponse> {
        let _issue = self.locks.issue(issue_id).await;
        let txn = self.conn.begin().await?;

        find_issue(&txn, issue_id).await?;

        let now = Utc::now();
        let created = comment::ActiveModel {
            id: Set(Uuid::now_v7()),
            issue_id: Set(issue_id),
            commenter_name: Set(new_comment.commenter_name),
            content: Set(new_comment.content),
            is_verified_solution: Set(false),
            upvotes: Set(0),
            downvotes: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        issue::Entity::update_many()
            .col_expr(issue::Column::UpdatedAt, Expr::value(now))
            .filter(issue::Column::Id.eq(issue_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to touch issue: {}", e)))?;

        insert_attachments(&txn, issue_id, Some(created.id), &created.commenter_name, staged)
            .await?;

        let response = comment_response(&txn, created).await?;
        txn.commit()
            .await
            .map_err(|e| AppError::transaction("Failed to commit comment", e))?;

        info!(
            "Comment {} added to issue {} by {}",
            response.id, issue_id, caller.username
        );
        Ok(response)
    }

    /// Mark a comment as its issue's verified solution and resolve the issue.
    ///
    /// Every other comment on the issue loses the flag in the same transaction.
    /// Calls for the same issue serialize on the per-issue lock, and the issue
    /// row is locked for update inside the transaction.
    pub async fn verify_solution(
        &self,
        caller: &Caller,
        comment_id: Uuid,
    ) -> AppResult<CommentResponse> {
        let issue_id = find_comment(&self.conn, comment_id).await?.issue_id;

        let _issue = self.locks.issue(issue_id).await;
        let txn = self.conn.begin().await?;

        let target = find_comment(&txn, comment_id).await?;
        issue::Entity::find_by_id(target.issue_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to lock issue: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Issue {}", target.issue_id)))?;

        let now = Utc::now();
        comment::Entity::update_many()
            .col_expr(comment::Column::IsVerifiedSolution, Expr::value(false))
            .filter(comment::Column::IssueId.eq(target.issue_id))
            .filter(comment::Column::Id.ne(comment_id))
            .filter(comment::Column::IsVerifiedSolution.eq(true))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to clear verified solution: {}", e)))?;

        let mut active: comment::ActiveModel = target.into();
        active.is_verified_solution = Set(true);
        active.updated_at = Set(now);
        let verified = active.update(&txn).await?;

        issue::Entity::update_many()
            .col_expr(
                issue::Column::Status,
                Expr::value(IssueStatus::Resolved.as_str()),
            )
            .col_expr(issue::Column::UpdatedAt, Expr::value(now))
            .filter(issue::Column::Id.eq(verified.issue_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to resolve issue: {}", e)))?;

        let response = comment_response(&txn, verified).await?;
        txn.commit()
            .await
            .map_err(|e| AppError::transaction("Failed to commit verified solution", e))?;

        info!(
            "Comment {} verified as solution for issue {} by {}",
            comment_id, issue_id, caller.username
        );
        Ok(response)
    }

    /// Atomically bump one vote counter on a comment.
    pub async fn vote_comment(
        &self,
        caller: &Caller,
        id: Uuid,
        direction: VoteDirection,
    ) -> AppResult<CommentResponse> {
        let column = match direction {
            VoteDirection::Up => comment::Column::Upvotes,
            VoteDirection::Down => comment::Column::Downvotes,
        };

        let txn = self.conn.begin().await?;
        let result = comment::Entity::update_many()
            .col_expr(column, Expr::col(column).add(1))
            .col_expr(comment::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(comment::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to record vote: {}", e)))?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Comment {}", id)));
        }
        txn.commit()
            .await
            .map_err(|e| AppError::transaction("Failed to commit vote", e))?;

        debug!("Comment {} {:?}-voted by {}", id, direction, caller.username);
        let model = find_comment(&self.conn, id).await?;
        comment_response(&self.conn, model).await
    }

    /// Delete a comment and its attachments. Returns the blob keys to remove.
    ///
    /// The issue's status is left as it is, even when the comment was the
    /// verified solution.
    pub async fn delete_comment(&self, caller: &Caller, id: Uuid) -> AppResult<Vec<String>> {
        caller.require_admin()?;

        let issue_id = find_comment(&self.conn, id).await?.issue_id;
        let _issue = self.locks.issue(issue_id).await;
        let txn = self.conn.begin().await?;

        find_comment(&txn, id).await?;
        let keys = blob_keys(&txn, attachment::Column::CommentId, &[id]).await?;

        attachment::Entity::delete_many()
            .filter(attachment::Column::CommentId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::transaction("Failed to delete comment attachments", e))?;
        comment::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::transaction("Failed to delete comment", e))?;

        txn.commit()
            .await
            .map_err(|e| AppError::transaction("Failed to commit comment deletion", e))?;

        info!("Comment {} deleted by {}", id, caller.username);
        Ok(keys)
    }
}
