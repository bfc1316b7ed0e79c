//! Issue repository: creation, retrieval, partial updates, deletion,
//! filtered listing and search, CCR transitions and voting.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::entity::{attachment, comment, issue, issue_tag};
use crate::error::{AppError, AppResult};
use crate::models::issue::IssueSummaryExtras;
use crate::models::{
    Caller, CommentResponse, IssueChanges, IssueDetailResponse, IssueFilter, IssueListResponse,
    IssueResponse, IssueStatus, NewIssue, Pagination, Patch, SearchResponse, SearchSpec,
    VoteDirection,
};
use crate::services::path_parser::parse_testcase_path;
use crate::services::uploads::StagedBlob;

use super::DbPool;
use super::attachments::{attachments_for_issue, blob_keys, group_by_comment, insert_attachments};
use super::filters::{filter_condition, search_condition};
use super::tags::{replace_issue_tags, tag_names_by_issue};

/// Load an issue row or fail with `NotFound`.
pub(crate) async fn find_issue<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<issue::Model> {
    issue::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get issue: {}", e)))?
        .ok_or_else(|| AppError::NotFound(format!("Issue {}", id)))
}

/// Tags, comment counts and verified-solution flags for a set of issues.
async fn load_extras<C: ConnectionTrait>(
    db: &C,
    issues: &[issue::Model],
) -> AppResult<HashMap<Uuid, IssueSummaryExtras>> {
    let ids: Vec<Uuid> = issues.iter().map(|i| i.id).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut tags = tag_names_by_issue(db, &ids).await?;

    let comment_flags: Vec<(Uuid, bool)> = comment::Entity::find()
        .select_only()
        .column(comment::Column::IssueId)
        .column(comment::Column::IsVerifiedSolution)
        .filter(comment::Column::IssueId.is_in(ids.iter().copied()))
        .into_tuple()
        .all(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load comment counts: {}", e)))?;

    let mut extras: HashMap<Uuid, IssueSummaryExtras> = ids
        .iter()
        .map(|id| {
            (
                *id,
                IssueSummaryExtras {
                    tags: tags.remove(id).unwrap_or_default(),
                    ..Default::default()
                },
            )
        })
        .collect();

    for (issue_id, verified) in comment_flags {
        if let Some(entry) = extras.get_mut(&issue_id) {
            entry.comment_count += 1;
            entry.has_verified_solution |= verified;
        }
    }

    Ok(extras)
}

/// Render issue rows with their aggregates, preserving order.
async fn to_responses<C: ConnectionTrait>(
    db: &C,
    issues: Vec<issue::Model>,
) -> AppResult<Vec<IssueResponse>> {
    let mut extras = load_extras(db, &issues).await?;
    Ok(issues
        .into_iter()
        .map(|m| {
            let e = extras.remove(&m.id).unwrap_or_default();
            IssueResponse::new(m, e)
        })
        .collect())
}

/// Allocate a test case identifier not contained in any stored one.
///
/// Must run under the creation lock.
async fn allocate_test_case_id<C: ConnectionTrait>(db: &C, pool: &DbPool) -> AppResult<String> {
    loop {
        let candidate = pool.ids.candidate(Utc::now().date_naive());
        let taken = issue::Entity::find()
            .filter(issue::Column::TestCaseIds.contains(&candidate))
            .count(db)
            .await
            .map_err(|e| AppError::Database(format!("Failed to check identifier: {}", e)))?;
        if taken == 0 {
            return Ok(candidate);
        }
        debug!("Identifier {} already in use, drawing again", candidate);
    }
}

/// Delete issues and every row they own. Returns the number of issues removed.
async fn delete_issue_rows<C: ConnectionTrait>(db: &C, ids: &[Uuid]) -> Result<u64, DbErr> {
    let ids = ids.iter().copied();

    attachment::Entity::delete_many()
        .filter(attachment::Column::IssueId.is_in(ids.clone()))
        .exec(db)
        .await?;
    comment::Entity::delete_many()
        .filter(comment::Column::IssueId.is_in(ids.clone()))
        .exec(db)
        .await?;
    issue_tag::Entity::delete_many()
        .filter(issue_tag::Column::IssueId.is_in(ids.clone()))
        .exec(db)
        .await?;
    let result = issue::Entity::delete_many()
        .filter(issue::Column::Id.is_in(ids))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

fn apply_nullable(target: &mut ActiveValue<Option<String>>, patch: Patch<String>) {
    match patch {
        Patch::Absent => {}
        Patch::Null => *target = Set(None),
        Patch::Value(v) => *target = Set(Some(v)),
    }
}

fn newest_first(filter: Condition) -> sea_orm::Select<issue::Entity> {
    issue::Entity::find()
        .filter(filter)
        .order_by_desc(issue::Column::CreatedAt)
        .order_by_desc(issue::Column::Id)
}

impl DbPool {
    /// Create an issue with a fresh identifier, derived release/platform,
    /// its tags and any staged attachments.
    pub async fn create_issue(
        &self,
        caller: &Caller,
        new_issue: NewIssue,
        staged: &[StagedBlob],
    ) -> AppResult<IssueResponse> {
        let tokens = parse_testcase_path(&new_issue.testcase_path);

        let _creation = self.locks.creation().await;
        let _tags = if new_issue.tags.is_empty() {
            None
        } else {
            Some(self.locks.tags().await)
        };

        let txn = self.conn.begin().await?;

        let test_case_ids = allocate_test_case_id(&txn, self).await?;
        let now = Utc::now();
        let model = issue::ActiveModel {
            id: Set(Uuid::now_v7()),
            testcase_title: Set(new_issue.testcase_title),
            testcase_path: Set(new_issue.testcase_path),
            severity: Set(new_issue.severity.as_str().to_string()),
            test_case_ids: Set(test_case_ids),
            release: Set(tokens.release),
            platform: Set(tokens.platform),
            build: Set(new_issue.build),
            target: Set(new_issue.target),
            description: Set(new_issue.description),
            additional_comments: Set(new_issue.additional_comments),
            reporter_name: Set(new_issue.reporter_name),
            status: Set(IssueStatus::Open.as_str().to_string()),
            ccr_number: Set(None),
            upvotes: Set(0),
            downvotes: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&txn).await?;

        replace_issue_tags(&txn, created.id, &new_issue.tags).await?;
        insert_attachments(&txn, created.id, None, &created.reporter_name, staged).await?;

        let response = to_responses(&txn, vec![created]).await?.pop();

        txn.commit()
            .await
            .map_err(|e| AppError::transaction("Failed to commit issue creation", e))?;

        let response = response.ok_or_else(|| AppError::Database("Created issue vanished".into()))?;
        info!(
            "Issue {} ({}) created by {}",
            response.id, response.test_case_ids, caller.username
        );
        Ok(response)
    }

    /// One issue with aggregates.
    pub async fn get_issue(&self, id: Uuid) -> AppResult<IssueResponse> {
        let issue = find_issue(&self.conn, id).await?;
        to_responses(&self.conn, vec![issue])
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("Issue {}", id)))
    }

    /// Issue with its comments (newest first) and issue-level attachments.
    pub async fn get_issue_detail(&self, id: Uuid) -> AppResult<IssueDetailResponse> {
        let issue = self.get_issue(id).await?;

        let comments = comment::Entity::find()
            .filter(comment::Column::IssueId.eq(id))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .all(&self.conn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to load comments: {}", e)))?;

        let (attachments, mut by_comment) =
            group_by_comment(attachments_for_issue(&self.conn, id).await?);

        let comments = comments
            .into_iter()
            .map(|c| {
                let files = by_comment.remove(&c.id).unwrap_or_default();
                CommentResponse::new(c, files)
            })
            .collect();

        Ok(IssueDetailResponse {
            issue,
            comments,
            attachments,
        })
    }

    /// Apply a partial update. Fields outside the reporter-editable set need an admin.
    pub async fn update_issue(
        &self,
        caller: &Caller,
        id: Uuid,
        changes: IssueChanges,
    ) -> AppResult<IssueResponse> {
        if changes.touches_admin_fields() {
            caller.require_admin()?;
        }

        let _issue = self.locks.issue(id).await;
        let _tags = match changes.tags {
            Some(_) => Some(self.locks.tags().await),
            None => None,
        };

        let txn = self.conn.begin().await?;

        let existing = find_issue(&txn, id).await?;
        let mut active: issue::ActiveModel = existing.into();

        if let Some(title) = changes.testcase_title {
            active.testcase_title = Set(title);
        }
        if let Some(path) = changes.testcase_path {
            let tokens = parse_testcase_path(&path);
            active.testcase_path = Set(path);
            active.release = Set(tokens.release);
            active.platform = Set(tokens.platform);
        }
        if let Some(severity) = changes.severity {
            active.severity = Set(severity.as_str().to_string());
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(reporter) = changes.reporter_name {
            active.reporter_name = Set(reporter);
        }
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().to_string());
        }
        apply_nullable(&mut active.build, changes.build);
        apply_nullable(&mut active.target, changes.target);
        apply_nullable(&mut active.additional_comments, changes.additional_comments);
        apply_nullable(&mut active.ccr_number, changes.ccr_number);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&txn).await?;

        if let Some(tags) = &changes.tags {
            replace_issue_tags(&txn, id, tags).await?;
        }

        let response = to_responses(&txn, vec![updated]).await?.pop();

        txn.commit()
            .await
            .map_err(|e| AppError::transaction("Failed to commit issue update", e))?;

        info!("Issue {} updated by {}", id, caller.username);
        response.ok_or_else(|| AppError::NotFound(format!("Issue {}", id)))
    }

    /// Delete an issue and everything it owns. Returns the blob keys to remove.
    pub async fn delete_issue(&self, caller: &Caller, id: Uuid) -> AppResult<Vec<String>> {
        caller.require_admin()?;

        let _issue = self.locks.issue(id).await;
        let txn = self.conn.begin().await?;

        find_issue(&txn, id).await?;
        let keys = blob_keys(&txn, attachment::Column::IssueId, &[id]).await?;
        delete_issue_rows(&txn, &[id])
            .await
            .map_err(|e| AppError::transaction("Failed to delete issue", e))?;

        txn.commit()
            .await
            .map_err(|e| AppError::transaction("Failed to commit issue deletion", e))?;

        info!("Issue {} deleted by {}", id, caller.username);
        Ok(keys)
    }

    /// One page of issues matching `filter`, newest first.
    pub async fn list_issues(
        &self,
        filter: &IssueFilter,
        page: u64,
        per_page: u64,
    ) -> AppResult<IssueListResponse> {
        let total = issue::Entity::find()
            .filter(filter_condition(filter))
            .count(&self.conn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to count issues: {}", e)))?;
        let pagination = Pagination::new(page, per_page, total);

        let rows = newest_first(filter_condition(filter))
            .offset(pagination.offset())
            .limit(per_page)
            .all(&self.conn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list issues: {}", e)))?;

        Ok(IssueListResponse {
            issues: to_responses(&self.conn, rows).await?,
            total,
            pages: pagination.pages,
            current_page: pagination.page,
            per_page: pagination.per_page,
        })
    }

    /// Free text plus structured filters, newest first, at most `spec.size` results.
    pub async fn search_issues(&self, spec: &SearchSpec) -> AppResult<SearchResponse> {
        let rows = newest_first(search_condition(&spec.filter, spec.text.as_deref()))
            .limit(spec.size)
            .all(&self.conn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to search issues: {}", e)))?;

        let issues = to_responses(&self.conn, rows).await?;
        Ok(SearchResponse {
            total: issues.len() as u64,
            issues,
        })
    }

    /// Every issue id matching `filter`, newest first.
    pub async fn list_issue_ids(&self, caller: &Caller, filter: &IssueFilter) -> AppResult<Vec<Uuid>> {
        caller.require_admin()?;

        newest_first(filter_condition(filter))
            .select_only()
            .column(issue::Column::Id)
            .into_tuple::<Uuid>()
            .all(&self.conn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list issue ids: {}", e)))
    }

    /// Delete every listed issue in one transaction, or none of them.
    ///
    /// Returns the number of issues deleted and the blob keys to remove.
    pub async fn bulk_delete_issues(
        &self,
        caller: &Caller,
        ids: &[Uuid],
    ) -> AppResult<(u64, Vec<String>)> {
        caller.require_admin()?;

        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Err(AppError::Validation("No issue IDs provided".to_string()));
        }

        let _guards = self.locks.issues(&ids).await;
        let txn = self.conn.begin().await?;

        let found: Vec<Uuid> = issue::Entity::find()
            .select_only()
            .column(issue::Column::Id)
            .filter(issue::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to look up issues: {}", e)))?;
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(Uuid::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::NotFound(format!("Issues {}", missing.join(", "))));
        }

        let keys = blob_keys(&txn, attachment::Column::IssueId, &ids).await?;
        let deleted = delete_issue_rows(&txn, &ids)
            .await
            .map_err(|e| AppError::transaction("Bulk delete failed", e))?;
        if deleted != ids.len() as u64 {
            return Err(AppError::Transaction(format!(
                "Bulk delete removed {} of {} issues",
                deleted,
                ids.len()
            )));
        }

        txn.commit()
            .await
            .map_err(|e| AppError::transaction("Failed to commit bulk delete", e))?;

        info!("Bulk deleted {} issues by {}", deleted, caller.username);
        Ok((deleted, keys))
    }

    /// Move an issue to `ccr` with the given change-request number.
    pub async fn move_to_ccr(
        &self,
        caller: &Caller,
        id: Uuid,
        ccr_number: String,
    ) -> AppResult<IssueResponse> {
        if ccr_number.trim().is_empty() {
            return Err(AppError::Validation("ccr_number is required".to_string()));
        }

        let _issue = self.locks.issue(id).await;
        let txn = self.conn.begin().await?;

        let mut active: issue::ActiveModel = find_issue(&txn, id).await?.into();
        active.status = Set(IssueStatus::Ccr.as_str().to_string());
        active.ccr_number = Set(Some(ccr_number.clone()));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        let response = to_responses(&txn, vec![updated]).await?.pop();
        txn.commit()
            .await
            .map_err(|e| AppError::transaction("Failed to commit CCR transition", e))?;

        info!("Issue {} moved to CCR {} by {}", id, ccr_number, caller.username);
        response.ok_or_else(|| AppError::NotFound(format!("Issue {}", id)))
    }

    /// Atomically bump one vote counter on an issue.
    pub async fn vote_issue(
        &self,
        caller: &Caller,
        id: Uuid,
        direction: VoteDirection,
    ) -> AppResult<IssueResponse> {
        let column = match direction {
            VoteDirection::Up => issue::Column::Upvotes,
            VoteDirection::Down => issue::Column::Downvotes,
        };

        let txn = self.conn.begin().await?;
        let result = issue::Entity::update_many()
            .col_expr(column, Expr::col(column).add(1))
            .col_expr(issue::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(issue::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to record vote: {}", e)))?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Issue {}", id)));
        }
        txn.commit()
            .await
            .map_err(|e| AppError::transaction("Failed to commit vote", e))?;

        debug!("Issue {} {:?}-voted by {}", id, direction, caller.username);
        self.get_issue(id).await
    }
}
