//! Tag resolution and issue-tag associations.
//!
//! Callers hold the tag lock from [`super::locks::WriteLocks::tags`] while
//! resolving names, so two requests in this process never both create the
//! same tag. A duplicate created by another process trips the unique index
//! on `tags.name` and surfaces as a conflict.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::entity::{issue_tag, tag};
use crate::error::{AppError, AppResult};
use crate::models::TagResponse;

use super::DbPool;

/// Look up tags by exact name, creating the missing ones. Returned in input order.
pub async fn resolve_tags<C: ConnectionTrait>(db: &C, names: &[String]) -> AppResult<Vec<tag::Model>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let mut existing: HashMap<String, tag::Model> = tag::Entity::find()
        .filter(tag::Column::Name.is_in(names.iter().map(String::as_str)))
        .all(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to look up tags: {}", e)))?
        .into_iter()
        .map(|t| (t.name.clone(), t))
        .collect();

    let mut resolved = Vec::with_capacity(names.len());
    for name in names {
        if let Some(found) = existing.remove(name) {
            resolved.push(found);
            continue;
        }

        let model = tag::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.clone()),
            created_at: Set(Utc::now()),
        };
        // Unique violations become Conflict via From<DbErr>
        let created = model.insert(db).await?;
        info!("Created tag '{}'", created.name);
        resolved.push(created);
    }

    Ok(resolved)
}

/// Replace an issue's tag set: clear every association, then attach `names`.
pub async fn replace_issue_tags<C: ConnectionTrait>(
    db: &C,
    issue_id: Uuid,
    names: &[String],
) -> AppResult<()> {
    issue_tag::Entity::delete_many()
        .filter(issue_tag::Column::IssueId.eq(issue_id))
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to clear issue tags: {}", e)))?;

    let tags = resolve_tags(db, names).await?;
    if tags.is_empty() {
        return Ok(());
    }

    let rows = tags.iter().map(|t| issue_tag::ActiveModel {
        issue_id: Set(issue_id),
        tag_id: Set(t.id),
    });
    issue_tag::Entity::insert_many(rows)
        .exec_without_returning(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to attach tags: {}", e)))?;

    Ok(())
}

/// Tag names per issue, sorted by name.
pub async fn tag_names_by_issue<C: ConnectionTrait>(
    db: &C,
    issue_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<String>>> {
    if issue_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let pairs = issue_tag::Entity::find()
        .filter(issue_tag::Column::IssueId.is_in(issue_ids.iter().copied()))
        .find_also_related(tag::Entity)
        .all(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load issue tags: {}", e)))?;

    let mut by_issue: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (link, tag) in pairs {
        if let Some(tag) = tag {
            by_issue.entry(link.issue_id).or_default().push(tag.name);
        }
    }
    for names in by_issue.values_mut() {
        names.sort();
    }
    Ok(by_issue)
}

impl DbPool {
    /// Every tag, ordered by name.
    pub async fn list_tags(&self) -> AppResult<Vec<TagResponse>> {
        let tags = tag::Entity::find()
            .order_by_asc(tag::Column::Name)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list tags: {}", e)))?;

        Ok(tags.into_iter().map(TagResponse::from).collect())
    }
}
