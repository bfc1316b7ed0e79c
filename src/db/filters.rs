//! Predicate composition over the issues table.
//!
//! Structured filters are exact matches combined with AND. Free text is a
//! case-insensitive substring match on title, description or test case id,
//! combined with OR across those columns and AND with the filters.

use sea_orm::sea_query::{Expr, ExprTrait, Func, LikeExpr};
use sea_orm::{ColumnTrait, Condition};
use tracing::debug;

use crate::entity::issue::{self, Column};
use crate::models::IssueFilter;

/// AND of every structured filter that is set.
pub fn filter_condition(filter: &IssueFilter) -> Condition {
    let exact = [
        (Column::Status, &filter.status),
        (Column::Severity, &filter.severity),
        (Column::Release, &filter.release),
        (Column::Platform, &filter.platform),
        (Column::Build, &filter.build),
        (Column::Target, &filter.target),
        (Column::TestCaseIds, &filter.test_case_ids),
        (Column::ReporterName, &filter.reporter_name),
    ];

    let mut cond = Condition::all();
    for (column, value) in exact {
        if let Some(value) = value {
            cond = cond.add(column.eq(value.as_str()));
        }
    }

    if !filter.tags.is_empty() {
        debug!(tags = ?filter.tags, "tag filter accepted but not applied");
    }

    cond
}

/// OR of case-insensitive substring matches on the searchable text columns.
pub fn text_condition(text: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(&text.to_lowercase()));

    [Column::TestcaseTitle, Column::Description, Column::TestCaseIds]
        .into_iter()
        .fold(Condition::any(), |cond, column| {
            cond.add(
                Expr::expr(Func::lower(Expr::col((issue::Entity, column))))
                    .like(LikeExpr::new(pattern.clone()).escape('\\')),
            )
        })
}

/// Full search predicate: structured filters AND optional free text.
pub fn search_condition(filter: &IssueFilter, text: Option<&str>) -> Condition {
    let cond = filter_condition(filter);
    match text {
        Some(text) => cond.add(text_condition(text)),
        None => cond,
    }
}

/// Escape LIKE metacharacters so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
